/// Pattern persistence: 256 bytes, one per cell, instrument-major
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sequencer::{StepGrid, CELL_COUNT};

pub const DEFAULT_PATTERN_PATH: &str = "checkbox.ser";

const OFF: u8 = 0x00;
const ON: u8 = 0x01;

pub fn encode(flat: &[bool]) -> Vec<u8> {
    flat.iter().map(|on| if *on { ON } else { OFF }).collect()
}

/// Decodes exactly 256 cells. Errors carry only the reason; `PatternFile`
/// attaches the path.
pub fn decode(bytes: &[u8]) -> std::result::Result<Vec<bool>, String> {
    if bytes.len() != CELL_COUNT {
        return Err(format!("expected {} cells, found {}", CELL_COUNT, bytes.len()));
    }
    bytes
        .iter()
        .enumerate()
        .map(|(i, b)| match *b {
            OFF => Ok(false),
            ON => Ok(true),
            other => Err(format!("invalid cell value {:#04x} at offset {}", other, i)),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PatternFile {
    path: PathBuf,
}

impl PatternFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the grid, replacing any existing file. The bytes go to a
    /// sibling temp file first and are renamed into place.
    pub fn save(&self, grid: &StepGrid) -> Result<()> {
        let bytes = encode(&grid.to_flat());
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, &bytes)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn load(&self) -> Result<Vec<bool>> {
        let bytes = fs::read(&self.path).map_err(|e| self.corrupt(match e.kind() {
            ErrorKind::NotFound => "file not found".to_string(),
            _ => e.to_string(),
        }))?;
        decode(&bytes).map_err(|reason| self.corrupt(reason))
    }

    fn corrupt(&self, reason: String) -> Error {
        Error::CorruptArtifact {
            path: self.path.clone(),
            reason,
        }
    }
}

impl Default for PatternFile {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN_PATH)
    }
}
