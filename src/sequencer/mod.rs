/// Core sequencer logic - the 16x16 step grid and the fixed drum kit
use crate::error::{Error, Result};

pub mod playback;
pub mod track;
pub mod transport;

pub const INSTRUMENT_COUNT: usize = 16;
pub const STEP_COUNT: usize = 16;
pub const CELL_COUNT: usize = INSTRUMENT_COUNT * STEP_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    pub name: &'static str,
    pub key: u8,
}

/// General MIDI percussion voices, in grid row order.
///
/// Compiled tracks and persisted patterns both index this table by position,
/// so the order is part of the file format.
pub const INSTRUMENTS: [Instrument; INSTRUMENT_COUNT] = [
    Instrument { name: "Bass Drum", key: 35 },
    Instrument { name: "Closed Hi-Hat", key: 42 },
    Instrument { name: "Open Hi-Hat", key: 46 },
    Instrument { name: "Acoustic Snare", key: 38 },
    Instrument { name: "Crash Cymbal", key: 49 },
    Instrument { name: "Hand Clap", key: 39 },
    Instrument { name: "High Tom", key: 50 },
    Instrument { name: "Hi Bongo", key: 60 },
    Instrument { name: "Maracas", key: 70 },
    Instrument { name: "Whistle", key: 72 },
    Instrument { name: "Low Conga", key: 64 },
    Instrument { name: "Cowbell", key: 56 },
    Instrument { name: "Vibraslap", key: 58 },
    Instrument { name: "Low-mid Tom", key: 47 },
    Instrument { name: "High Agogo", key: 67 },
    Instrument { name: "Open Hi Conga", key: 63 },
];

/// Instrument x step on/off matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepGrid {
    cells: [[bool; STEP_COUNT]; INSTRUMENT_COUNT],
}

impl StepGrid {
    /// An empty grid with every cell off.
    pub fn empty() -> Self {
        Self {
            cells: [[false; STEP_COUNT]; INSTRUMENT_COUNT],
        }
    }

    /// The startup pattern: a single closed hi-hat on the downbeat.
    pub fn new() -> Self {
        let mut grid = Self::empty();
        grid.cells[1][0] = true;
        grid
    }

    fn check(instrument: usize, step: usize) -> Result<()> {
        if instrument >= INSTRUMENT_COUNT || step >= STEP_COUNT {
            return Err(Error::InvalidIndex { instrument, step });
        }
        Ok(())
    }

    pub fn toggle(&mut self, instrument: usize, step: usize) -> Result<()> {
        Self::check(instrument, step)?;
        let cell = &mut self.cells[instrument][step];
        *cell = !*cell;
        Ok(())
    }

    pub fn is_active(&self, instrument: usize, step: usize) -> Result<bool> {
        Self::check(instrument, step)?;
        Ok(self.cells[instrument][step])
    }

    /// Replaces every cell from an instrument-major flat sequence.
    ///
    /// The grid is left untouched when the length is wrong.
    pub fn set_all(&mut self, flat: &[bool]) -> Result<()> {
        if flat.len() != CELL_COUNT {
            return Err(Error::LengthMismatch {
                expected: CELL_COUNT,
                found: flat.len(),
            });
        }
        for (row, chunk) in self.cells.iter_mut().zip(flat.chunks_exact(STEP_COUNT)) {
            row.copy_from_slice(chunk);
        }
        Ok(())
    }

    /// Flattens the grid; cell (i, j) lands at index i * 16 + j.
    pub fn to_flat(&self) -> Vec<bool> {
        self.cells.iter().flatten().copied().collect()
    }

    /// Active steps of one instrument row, ascending.
    pub fn active_steps(&self, instrument: usize) -> Result<impl Iterator<Item = usize> + '_> {
        Self::check(instrument, 0)?;
        Ok(self.cells[instrument]
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(step, _)| step))
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().flatten().filter(|on| **on).count()
    }

    pub fn clear(&mut self) {
        for row in &mut self.cells {
            for cell in row {
                *cell = false;
            }
        }
    }
}

impl Default for StepGrid {
    fn default() -> Self {
        Self::new()
    }
}
