use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Grid access outside 0..16 on either axis.
    InvalidIndex { instrument: usize, step: usize },
    /// Bulk grid load with the wrong number of cells.
    LengthMismatch { expected: usize, found: usize },
    /// Persisted pattern is missing, truncated or malformed.
    CorruptArtifact { path: PathBuf, reason: String },
    /// The sound backend refused an event or a command.
    BackendRejected(String),
    Io(io::Error),
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidIndex { instrument, step } => {
                write!(f, "invalid grid index (instrument {}, step {})", instrument, step)
            }
            Error::LengthMismatch { expected, found } => {
                write!(f, "expected {} cells, got {}", expected, found)
            }
            Error::CorruptArtifact { path, reason } => {
                write!(f, "corrupt pattern file {}: {}", path.display(), reason)
            }
            Error::BackendRejected(msg) => write!(f, "backend rejected: {}", msg),
            Error::Io(e) => write!(f, "i/o error: {}", e),
            Error::Config(msg) => write!(f, "config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
