/// BeatBox - a 16-step, 16-voice drum pattern sequencer
///
/// This library provides the sequencer core:
/// - A fixed 16x16 step grid over a General MIDI drum kit
/// - A track builder compiling the grid into a looped MIDI event stream
/// - A transport driving any `SoundBackend`, with a MIDI backend included
/// - Pattern persistence as a flat 256-byte file

pub mod backend;
pub mod command;
pub mod config;
pub mod error;
pub mod midi;
pub mod persist;
pub mod sequencer;

// Re-export commonly used types
pub use backend::SoundBackend;
pub use command::{BeatBox, Command, Outcome};
pub use config::Config;
pub use error::{Error, Result};
pub use midi::{MidiOutputDevice, MidiSequencer, PortSelection};
pub use persist::PatternFile;
pub use sequencer::playback::PlaybackEvent;
pub use sequencer::track::{CompiledTrack, TimedEvent, TrackBuilder};
pub use sequencer::transport::{StartReport, Transport, TransportState};
pub use sequencer::{Instrument, StepGrid, INSTRUMENTS};
