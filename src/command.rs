/// Command dispatch - the single entry point the UI talks to
use crate::backend::SoundBackend;
use crate::config::Config;
use crate::error::Result;
use crate::persist::PatternFile;
use crate::sequencer::transport::{StartReport, Transport};
use crate::sequencer::StepGrid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Toggle { instrument: usize, step: usize },
    Start,
    Stop,
    TempoUp,
    TempoDown,
    Save,
    Restore,
}

/// What a successful command changed, for the UI to reflect.
#[derive(Debug)]
pub enum Outcome {
    GridChanged,
    Started(StartReport),
    Stopped,
    Tempo(f32),
    Saved,
    /// Grid replaced from disk and playback restarted.
    Restored(StartReport),
}

pub struct BeatBox<B: SoundBackend> {
    grid: StepGrid,
    transport: Transport<B>,
    pattern: PatternFile,
    tempo_up: f32,
    tempo_down: f32,
}

impl<B: SoundBackend> BeatBox<B> {
    pub fn new(transport: Transport<B>, pattern: PatternFile) -> Self {
        let defaults = Config::default();
        Self {
            grid: StepGrid::new(),
            transport,
            pattern,
            tempo_up: defaults.tempo_up,
            tempo_down: defaults.tempo_down,
        }
    }

    /// Opens `backend` and wires everything from `config`.
    pub fn from_config(backend: B, config: &Config) -> Result<Self> {
        let transport = Transport::new(backend)?;
        let mut beatbox = Self::new(transport, PatternFile::new(&config.pattern_path));
        beatbox.tempo_up = config.tempo_up;
        beatbox.tempo_down = config.tempo_down;
        Ok(beatbox)
    }

    pub fn grid(&self) -> &StepGrid {
        &self.grid
    }

    pub fn transport(&self) -> &Transport<B> {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport<B> {
        &mut self.transport
    }

    pub fn pattern(&self) -> &PatternFile {
        &self.pattern
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::Toggle { instrument, step } => {
                self.grid.toggle(instrument, step)?;
                Ok(Outcome::GridChanged)
            }
            Command::Start => Ok(Outcome::Started(self.transport.start(&self.grid)?)),
            Command::Stop => {
                self.transport.stop();
                Ok(Outcome::Stopped)
            }
            Command::TempoUp => {
                self.transport.adjust_tempo(self.tempo_up);
                Ok(Outcome::Tempo(self.transport.tempo_bpm()))
            }
            Command::TempoDown => {
                self.transport.adjust_tempo(self.tempo_down);
                Ok(Outcome::Tempo(self.transport.tempo_bpm()))
            }
            Command::Save => {
                self.pattern.save(&self.grid)?;
                Ok(Outcome::Saved)
            }
            Command::Restore => self.restore(),
        }
    }

    fn restore(&mut self) -> Result<Outcome> {
        let flat = self.pattern.load()?;
        self.grid.set_all(&flat)?;
        self.transport.stop();
        Ok(Outcome::Restored(self.transport.start(&self.grid)?))
    }
}
