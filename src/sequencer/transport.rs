/// Transport - start/stop/tempo over a sound backend
use super::track::TrackBuilder;
use super::StepGrid;
use crate::backend::SoundBackend;
use crate::error::{Error, Result};

pub const BASE_BPM: f32 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
}

/// Outcome of a successful start.
#[derive(Debug, Default)]
pub struct StartReport {
    pub events: usize,
    pub rejected: Vec<Error>,
}

pub struct Transport<B: SoundBackend> {
    backend: B,
    builder: TrackBuilder,
    state: TransportState,
    bpm: f32,
    scale: f32,
}

impl<B: SoundBackend> Transport<B> {
    /// Opens the backend and sets the base tempo.
    pub fn new(backend: B) -> Result<Self> {
        Self::with_builder(backend, TrackBuilder::new())
    }

    pub fn with_builder(mut backend: B, builder: TrackBuilder) -> Result<Self> {
        backend.open()?;
        backend.set_tempo_bpm(BASE_BPM);
        backend.set_tempo_scale(1.0);
        Ok(Self {
            backend,
            builder,
            state: TransportState::Stopped,
            bpm: BASE_BPM,
            scale: 1.0,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TransportState::Running
    }

    /// Effective tempo in BPM.
    pub fn tempo_bpm(&self) -> f32 {
        self.bpm * self.scale
    }

    pub fn tempo_scale(&self) -> f32 {
        self.scale
    }

    /// Recompiles `grid` and (re)starts looped playback from the top.
    ///
    /// Calling this while running replaces the playing track. On a backend
    /// failure the state is left as it was.
    pub fn start(&mut self, grid: &StepGrid) -> Result<StartReport> {
        let report = self.builder.build(grid);
        let events = report.track.len();

        self.backend.load_track(report.track)?;
        self.backend.set_loop_continuous();
        self.backend.start()?;
        self.state = TransportState::Running;

        Ok(StartReport {
            events,
            rejected: report.rejected,
        })
    }

    pub fn stop(&mut self) {
        if self.state == TransportState::Stopped {
            return;
        }
        self.backend.stop();
        self.state = TransportState::Stopped;
    }

    /// Multiplies the current scale by `factor`. Unbounded, so repeated
    /// up/down presses compound rather than cancel out exactly.
    pub fn adjust_tempo(&mut self, factor: f32) {
        let scale = self.backend.tempo_scale() * factor;
        self.backend.set_tempo_scale(scale);
        self.scale = scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::track::CompiledTrack;

    #[derive(Default)]
    struct FakeBackend {
        bpm: f32,
        scale: f32,
        track: Option<CompiledTrack>,
        loads: usize,
        starts: usize,
        looping: bool,
        running: bool,
        refuse_start: bool,
    }

    impl SoundBackend for FakeBackend {
        fn open(&mut self) -> Result<()> {
            Ok(())
        }
        fn set_tempo_bpm(&mut self, bpm: f32) {
            self.bpm = bpm;
        }
        fn tempo_bpm(&self) -> f32 {
            self.bpm
        }
        fn set_tempo_scale(&mut self, scale: f32) {
            self.scale = scale;
        }
        fn tempo_scale(&self) -> f32 {
            self.scale
        }
        fn load_track(&mut self, track: CompiledTrack) -> Result<()> {
            self.track = Some(track);
            self.loads += 1;
            Ok(())
        }
        fn set_loop_continuous(&mut self) {
            self.looping = true;
        }
        fn start(&mut self) -> Result<()> {
            if self.refuse_start {
                return Err(Error::BackendRejected("busy".into()));
            }
            self.starts += 1;
            self.running = true;
            Ok(())
        }
        fn stop(&mut self) {
            self.running = false;
        }
        fn is_running(&self) -> bool {
            self.running
        }
    }

    fn transport() -> Transport<FakeBackend> {
        Transport::new(FakeBackend::default()).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let t = transport();
        assert_eq!(t.state(), TransportState::Stopped);
        assert_eq!(t.tempo_bpm(), 120.0);
        assert_eq!(t.backend().tempo_bpm(), 120.0);
        assert_eq!(t.backend().tempo_scale(), 1.0);
    }

    #[test]
    fn test_start_loads_looping_track() {
        let mut t = transport();
        let report = t.start(&StepGrid::new()).unwrap();
        assert_eq!(report.events, 18);
        assert!(report.rejected.is_empty());
        assert!(t.is_running());
        assert!(t.backend().looping);
        assert_eq!(t.backend().track.as_ref().unwrap().note_ons().count(), 1);
    }

    #[test]
    fn test_restart_replaces_track() {
        let mut t = transport();
        let mut grid = StepGrid::new();
        t.start(&grid).unwrap();
        grid.toggle(0, 8).unwrap();
        t.start(&grid).unwrap();

        assert_eq!(t.state(), TransportState::Running);
        assert_eq!(t.backend().loads, 2);
        assert_eq!(t.backend().starts, 2);
        let track = t.backend().track.as_ref().unwrap();
        assert_eq!(track.note_ons().count(), 2);
        assert_eq!(track.len(), 19);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut t = transport();
        t.stop();
        assert_eq!(t.state(), TransportState::Stopped);
        t.start(&StepGrid::new()).unwrap();
        t.stop();
        t.stop();
        assert_eq!(t.state(), TransportState::Stopped);
        assert!(!t.backend().running);
    }

    #[test]
    fn test_failed_start_keeps_prior_state() {
        let mut t = transport();
        t.backend_mut().refuse_start = true;
        assert!(matches!(t.start(&StepGrid::new()), Err(Error::BackendRejected(_))));
        assert_eq!(t.state(), TransportState::Stopped);
    }

    #[test]
    fn test_tempo_adjustment() {
        let mut t = transport();
        t.adjust_tempo(1.03);
        assert!((t.tempo_bpm() - 123.6).abs() < 1e-3);

        let mut t = transport();
        t.adjust_tempo(0.97);
        assert!((t.tempo_bpm() - 116.4).abs() < 1e-3);
    }

    #[test]
    fn test_tempo_compounds_on_scale() {
        let mut t = transport();
        t.start(&StepGrid::new()).unwrap();
        t.adjust_tempo(1.03);
        t.adjust_tempo(0.97);
        // 1.03 * 0.97 != 1
        assert!((t.tempo_scale() - 0.9991).abs() < 1e-4);
        assert_eq!(t.backend().tempo_scale(), t.tempo_scale());
        assert!(t.is_running());
    }
}
