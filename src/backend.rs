/// Sound backend contract
///
/// The transport drives playback only through this trait. The backend owns
/// its own playback clock once started.
use crate::error::Result;
use crate::sequencer::track::CompiledTrack;

pub trait SoundBackend {
    fn open(&mut self) -> Result<()>;

    fn set_tempo_bpm(&mut self, bpm: f32);

    fn tempo_bpm(&self) -> f32;

    /// Multiplier applied on top of the base tempo.
    fn set_tempo_scale(&mut self, scale: f32);

    fn tempo_scale(&self) -> f32;

    /// Replaces the loaded track in one step.
    fn load_track(&mut self, track: CompiledTrack) -> Result<()>;

    fn set_loop_continuous(&mut self);

    /// Starts playback from tick 0 of the loaded track.
    fn start(&mut self) -> Result<()>;

    fn stop(&mut self);

    fn is_running(&self) -> bool;
}
