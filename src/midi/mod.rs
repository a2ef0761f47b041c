/// MIDI output using midir
use std::sync::{Arc, Mutex};

use midir::{MidiOutput, MidiOutputConnection};

use crate::backend::SoundBackend;
use crate::error::{Error, Result};
use crate::sequencer::playback::{MessageSink, PlaybackEngine, PlaybackEvent};
use crate::sequencer::track::CompiledTrack;

const CLIENT_NAME: &str = "BeatBox MIDI Output";

pub struct MidiOutputDevice {
    connection: Option<MidiOutputConnection>,
    port_name: Option<String>,
}

impl MidiOutputDevice {
    pub fn new() -> Self {
        Self {
            connection: None,
            port_name: None,
        }
    }

    pub fn available_ports() -> Vec<String> {
        if let Ok(midi_out) = MidiOutput::new(CLIENT_NAME) {
            midi_out
                .ports()
                .iter()
                .filter_map(|p| midi_out.port_name(p).ok())
                .collect()
        } else {
            vec![]
        }
    }

    /// Connects to the named port, or the first port when `name` is `None`.
    pub fn connect(&mut self, name: Option<&str>) -> Result<()> {
        let midi_out = MidiOutput::new(CLIENT_NAME)
            .map_err(|e| Error::BackendRejected(format!("failed to create MIDI output: {}", e)))?;

        let ports = midi_out.ports();
        let port = match name {
            Some(name) => ports
                .iter()
                .find(|p| midi_out.port_name(p).map_or(false, |n| n == name))
                .ok_or_else(|| Error::BackendRejected(format!("no MIDI port named {:?}", name)))?,
            None => ports
                .first()
                .ok_or_else(|| Error::BackendRejected("no MIDI output ports available".into()))?,
        };
        let port_name = midi_out.port_name(port).ok();

        let connection = midi_out
            .connect(port, "beatbox")
            .map_err(|e| Error::BackendRejected(format!("failed to connect: {}", e)))?;

        self.connection = Some(connection);
        self.port_name = port_name;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }
}

impl MessageSink for MidiOutputDevice {
    /// Unconnected devices swallow messages so playback can run silently.
    fn send(&mut self, message: &[u8]) -> Result<()> {
        if let Some(ref mut conn) = self.connection {
            conn.send(message)
                .map_err(|e| Error::BackendRejected(format!("failed to send {:02x?}: {}", message, e)))?;
        }
        Ok(())
    }
}

impl Default for MidiOutputDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSelection {
    /// Play without any output port.
    Silent,
    First,
    Named(String),
}

/// `SoundBackend` that plays compiled tracks out of a MIDI port.
pub struct MidiSequencer {
    output: Arc<Mutex<MidiOutputDevice>>,
    engine: PlaybackEngine<MidiOutputDevice>,
    selection: PortSelection,
}

impl MidiSequencer {
    pub fn new(selection: PortSelection) -> Self {
        let output = Arc::new(Mutex::new(MidiOutputDevice::new()));
        Self {
            engine: PlaybackEngine::new(Arc::clone(&output)),
            output,
            selection,
        }
    }

    pub fn silent() -> Self {
        Self::new(PortSelection::Silent)
    }

    pub fn port_name(&self) -> Option<String> {
        self.output
            .lock()
            .ok()
            .and_then(|out| out.port_name().map(str::to_owned))
    }

    pub fn is_connected(&self) -> bool {
        self.output.lock().map_or(false, |out| out.is_connected())
    }

    pub fn poll_events(&self) -> Vec<PlaybackEvent> {
        self.engine.poll_events()
    }
}

impl SoundBackend for MidiSequencer {
    fn open(&mut self) -> Result<()> {
        let name = match &self.selection {
            PortSelection::Silent => return Ok(()),
            PortSelection::First => None,
            PortSelection::Named(name) => Some(name.as_str()),
        };
        let mut output = self
            .output
            .lock()
            .map_err(|_| Error::BackendRejected("MIDI output lock poisoned".into()))?;
        output.connect(name)
    }

    fn set_tempo_bpm(&mut self, bpm: f32) {
        self.engine.set_bpm(bpm);
    }

    fn tempo_bpm(&self) -> f32 {
        self.engine.bpm()
    }

    fn set_tempo_scale(&mut self, scale: f32) {
        self.engine.set_scale(scale);
    }

    fn tempo_scale(&self) -> f32 {
        self.engine.scale()
    }

    fn load_track(&mut self, track: CompiledTrack) -> Result<()> {
        self.engine.load(track);
        Ok(())
    }

    fn set_loop_continuous(&mut self) {
        self.engine.set_looping(true);
    }

    fn start(&mut self) -> Result<()> {
        self.engine.start();
        Ok(())
    }

    fn stop(&mut self) {
        self.engine.stop();
    }

    fn is_running(&self) -> bool {
        self.engine.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconnected_device_swallows_messages() {
        let mut device = MidiOutputDevice::new();
        assert!(!device.is_connected());
        assert!(device.send(&[0x99, 35, 100]).is_ok());
    }

    #[test]
    fn test_silent_sequencer_opens_without_ports() {
        let mut seq = MidiSequencer::silent();
        assert!(seq.open().is_ok());
        assert!(!seq.is_connected());
        assert_eq!(seq.port_name(), None);
    }

    #[test]
    fn test_missing_named_port_is_rejected() {
        let mut seq = MidiSequencer::new(PortSelection::Named("no such port 0xdeadbeef".into()));
        assert!(matches!(seq.open(), Err(Error::BackendRejected(_))));
    }

    #[test]
    fn test_tempo_round_trip() {
        let mut seq = MidiSequencer::silent();
        seq.set_tempo_bpm(120.0);
        seq.set_tempo_scale(1.03);
        assert_eq!(seq.tempo_bpm(), 120.0);
        assert_eq!(seq.tempo_scale(), 1.03);
    }
}
