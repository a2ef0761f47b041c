/// Track builder - compiles the step grid into a loop of timed MIDI events
use super::{Instrument, StepGrid, INSTRUMENTS, INSTRUMENT_COUNT};
use crate::error::{Error, Result};

/// Pulses per quarter note; one tick is a sixteenth note.
pub const PPQ: u32 = 4;
/// Ticks in one loop iteration (four beats).
pub const LOOP_TICKS: u32 = 16;

pub const NOTE_ON: u8 = 0x90;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const PROGRAM_CHANGE: u8 = 0xC0;

pub const PERCUSSION_CHANNEL: u8 = 9;
pub const FLUSH_CHANNEL: u8 = 1;
pub const VELOCITY: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub command: u8,
    pub channel: u8,
    pub data1: u8,
    pub data2: u8,
    pub tick: u32,
}

impl TimedEvent {
    /// Builds a channel-voice event, rejecting anything that would not be a
    /// valid MIDI short message.
    pub fn new(command: u8, channel: u8, data1: u8, data2: u8, tick: u32) -> Result<Self> {
        if !(0x80..0xF0).contains(&command) || command & 0x0F != 0 {
            return Err(Error::BackendRejected(format!(
                "invalid command byte {:#04x}",
                command
            )));
        }
        if channel > 15 {
            return Err(Error::BackendRejected(format!("invalid channel {}", channel)));
        }
        if data1 > 127 || data2 > 127 {
            return Err(Error::BackendRejected(format!(
                "data out of range ({}, {}) for command {:#04x}",
                data1, data2, command
            )));
        }
        Ok(Self {
            command,
            channel,
            data1,
            data2,
            tick,
        })
    }

    pub fn note_on(key: u8, tick: u32) -> Result<Self> {
        Self::new(NOTE_ON, PERCUSSION_CHANNEL, key, VELOCITY, tick)
    }

    pub fn is_note_on(&self) -> bool {
        self.command == NOTE_ON
    }

    pub fn status(&self) -> u8 {
        self.command | self.channel
    }

    /// Wire bytes for this event. Program change carries a single data byte.
    pub fn bytes(&self) -> Vec<u8> {
        match self.command {
            PROGRAM_CHANGE | 0xD0 => vec![self.status(), self.data1],
            _ => vec![self.status(), self.data1, self.data2],
        }
    }
}

/// One full loop of events, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledTrack {
    events: Vec<TimedEvent>,
}

impl CompiledTrack {
    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn note_ons(&self) -> impl Iterator<Item = &TimedEvent> {
        self.events.iter().filter(|e| e.is_note_on())
    }

    /// Events scheduled exactly at `tick`, in emission order.
    pub fn at_tick(&self, tick: u32) -> impl Iterator<Item = &TimedEvent> {
        self.events.iter().filter(move |e| e.tick == tick)
    }

    /// Events scheduled at or past the loop end.
    pub fn tail(&self) -> impl Iterator<Item = &TimedEvent> {
        self.events.iter().filter(|e| e.tick >= LOOP_TICKS)
    }
}

/// Result of a compile: the track plus every event that was rejected.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub track: CompiledTrack,
    pub rejected: Vec<Error>,
}

pub struct TrackBuilder {
    kit: [Instrument; INSTRUMENT_COUNT],
}

impl TrackBuilder {
    pub fn new() -> Self {
        Self::with_kit(INSTRUMENTS)
    }

    pub fn with_kit(kit: [Instrument; INSTRUMENT_COUNT]) -> Self {
        Self { kit }
    }

    pub fn kit(&self) -> &[Instrument; INSTRUMENT_COUNT] {
        &self.kit
    }

    /// Compiles `grid` into a fresh track.
    ///
    /// Per instrument: its note-ons in step order, then a control-change flush
    /// marker at tick 16. A single program select at tick 15 closes the track.
    /// No note-offs are emitted; percussion voices decay on their own.
    pub fn build(&self, grid: &StepGrid) -> BuildReport {
        let mut report = BuildReport::default();
        let mut push = |event: Result<TimedEvent>| match event {
            Ok(event) => report.track.events.push(event),
            Err(e) => report.rejected.push(e),
        };

        for (instrument, voice) in self.kit.iter().enumerate() {
            if let Ok(steps) = grid.active_steps(instrument) {
                for step in steps {
                    push(TimedEvent::note_on(voice.key, step as u32));
                }
            }
            push(TimedEvent::new(CONTROL_CHANGE, FLUSH_CHANNEL, 127, 0, LOOP_TICKS));
        }
        push(TimedEvent::new(
            PROGRAM_CHANGE,
            PERCUSSION_CHANNEL,
            1,
            0,
            LOOP_TICKS - 1,
        ));

        report
    }
}

impl Default for TrackBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flushes(track: &CompiledTrack) -> usize {
        track
            .events()
            .iter()
            .filter(|e| e.command == CONTROL_CHANGE)
            .count()
    }

    #[test]
    fn test_startup_grid_compiles_single_note() {
        let report = TrackBuilder::new().build(&StepGrid::new());
        assert!(report.rejected.is_empty());

        let notes: Vec<_> = report.track.note_ons().collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].tick, 0);
        assert_eq!(notes[0].data1, INSTRUMENTS[1].key);
        assert_eq!(notes[0].data2, 100);
        assert_eq!(notes[0].channel, PERCUSSION_CHANNEL);

        assert_eq!(flushes(&report.track), 16);
        assert_eq!(report.track.len(), 1 + 16 + 1);
    }

    #[test]
    fn test_event_order() {
        let mut grid = StepGrid::empty();
        grid.toggle(0, 12).unwrap();
        grid.toggle(0, 3).unwrap();
        grid.toggle(5, 0).unwrap();

        let track = TrackBuilder::new().build(&grid).track;
        let events = track.events();

        // instrument 0: two notes then its flush
        assert_eq!(events[0], TimedEvent::note_on(35, 3).unwrap());
        assert_eq!(events[1], TimedEvent::note_on(35, 12).unwrap());
        assert_eq!(events[2].command, CONTROL_CHANGE);
        assert_eq!((events[2].channel, events[2].data1, events[2].tick), (1, 127, 16));

        // instruments 1..4 contribute only flushes
        for e in &events[3..7] {
            assert_eq!(e.command, CONTROL_CHANGE);
        }
        assert_eq!(events[7], TimedEvent::note_on(39, 0).unwrap());

        let last = events.last().unwrap();
        assert_eq!(
            *last,
            TimedEvent::new(PROGRAM_CHANGE, PERCUSSION_CHANNEL, 1, 0, 15).unwrap()
        );
    }

    #[test]
    fn test_empty_grid_still_has_markers() {
        let track = TrackBuilder::new().build(&StepGrid::empty()).track;
        assert_eq!(track.note_ons().count(), 0);
        assert_eq!(track.len(), 17);
        assert_eq!(track.tail().count(), 16);
        assert_eq!(track.at_tick(15).count(), 1);
    }

    #[test]
    fn test_bad_key_does_not_abort_build() {
        let mut kit = INSTRUMENTS;
        kit[1].key = 200;
        let mut grid = StepGrid::new();
        grid.toggle(2, 4).unwrap();

        let report = TrackBuilder::with_kit(kit).build(&grid);
        assert_eq!(report.rejected.len(), 1);
        assert!(matches!(report.rejected[0], Error::BackendRejected(_)));

        let notes: Vec<_> = report.track.note_ons().collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].data1, INSTRUMENTS[2].key);
        assert_eq!(flushes(&report.track), 16);
    }

    #[test]
    fn test_event_validation() {
        assert!(TimedEvent::new(0x90, 16, 1, 1, 0).is_err());
        assert!(TimedEvent::new(0x91, 0, 1, 1, 0).is_err());
        assert!(TimedEvent::new(0xF0, 0, 1, 1, 0).is_err());
        assert!(TimedEvent::new(0x90, 9, 128, 1, 0).is_err());
        assert!(TimedEvent::new(0xB0, 1, 127, 0, 16).is_ok());
    }

    #[test]
    fn test_wire_bytes() {
        let note = TimedEvent::note_on(42, 0).unwrap();
        assert_eq!(note.bytes(), vec![0x99, 42, 100]);
        let program = TimedEvent::new(PROGRAM_CHANGE, 9, 1, 0, 15).unwrap();
        assert_eq!(program.bytes(), vec![0xC9, 1]);
    }
}
