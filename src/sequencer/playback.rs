/// Playback engine - walks a compiled track on its own clock thread
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use super::track::{CompiledTrack, LOOP_TICKS, PPQ};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    StepAdvanced(usize),
    SendFailed(String),
}

/// Destination for raw MIDI messages.
pub trait MessageSink: Send {
    fn send(&mut self, message: &[u8]) -> Result<()>;
}

struct Clock {
    track: CompiledTrack,
    bpm: f32,
    scale: f32,
    looping: bool,
    generation: u64,
    running: bool,
}

impl Clock {
    /// Zero, negative or NaN tempos park the clock on `Duration::MAX`.
    fn tick_duration(&self) -> Duration {
        let secs = 60.0 / (self.bpm * self.scale) / PPQ as f32;
        Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }
}

fn lock(clock: &Mutex<Clock>) -> MutexGuard<'_, Clock> {
    clock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct PlaybackEngine<S: MessageSink + 'static> {
    sender: Sender<PlaybackEvent>,
    receiver: Receiver<PlaybackEvent>,
    clock: Arc<Mutex<Clock>>,
    sink: Arc<Mutex<S>>,
}

impl<S: MessageSink + 'static> PlaybackEngine<S> {
    pub fn new(sink: Arc<Mutex<S>>) -> Self {
        let (sender, receiver) = channel();

        Self {
            sender,
            receiver,
            clock: Arc::new(Mutex::new(Clock {
                track: CompiledTrack::default(),
                bpm: 120.0,
                scale: 1.0,
                looping: false,
                generation: 0,
                running: false,
            })),
            sink,
        }
    }

    pub fn load(&self, track: CompiledTrack) {
        lock(&self.clock).track = track;
    }

    pub fn set_bpm(&self, bpm: f32) {
        lock(&self.clock).bpm = bpm;
    }

    pub fn bpm(&self) -> f32 {
        lock(&self.clock).bpm
    }

    pub fn set_scale(&self, scale: f32) {
        lock(&self.clock).scale = scale;
    }

    pub fn scale(&self) -> f32 {
        lock(&self.clock).scale
    }

    pub fn set_looping(&self, looping: bool) {
        lock(&self.clock).looping = looping;
    }

    /// Starts a fresh clock thread at tick 0. Any thread from an earlier
    /// start exits at its next tick without sending.
    pub fn start(&mut self) {
        let generation = {
            let mut clock = lock(&self.clock);
            clock.generation += 1;
            clock.running = true;
            clock.generation
        };

        let clock = Arc::clone(&self.clock);
        let sink = Arc::clone(&self.sink);
        let sender = self.sender.clone();

        thread::spawn(move || {
            let mut tick: u32 = 0;
            // scheduled time of the previous tick; the first tick fires at once
            let mut last_tick: Option<Instant> = None;

            loop {
                let now = Instant::now();

                let fired = {
                    let state = lock(&clock);
                    if !state.is_current(generation) {
                        break;
                    }

                    let duration = state.tick_duration();
                    let due = match last_tick {
                        None => Some(now),
                        Some(last) => last.checked_add(duration),
                    };
                    match due {
                        Some(due) if now >= due => {
                            let mut messages: Vec<Vec<u8>> =
                                state.track.at_tick(tick).map(|e| e.bytes()).collect();
                            let pass_end = tick == LOOP_TICKS - 1;
                            if pass_end {
                                // markers past the loop end close out the pass
                                messages.extend(state.track.tail().map(|e| e.bytes()));
                            }
                            Some((messages, due, duration, pass_end && !state.looping))
                        }
                        _ => None,
                    }
                };

                if let Some((messages, due, duration, last_pass)) = fired {
                    {
                        let mut sink = sink.lock().unwrap_or_else(|p| p.into_inner());
                        // a restart may have landed since the clock lock was released
                        if !lock(&clock).is_current(generation) {
                            break;
                        }
                        let _ = sender.send(PlaybackEvent::StepAdvanced(tick as usize));
                        for message in &messages {
                            if let Err(e) = sink.send(message) {
                                let _ = sender.send(PlaybackEvent::SendFailed(e.to_string()));
                            }
                        }
                    }

                    if last_pass {
                        let mut state = lock(&clock);
                        if state.generation == generation {
                            state.running = false;
                        }
                        break;
                    }

                    tick = (tick + 1) % LOOP_TICKS;
                    // after a long park, restart the schedule instead of bursting to catch up
                    last_tick = Some(if now.duration_since(due) > duration {
                        now
                    } else {
                        due
                    });
                }

                thread::sleep(Duration::from_millis(1));
            }
        });
    }

    pub fn stop(&mut self) {
        lock(&self.clock).running = false;
    }

    pub fn is_running(&self) -> bool {
        lock(&self.clock).running
    }

    pub fn poll_events(&self) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}
