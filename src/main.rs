#[cfg(feature = "gui")]
use eframe::egui;

#[cfg(feature = "gui")]
use std::io::ErrorKind;

#[cfg(feature = "gui")]
use beatbox::{
    BeatBox, Command, Config, Error, MidiOutputDevice, MidiSequencer, Outcome, PlaybackEvent,
    PortSelection, INSTRUMENTS,
};

#[cfg(feature = "gui")]
fn main() -> anyhow::Result<()> {
    let app = BeatBoxApp::new()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 620.0])
            .with_title("BeatBox"),
        ..Default::default()
    };

    eframe::run_native("BeatBox", options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("{}", e))
}

#[cfg(not(feature = "gui"))]
fn main() {
    eprintln!("This binary requires the 'gui' feature to be enabled");
    std::process::exit(1);
}

#[cfg(feature = "gui")]
struct BeatBoxApp {
    beatbox: BeatBox<MidiSequencer>,

    // UI state
    status: String,
    current_step: Option<usize>,
}

#[cfg(feature = "gui")]
impl BeatBoxApp {
    fn new() -> anyhow::Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                // first run: leave an editable file behind
                let config = Config::default();
                if let Err(e) = config.save() {
                    eprintln!("could not write default config: {}", e);
                }
                config
            }
            Err(e) => {
                eprintln!("using default config: {}", e);
                Config::default()
            }
        };

        let selection = match &config.midi_output {
            Some(name) => PortSelection::Named(name.clone()),
            None => PortSelection::First,
        };

        let mut status = String::new();
        let beatbox = match BeatBox::from_config(MidiSequencer::new(selection), &config) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("MIDI setup failed, playing silently: {}", e);
                eprintln!("available ports: {:?}", MidiOutputDevice::available_ports());
                status = format!("MIDI setup failed: {}", e);
                BeatBox::from_config(MidiSequencer::silent(), &config)?
            }
        };

        if let Some(port) = beatbox.transport().backend().port_name() {
            status = format!("MIDI output: {}", port);
        }

        Ok(Self {
            beatbox,
            status,
            current_step: None,
        })
    }

    fn run(&mut self, command: Command) {
        match self.beatbox.dispatch(command) {
            Ok(outcome) => self.report(outcome),
            Err(e) => {
                eprintln!("{:?} failed: {}", command, e);
                self.status = format!("{:?} failed: {}", command, e);
            }
        }
    }

    fn report(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Started(report) | Outcome::Restored(report) => {
                for e in &report.rejected {
                    eprintln!("event skipped: {}", e);
                }
                self.status = if report.rejected.is_empty() {
                    format!("Playing {} events", report.events)
                } else {
                    format!(
                        "Playing {} events ({} rejected)",
                        report.events,
                        report.rejected.len()
                    )
                };
            }
            Outcome::Stopped => {
                self.current_step = None;
                self.status = "Stopped".to_string();
            }
            Outcome::Tempo(bpm) => self.status = format!("Tempo {:.1} BPM", bpm),
            Outcome::Saved => {
                self.status = format!("Saved to {}", self.beatbox.pattern().path().display())
            }
            Outcome::GridChanged => {}
        }
    }

    fn handle_playback_events(&mut self) {
        for event in self.beatbox.transport().backend().poll_events() {
            match event {
                PlaybackEvent::StepAdvanced(step) => self.current_step = Some(step),
                PlaybackEvent::SendFailed(e) => {
                    eprintln!("MIDI send failed: {}", e);
                    self.status = format!("MIDI send failed: {}", e);
                }
            }
        }
    }
}

#[cfg(feature = "gui")]
impl eframe::App for BeatBoxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint();

        self.handle_playback_events();

        egui::SidePanel::right("transport").show(ctx, |ui| {
            ui.add_space(10.0);
            let commands = [
                ("Start", Command::Start),
                ("Stop", Command::Stop),
                ("Tempo Up", Command::TempoUp),
                ("Tempo Down", Command::TempoDown),
                ("Save", Command::Save),
                ("Restore", Command::Restore),
            ];
            for (label, command) in commands {
                if ui
                    .add(egui::Button::new(label).min_size(egui::vec2(110.0, 30.0)))
                    .clicked()
                {
                    self.run(command);
                }
            }
            ui.add_space(10.0);
            ui.label(format!("{:.1} BPM", self.beatbox.transport().tempo_bpm()));
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("BeatBox");
            ui.add_space(10.0);

            let playing = self.beatbox.transport().is_running();
            let mut clicked = None;

            egui::Grid::new("steps").spacing([2.0, 2.0]).show(ui, |ui| {
                for (instrument, voice) in INSTRUMENTS.iter().enumerate() {
                    ui.label(voice.name);
                    for step in 0..16 {
                        let active = self
                            .beatbox
                            .grid()
                            .is_active(instrument, step)
                            .unwrap_or(false);
                        let is_current = playing && self.current_step == Some(step);

                        let button = egui::Button::new("")
                            .min_size(egui::vec2(24.0, 24.0))
                            .fill(if active {
                                egui::Color32::from_rgb(60, 60, 200)
                            } else if is_current {
                                egui::Color32::from_rgb(70, 110, 70)
                            } else {
                                egui::Color32::from_rgb(40, 40, 40)
                            });

                        if ui.add(button).clicked() {
                            clicked = Some(Command::Toggle { instrument, step });
                        }
                    }
                    ui.end_row();
                }
            });

            if let Some(command) = clicked {
                self.run(command);
            }
        });
    }
}
