use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use dynwave::AudioPlayer;
use nsf_core::{DEFAULT_SAMPLE_RATE, NSF};
use std::io::{stdout, Write};
use std::time::{Duration, Instant};

/// Samples rendered per pump, one 60Hz frame worth.
const SAMPLES_PER_FRAME: usize = (DEFAULT_SAMPLE_RATE / 60) as usize;

pub struct Ui {
    nsf: NSF,

    audio_player: Option<AudioPlayer<f32>>,
}

impl Ui {
    pub fn new(nsf: NSF, has_audio: bool) -> Self {
        Ui {
            nsf,

            audio_player: if has_audio {
                Some(AudioPlayer::new(DEFAULT_SAMPLE_RATE, dynwave::BufferSize::QuarterSecond).unwrap())
            } else {
                None
            },
        }
    }

    pub fn run(&mut self) {
        enable_raw_mode().unwrap();

        if let Some(ref player) = self.audio_player {
            player.play().unwrap();
        }

        let mut mono = vec![0.; SAMPLES_PER_FRAME];
        let mut stereo = Vec::with_capacity(SAMPLES_PER_FRAME * 2);
        let mut next_pump = Instant::now();

        self.print_status();

        loop {
            if event::poll(Duration::from_millis(2)).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => break,
                            KeyCode::Char('n') => {
                                self.nsf.next_track();
                                log::info!("track {}", self.nsf.current_song());
                                self.print_status();
                            }
                            KeyCode::Char('p') => {
                                self.nsf.prev_track();
                                log::info!("track {}", self.nsf.current_song());
                                self.print_status();
                            }
                            KeyCode::Char(' ') => {
                                let playing = self.nsf.is_playing();
                                self.nsf.set_playing(!playing);
                                self.print_status();
                            }
                            _ => {}
                        }
                    }
                }
            }

            if Instant::now() >= next_pump {
                next_pump += Duration::from_micros(1_000_000 / 60);

                if let Err(err) = self.nsf.fill_samples(&mut mono) {
                    log::error!("emulation stopped: {}", err);
                    break;
                }

                if let Some(ref mut player) = self.audio_player {
                    stereo.clear();
                    for &sample in &mono {
                        // duplicate for the two output channels
                        stereo.push(sample);
                        stereo.push(sample);
                    }

                    player.queue(&stereo);
                }
            }
        }

        disable_raw_mode().unwrap();
        println!();
    }

    fn print_status(&self) {
        print!(
            "\r\x1b[2K\"{}\" by \"{}\" - track {}/{}{}  [n]ext [p]rev [space] pause [q]uit",
            self.nsf.name(),
            self.nsf.artist(),
            self.nsf.current_song(),
            self.nsf.songs_count(),
            if self.nsf.is_playing() {
                ""
            } else {
                " (paused)"
            },
        );
        stdout().flush().unwrap();
    }
}
