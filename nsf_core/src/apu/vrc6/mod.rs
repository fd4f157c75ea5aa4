mod sawtooth;
mod square;

pub(crate) use sawtooth::Vrc6Sawtooth;
pub(crate) use square::Vrc6Pulse;

use super::channel::Channel;
use serde::{Deserialize, Serialize};

/// The VRC6 expansion chip's channel set: two pulse channels and a
/// sawtooth. Structurally parallel to the built-in pulses but with its own
/// duty tables and no envelope/sweep/length machinery.
#[derive(Serialize, Deserialize)]
pub(crate) struct Vrc6 {
    pub(crate) pulse_1: Vrc6Pulse,
    pub(crate) pulse_2: Vrc6Pulse,
    pub(crate) sawtooth: Vrc6Sawtooth,
}

impl Vrc6 {
    pub(crate) fn new() -> Self {
        Self {
            pulse_1: Vrc6Pulse::new(),
            pulse_2: Vrc6Pulse::new(),
            sawtooth: Vrc6Sawtooth::new(),
        }
    }

    pub(crate) fn clock(&mut self, cycles: u32) {
        self.pulse_1.clock(cycles);
        self.pulse_2.clock(cycles);
        self.sawtooth.clock(cycles);
    }

    /// Summed chip output, attenuated and weighted by the mixer.
    pub(crate) fn output(&self) -> u8 {
        self.pulse_1.amplitude() + self.pulse_2.amplitude() + self.sawtooth.amplitude()
    }
}
