use serde::{Deserialize, Serialize};

/// Shared envelope unit of the pulse and noise channels.
#[derive(Serialize, Deserialize)]
pub(crate) struct EnvelopeGenerator {
    start_flag: bool,
    loop_flag: bool,

    use_constant_volume: bool,

    /// also used as the constant volume
    divider_reload_value: u8,
    divider_counter: u8,

    decay_level: u8,
}

impl EnvelopeGenerator {
    pub(crate) fn new() -> Self {
        Self {
            start_flag: false,
            loop_flag: false,
            use_constant_volume: false,
            divider_reload_value: 0,
            divider_counter: 0,
            decay_level: 0,
        }
    }

    /// Volume/envelope half of a channel control write: bit 4 selects
    /// constant volume, the low nibble is the volume or the decay rate.
    pub(crate) fn set_control(&mut self, data: u8) {
        self.use_constant_volume = data & 0x10 != 0;
        self.loop_flag = data & 0x10 == 0;
        self.divider_reload_value = data & 0xF;
    }

    /// Arm the reload, the next quarter-frame clock restarts the decay.
    pub(crate) fn set_start_flag(&mut self) {
        self.start_flag = true;
    }

    pub(crate) fn clock(&mut self) {
        if self.start_flag {
            self.start_flag = false;
            self.divider_counter = self.divider_reload_value + 1;
            self.decay_level = 0xF;
        } else if self.divider_counter <= 1 {
            self.divider_counter = self.divider_reload_value + 1;

            if self.decay_level > 0 {
                self.decay_level -= 1;
            } else if self.loop_flag {
                self.decay_level = 0xF;
            }
        } else {
            self.divider_counter -= 1;
        }
    }

    /// Selected output volume: the decaying level, or the register value
    /// when constant volume is selected.
    pub(crate) fn volume(&self) -> u8 {
        if self.use_constant_volume {
            self.divider_reload_value
        } else {
            self.decay_level
        }
    }
}
