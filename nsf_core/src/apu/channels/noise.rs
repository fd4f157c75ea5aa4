use super::super::channel::Channel;
use super::super::envelope::EnvelopeGenerator;
use super::super::length_counter::LengthCounter;
use serde::{Deserialize, Serialize};

/// Table for NTSC only, in CPU clocks.
const NOISE_PERIOD_TABLE: [u16; 0x10] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

#[derive(Serialize, Deserialize)]
pub(crate) struct NoiseWave {
    period: u16,
    timer: i32,

    shift_register: u16,
    /// output is silenced whenever the freshly shifted-in bit is 1
    last_bit_set: bool,
    /// moves the feedback tap from distance 1 to distance 6
    short_mode: bool,

    envelope_generator: EnvelopeGenerator,
    length_counter: LengthCounter,
}

impl NoiseWave {
    pub(crate) fn new() -> Self {
        Self {
            period: 0,
            timer: 0,

            shift_register: 1,
            last_bit_set: false,
            short_mode: false,

            envelope_generator: EnvelopeGenerator::new(),
            length_counter: LengthCounter::new(),
        }
    }

    pub(crate) fn set_control(&mut self, data: u8) {
        self.length_counter.set_halt(data & 0x20 != 0);
        self.envelope_generator.set_control(data);
    }

    pub(crate) fn set_timer_and_mode(&mut self, data: u8) {
        self.period = NOISE_PERIOD_TABLE[(data & 0xF) as usize];
        self.short_mode = data & 0x8 != 0;
    }

    pub(crate) fn set_length(&mut self, data: u8) {
        self.length_counter.reload(data >> 3);
        self.envelope_generator.set_start_flag();
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.length_counter.set_enabled(enabled);
    }

    #[cfg(test)]
    pub(crate) fn length_counter(&self) -> &LengthCounter {
        &self.length_counter
    }
}

impl Channel for NoiseWave {
    fn clock(&mut self, cycles: u32) {
        if self.period == 0 {
            return;
        }

        self.timer -= cycles as i32;
        while self.timer <= 0 {
            self.timer += self.period as i32;

            // left-shifting feedback register, reseeded every period tick
            let tap_shift = if self.short_mode { 6 } else { 1 };

            self.shift_register = self.shift_register.wrapping_shl(1);
            let feedback = (self.shift_register.wrapping_shl(tap_shift) ^ self.shift_register)
                & 0x8000
                != 0;

            if feedback {
                self.shift_register |= 1;
            }
            self.last_bit_set = feedback;
        }
    }

    fn half_frame_clock(&mut self) {
        self.length_counter.clock();
    }

    fn quarter_frame_clock(&mut self) {
        self.envelope_generator.clock();
    }

    fn amplitude(&self) -> u8 {
        if self.last_bit_set || self.length_counter.counter() == 0 {
            0
        } else {
            self.envelope_generator.volume()
        }
    }
}
