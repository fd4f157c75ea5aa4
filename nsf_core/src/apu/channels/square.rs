use super::super::channel::Channel;
use super::super::envelope::EnvelopeGenerator;
use super::super::length_counter::LengthCounter;
use serde::{Deserialize, Serialize};

const DUTY_CYCLE_SEQUENCES: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

/// Periods below this silence the channel on hardware.
const MIN_PERIOD: u16 = 8;
/// A sweep that would push the period past this mutes the channel.
const MAX_SWEEP_PERIOD: u16 = 0x0FFF;

#[derive(Serialize, Deserialize)]
struct Sweeper {
    enabled: bool,
    negative: bool,
    divider_reload_value: u8,
    divider_counter: u8,
    shift_count: u8,

    /// pulse 1 subtracts one extra unit on a negative sweep
    extra_decrement: u16,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct SquarePulse {
    duty_cycle_index: u8,
    sequence_position: u8,

    period: u16,
    timer: i32,

    envelope_generator: EnvelopeGenerator,
    length_counter: LengthCounter,
    sweeper: Sweeper,
}

impl SquarePulse {
    pub(crate) fn new(is_square_1: bool) -> Self {
        Self {
            duty_cycle_index: 0,
            sequence_position: 0,

            period: 0,
            timer: 0,

            envelope_generator: EnvelopeGenerator::new(),
            length_counter: LengthCounter::new(),
            sweeper: Sweeper {
                enabled: false,
                negative: false,
                divider_reload_value: 0,
                divider_counter: 0,
                shift_count: 0,
                extra_decrement: is_square_1 as u16,
            },
        }
    }

    pub(crate) fn set_control(&mut self, data: u8) {
        self.duty_cycle_index = data >> 6;
        self.length_counter.set_halt(data & 0x20 != 0);
        self.envelope_generator.set_control(data);
    }

    pub(crate) fn set_sweep_data(&mut self, data: u8) {
        self.sweeper.enabled = data & 0x80 != 0;
        self.sweeper.divider_reload_value = (data >> 4) & 0b111;
        self.sweeper.negative = data & 0x08 != 0;
        self.sweeper.shift_count = data & 0b111;
    }

    pub(crate) fn set_timer_low(&mut self, data: u8) {
        self.period = (self.period & 0x0700) | data as u16;
    }

    pub(crate) fn set_timer_high(&mut self, data: u8) {
        self.period = (self.period & 0xFF) | ((data as u16 & 0b111) << 8);
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

    /// Sweeping up from here would leave the 12-bit range, the hardware
    /// mutes the channel for as long as that holds.
    fn sweep_overflowed(&self) -> bool {
        !self.sweeper.negative
            && self.period + (self.period >> self.sweeper.shift_count) > MAX_SWEEP_PERIOD
    }
}

impl Channel for SquarePulse {
    fn clock(&mut self, cycles: u32) {
        // below the silence threshold the waveform does not step
        if self.period < MIN_PERIOD {
            return;
        }

        self.timer -= cycles as i32;
        while self.timer <= 0 {
            // the duty sequencer steps once per two clocks of the 11-bit timer
            self.timer += 2 * (self.period as i32 + 1);
            self.sequence_position = (self.sequence_position + 1) & 0x7;
        }
    }

    fn half_frame_clock(&mut self) {
        self.length_counter.clock();

        if self.sweeper.divider_counter <= 1 {
            self.sweeper.divider_counter = self.sweeper.divider_reload_value + 1;

            if self.sweeper.enabled && self.sweeper.shift_count > 0 && self.period > 7 {
                let change_amount = self.period >> self.sweeper.shift_count;

                if self.sweeper.negative {
                    self.period = self
                        .period
                        .saturating_sub(change_amount)
                        .saturating_sub(self.sweeper.extra_decrement);
                } else {
                    self.period = (self.period + change_amount).min(MAX_SWEEP_PERIOD);
                }
            }
        } else {
            self.sweeper.divider_counter -= 1;
        }
    }

    fn quarter_frame_clock(&mut self) {
        self.envelope_generator.clock();
    }

    fn amplitude(&self) -> u8 {
        if self.length_counter.counter() == 0
            || self.period < MIN_PERIOD
            || self.sweep_overflowed()
        {
            return 0;
        }

        self.envelope_generator.volume()
            * DUTY_CYCLE_SEQUENCES[(self.duty_cycle_index & 0x3) as usize]
                [self.sequence_position as usize]
    }
}
