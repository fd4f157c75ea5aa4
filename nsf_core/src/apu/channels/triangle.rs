use super::super::channel::Channel;
use super::super::length_counter::LengthCounter;
use serde::{Deserialize, Serialize};

const TRIANGLE_STEPS: [u8; 32] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5,
    4, 3, 2, 1, 0,
];

#[derive(Serialize, Deserialize)]
pub(crate) struct TriangleWave {
    period: u16,
    timer: i32,
    step_index: u8,

    linear_counter: u8,
    linear_counter_reload_value: u8,
    /// bit 7 of the linear counter register
    control_flag: bool,
    linear_counter_reload_flag: bool,

    length_counter: LengthCounter,
}

impl TriangleWave {
    pub(crate) fn new() -> Self {
        Self {
            period: 0,
            timer: 0,
            step_index: 0,

            linear_counter: 0,
            linear_counter_reload_value: 0,
            control_flag: false,
            linear_counter_reload_flag: false,

            length_counter: LengthCounter::new(),
        }
    }

    pub(crate) fn set_linear_counter(&mut self, data: u8) {
        self.control_flag = data & 0x80 != 0;
        self.linear_counter_reload_value = data & 0x7F;
        self.linear_counter_reload_flag = true;

        // a set control bit lets the length counter run
        self.length_counter.set_halt(!self.control_flag);
    }

    pub(crate) fn set_timer_low(&mut self, data: u8) {
        self.period = (self.period & 0x0700) | data as u16;
    }

    pub(crate) fn set_timer_high(&mut self, data: u8) {
        self.period = (self.period & 0xFF) | ((data as u16 & 0b111) << 8);
        self.length_counter.reload(data >> 3);
        self.linear_counter_reload_flag = true;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.length_counter.set_enabled(enabled);
    }

    #[cfg(test)]
    pub(crate) fn length_counter(&self) -> &LengthCounter {
        &self.length_counter
    }
}

impl Channel for TriangleWave {
    fn clock(&mut self, cycles: u32) {
        if self.period == 0 {
            self.step_index = 0;
            return;
        }

        self.timer -= cycles as i32;
        while self.timer <= 0 {
            self.timer += self.period as i32 + 1;

            // the staircase only moves while both counters are live
            if self.linear_counter > 0 && self.length_counter.counter() > 0 {
                self.step_index = (self.step_index + 1) & 0x1F;
            }
        }
    }

    fn half_frame_clock(&mut self) {
        self.length_counter.clock();
    }

    fn quarter_frame_clock(&mut self) {
        if self.linear_counter_reload_flag {
            self.linear_counter = self.linear_counter_reload_value;
            self.linear_counter_reload_flag = false;
        }

        if !self.control_flag && self.linear_counter > 0 {
            self.linear_counter -= 1;
        }
    }

    fn amplitude(&self) -> u8 {
        if self.period == 0 || !self.length_counter.is_enabled() {
            0
        } else {
            // holds the last step while the counters are paused
            TRIANGLE_STEPS[self.step_index as usize]
        }
    }
}
