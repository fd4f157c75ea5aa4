use serde::{Deserialize, Serialize};

/// using the value `index` as index to the table
///      |  0   1   2   3   4   5   6   7    8   9   A   B   C   D   E   F
/// -----+----------------------------------------------------------------
/// 00-0F  10,254, 20,  2, 40,  4, 80,  6, 160,  8, 60, 10, 14, 12, 26, 14,
/// 10-1F  12, 16, 24, 18, 48, 20, 96, 22, 192, 24, 72, 26, 16, 28, 32, 30
const LENGTH_COUNTER_TABLE: [u8; 0x20] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

#[derive(Serialize, Deserialize)]
pub(crate) struct LengthCounter {
    counter: u8,
    enabled: bool,
    halt: bool,
}

impl LengthCounter {
    pub(crate) fn new() -> Self {
        Self {
            counter: 0,
            // channels come out of reset enabled
            enabled: true,
            halt: false,
        }
    }

    /// Reload from the lookup table, only while the channel is enabled.
    pub(crate) fn reload(&mut self, index: u8) {
        if self.enabled {
            self.counter = LENGTH_COUNTER_TABLE[(index & 0x1F) as usize];
        }
    }

    /// Half-frame decrement, does nothing when halted or already silent.
    pub(crate) fn clock(&mut self) {
        if self.enabled {
            // `saturating_sub` will stop at 0 instead of overflowing
            self.counter = self.counter.saturating_sub((!self.halt) as u8);
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        // silence immediately
        if !enabled {
            self.counter = 0;
        }
    }

    pub(crate) fn set_halt(&mut self, halt: bool) {
        self.halt = halt;
    }

    pub(crate) fn counter(&self) -> u8 {
        self.counter
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }
}
