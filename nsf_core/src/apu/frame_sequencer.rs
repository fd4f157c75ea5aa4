use serde::{Deserialize, Serialize};

/// Step thresholds in CPU clocks. The hardware counts these in APU clocks
/// with a half-clock offset (3728.5, 7456.5, ...), doubling gives whole
/// numbers.
///
/// http://wiki.nesdev.com/w/index.php/APU_Frame_Counter
const STEP_THRESHOLDS: [u32; 5] = [7457, 14913, 22371, 29829, 37281];

/// The APU's frame sequencer: accumulates CPU clocks and fires the periodic
/// half-frame (sweep + length counter) and quarter-frame (envelope + linear
/// counter) events.
#[derive(Serialize, Deserialize)]
pub(crate) struct FrameSequencer {
    five_step_mode: bool,
    step: u8,
    counter: u32,
}

impl FrameSequencer {
    pub(crate) fn new() -> Self {
        Self {
            five_step_mode: false,
            step: 0,
            counter: 0,
        }
    }

    /// Mode register write, bit 7 selects the 5-step sequence. Writing also
    /// restarts the sequence.
    pub(crate) fn set_mode(&mut self, five_step_mode: bool) {
        self.five_step_mode = five_step_mode;
        self.step = 0;
        self.counter = 0;
    }

    /// Advance by elapsed CPU clocks, returns
    /// (quarter frame event, half frame event).
    pub(crate) fn clock(&mut self, cycles: u32) -> (bool, bool) {
        self.counter += cycles;

        if self.counter <= STEP_THRESHOLDS[self.step as usize] {
            return (false, false);
        }

        let last_step = if self.five_step_mode { 4 } else { 3 };

        self.step += 1;
        if self.step > last_step {
            self.step = 0;
            self.counter = 0;
        }

        let half_frame = self.step == 1 || self.step == 3;
        // the 5-step sequence's extra step clocks nothing
        let quarter_frame = self.step <= 3;

        (quarter_frame, half_frame)
    }
}
