use super::super::channel::Channel;
use crate::nsf_file::NsfFile;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, rc::Rc};

/// Byte-fetch intervals in CPU clocks, NTSC.
const DMC_RATE_TABLE: [u16; 0x10] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

/// CPU clocks a sample byte fetch steals from the processor.
const FETCH_STALL_CYCLES: u32 = 2;

/// Delta-modulation sample playback. Reads successive bytes from the banked
/// image and moves a 7-bit level up or down per sample bit.
pub(crate) struct Dmc {
    file: Rc<RefCell<NsfFile>>,

    enabled: bool,
    loop_flag: bool,
    irq_enabled: bool,

    period: u16,
    timer: i32,

    sample_address: u16,
    current_address: u16,
    sample_length: u16,
    remaining_bytes: u16,

    shift_register: u8,
    bits_remaining: u8,

    delta_counter: u8,
    dac_lsb: u8,

    stolen_cycles: u32,
}

impl Dmc {
    pub(crate) fn new(file: Rc<RefCell<NsfFile>>) -> Self {
        Self {
            file,

            enabled: false,
            loop_flag: false,
            irq_enabled: false,

            period: 0,
            timer: 0,

            sample_address: 0,
            current_address: 0,
            sample_length: 0,
            remaining_bytes: 0,

            shift_register: 0,
            bits_remaining: 8,

            delta_counter: 0,
            dac_lsb: 0,

            stolen_cycles: 0,
        }
    }

    pub(crate) fn set_flags_and_rate(&mut self, data: u8) {
        self.irq_enabled = data & 0x80 != 0;
        self.loop_flag = data & 0x40 != 0;
        self.period = DMC_RATE_TABLE[(data & 0xF) as usize];
    }

    pub(crate) fn set_direct_load(&mut self, data: u8) {
        self.delta_counter = (data >> 1) & 0x3F;
        self.dac_lsb = data & 1;
    }

    pub(crate) fn set_sample_address(&mut self, data: u8) {
        self.sample_address = 0xC000 | ((data as u16) << 6);
        self.current_address = self.sample_address;
    }

    pub(crate) fn set_sample_length(&mut self, data: u8) {
        self.sample_length = ((data as u16) << 4) + 1;
        self.remaining_bytes = self.sample_length;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;

        if enabled {
            // prime the shifter on the next bit
            self.bits_remaining = 1;
            self.fetch_next_bit();
        }
    }

    /// Bus-contention cycles accumulated by sample fetches since the last
    /// call.
    pub(crate) fn take_stolen_cycles(&mut self) -> u32 {
        std::mem::take(&mut self.stolen_cycles)
    }

    fn fetch_next_bit(&mut self) {
        if self.bits_remaining <= 1 {
            self.bits_remaining = 8;

            if self.remaining_bytes == 0 && self.loop_flag {
                self.current_address = self.sample_address;
                self.remaining_bytes = self.sample_length;
            } else if self.remaining_bytes > 0 {
                self.shift_register = self.file.borrow().read(self.current_address);
                // the fetch holds the bus and stalls the processor
                self.stolen_cycles += FETCH_STALL_CYCLES;

                self.remaining_bytes -= 1;
                self.current_address = if self.current_address == 0xFFFF {
                    0x8000
                } else {
                    self.current_address + 1
                };
            }
        } else {
            self.bits_remaining -= 1;
        }
    }

    pub(crate) fn save_state(&self) -> DmcState {
        DmcState {
            enabled: self.enabled,
            loop_flag: self.loop_flag,
            irq_enabled: self.irq_enabled,
            period: self.period,
            timer: self.timer,
            sample_address: self.sample_address,
            current_address: self.current_address,
            sample_length: self.sample_length,
            remaining_bytes: self.remaining_bytes,
            shift_register: self.shift_register,
            bits_remaining: self.bits_remaining,
            delta_counter: self.delta_counter,
            dac_lsb: self.dac_lsb,
            stolen_cycles: self.stolen_cycles,
        }
    }

    pub(crate) fn load_state(&mut self, state: DmcState) {
        self.enabled = state.enabled;
        self.loop_flag = state.loop_flag;
        self.irq_enabled = state.irq_enabled;
        self.period = state.period;
        self.timer = state.timer;
        self.sample_address = state.sample_address;
        self.current_address = state.current_address;
        self.sample_length = state.sample_length;
        self.remaining_bytes = state.remaining_bytes;
        self.shift_register = state.shift_register;
        self.bits_remaining = state.bits_remaining;
        self.delta_counter = state.delta_counter;
        self.dac_lsb = state.dac_lsb;
        self.stolen_cycles = state.stolen_cycles;
    }

    #[cfg(test)]
    pub(crate) fn current_address(&self) -> u16 {
        self.current_address
    }

    #[cfg(test)]
    pub(crate) fn delta_counter(&self) -> u8 {
        self.delta_counter
    }
}

/// Mirror of [`Dmc`] without the shared image handle, for save states.
#[derive(Serialize, Deserialize)]
pub(crate) struct DmcState {
    enabled: bool,
    loop_flag: bool,
    irq_enabled: bool,
    period: u16,
    timer: i32,
    sample_address: u16,
    current_address: u16,
    sample_length: u16,
    remaining_bytes: u16,
    shift_register: u8,
    bits_remaining: u8,
    delta_counter: u8,
    dac_lsb: u8,
    stolen_cycles: u32,
}

impl Channel for Dmc {
    fn clock(&mut self, cycles: u32) {
        if !self.enabled || self.period < 1 {
            return;
        }

        self.timer -= cycles as i32;
        while self.timer <= 0 {
            self.timer += self.period as i32;

            if self.shift_register & 1 != 0 {
                if self.delta_counter < 0x3F {
                    self.delta_counter += 1;
                }
            } else if self.delta_counter > 0 {
                self.delta_counter -= 1;
            }

            self.shift_register >>= 1;
            self.fetch_next_bit();
        }
    }

    fn amplitude(&self) -> u8 {
        if self.enabled {
            self.delta_counter << 1 | self.dac_lsb
        } else {
            0
        }
    }
}
