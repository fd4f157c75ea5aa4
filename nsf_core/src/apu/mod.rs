mod channel;
mod channels;
mod envelope;
mod frame_sequencer;
mod length_counter;
mod mixer;
mod registers;
mod vrc6;

#[cfg(test)]
mod tests;

use crate::common::save_state::{Savable, SaveError};
use crate::nsf_file::{ChipSet, NsfFile};
use channel::Channel;
use channels::{Dmc, NoiseWave, SquarePulse, TriangleWave};
use frame_sequencer::FrameSequencer;
use mixer::Mixer;
use registers::{ExpansionRegister, Register};
use std::{
    cell::RefCell,
    io::{Read, Write},
    rc::Rc,
};
use vrc6::Vrc6;

/// The audio-processing unit: frame sequencer, the five built-in channels,
/// the VRC6 expansion channel set and the mixer.
pub(crate) struct Apu {
    square_pulse_1: SquarePulse,
    square_pulse_2: SquarePulse,
    triangle: TriangleWave,
    noise: NoiseWave,
    dmc: Dmc,

    vrc6: Vrc6,
    chips: ChipSet,

    frame_sequencer: FrameSequencer,
    mixer: Mixer,
}

impl Apu {
    pub(crate) fn new(file: Rc<RefCell<NsfFile>>, chips: ChipSet) -> Self {
        Self {
            square_pulse_1: SquarePulse::new(true),
            square_pulse_2: SquarePulse::new(false),
            triangle: TriangleWave::new(),
            noise: NoiseWave::new(),
            dmc: Dmc::new(file),

            vrc6: Vrc6::new(),
            chips,

            frame_sequencer: FrameSequencer::new(),
            mixer: Mixer::new(chips),
        }
    }

    /// Feed the clock cost of one executed instruction to every channel and
    /// the frame sequencer. Returns the CPU clocks stolen by DMC sample
    /// fetches during this advance.
    pub(crate) fn clock(&mut self, cycles: u32) -> u32 {
        self.square_pulse_1.clock(cycles);
        self.square_pulse_2.clock(cycles);
        self.triangle.clock(cycles);
        self.noise.clock(cycles);
        self.dmc.clock(cycles);

        if self.chips.contains(ChipSet::VRC6) {
            self.vrc6.clock(cycles);
        }

        let (quarter_frame, half_frame) = self.frame_sequencer.clock(cycles);
        if half_frame {
            self.generate_half_frame_clock();
        }
        if quarter_frame {
            self.generate_quarter_frame_clock();
        }

        self.dmc.take_stolen_cycles()
    }

    /// One mixed output sample from the current channel amplitudes.
    pub(crate) fn sample(&self) -> f32 {
        let expansion = if self.chips.contains(ChipSet::VRC6) {
            self.vrc6.output()
        } else {
            0
        };

        self.mixer.mix(
            self.square_pulse_1.amplitude(),
            self.square_pulse_2.amplitude(),
            self.triangle.amplitude(),
            self.noise.amplitude(),
            self.dmc.amplitude(),
            expansion,
        )
    }

    pub(crate) fn write_register(&mut self, address: u16, data: u8) {
        let register = match address.try_into() {
            Ok(register) => register,
            // unmapped holes in the register block are inert
            Err(()) => return,
        };

        match register {
            Register::Pulse1Control => self.square_pulse_1.set_control(data),
            Register::Pulse1Sweep => self.square_pulse_1.set_sweep_data(data),
            Register::Pulse1TimerLow => self.square_pulse_1.set_timer_low(data),
            Register::Pulse1TimerHigh => self.square_pulse_1.set_timer_high(data),

            Register::Pulse2Control => self.square_pulse_2.set_control(data),
            Register::Pulse2Sweep => self.square_pulse_2.set_sweep_data(data),
            Register::Pulse2TimerLow => self.square_pulse_2.set_timer_low(data),
            Register::Pulse2TimerHigh => self.square_pulse_2.set_timer_high(data),

            Register::TriangleLinear => self.triangle.set_linear_counter(data),
            Register::TriangleUnused => {}
            Register::TriangleTimerLow => self.triangle.set_timer_low(data),
            Register::TriangleTimerHigh => self.triangle.set_timer_high(data),

            Register::NoiseControl => self.noise.set_control(data),
            Register::NoiseUnused => {}
            Register::NoiseTimerMode => self.noise.set_timer_and_mode(data),
            Register::NoiseLength => self.noise.set_length(data),

            Register::DmcFlagsRate => self.dmc.set_flags_and_rate(data),
            Register::DmcDirectLoad => self.dmc.set_direct_load(data),
            Register::DmcSampleAddress => self.dmc.set_sample_address(data),
            Register::DmcSampleLength => self.dmc.set_sample_length(data),

            Register::ChannelsEnable => {
                self.square_pulse_1.set_enabled(data & 1 != 0);
                self.square_pulse_2.set_enabled(data & 2 != 0);
                self.triangle.set_enabled(data & 4 != 0);
                self.noise.set_enabled(data & 8 != 0);
                self.dmc.set_enabled(data & 0x10 != 0);
            }

            Register::SequencerMode => {
                self.frame_sequencer.set_mode(data & 0x80 != 0);
            }
        }
    }

    /// Expansion-chip register writes. The whole window is inert unless the
    /// loaded image declares the chip.
    pub(crate) fn write_expansion_register(&mut self, address: u16, data: u8) {
        if !self.chips.contains(ChipSet::VRC6) {
            return;
        }

        let register = match address.try_into() {
            Ok(register) => register,
            Err(()) => return,
        };

        match register {
            ExpansionRegister::Vrc6Pulse1Control => self.vrc6.pulse_1.set_control(data),
            ExpansionRegister::Vrc6Pulse1TimerLow => self.vrc6.pulse_1.set_timer_low(data),
            ExpansionRegister::Vrc6Pulse1TimerHigh => self.vrc6.pulse_1.set_timer_high(data),

            ExpansionRegister::Vrc6Pulse2Control => self.vrc6.pulse_2.set_control(data),
            ExpansionRegister::Vrc6Pulse2TimerLow => self.vrc6.pulse_2.set_timer_low(data),
            ExpansionRegister::Vrc6Pulse2TimerHigh => self.vrc6.pulse_2.set_timer_high(data),

            ExpansionRegister::Vrc6SawtoothRate => self.vrc6.sawtooth.set_rate(data),
            ExpansionRegister::Vrc6SawtoothTimerLow => self.vrc6.sawtooth.set_timer_low(data),
            ExpansionRegister::Vrc6SawtoothTimerHigh => self.vrc6.sawtooth.set_timer_high(data),
        }
    }

    fn generate_quarter_frame_clock(&mut self) {
        self.square_pulse_1.quarter_frame_clock();
        self.square_pulse_2.quarter_frame_clock();
        self.triangle.quarter_frame_clock();
        self.noise.quarter_frame_clock();
    }

    fn generate_half_frame_clock(&mut self) {
        self.square_pulse_1.half_frame_clock();
        self.square_pulse_2.half_frame_clock();
        self.triangle.half_frame_clock();
        self.noise.half_frame_clock();
    }
}

impl Savable for Apu {
    fn save<W: Write>(&self, writer: &mut W) -> Result<(), SaveError> {
        bincode::serialize_into(&mut *writer, &self.square_pulse_1)
            .and_then(|_| bincode::serialize_into(&mut *writer, &self.square_pulse_2))
            .and_then(|_| bincode::serialize_into(&mut *writer, &self.triangle))
            .and_then(|_| bincode::serialize_into(&mut *writer, &self.noise))
            .and_then(|_| bincode::serialize_into(&mut *writer, &self.dmc.save_state()))
            .and_then(|_| bincode::serialize_into(&mut *writer, &self.vrc6))
            .and_then(|_| bincode::serialize_into(&mut *writer, &self.frame_sequencer))
            .map_err(|_| SaveError::SerializationError)
    }

    fn load<R: Read>(&mut self, reader: &mut R) -> Result<(), SaveError> {
        fn read_component<R: Read, S: serde::de::DeserializeOwned>(
            reader: &mut R,
        ) -> Result<S, SaveError> {
            bincode::deserialize_from(&mut *reader).map_err(|err| match *err {
                bincode::ErrorKind::Io(err) => SaveError::IoError(err),
                _ => SaveError::SerializationError,
            })
        }

        self.square_pulse_1 = read_component(reader)?;
        self.square_pulse_2 = read_component(reader)?;
        self.triangle = read_component(reader)?;
        self.noise = read_component(reader)?;
        self.dmc.load_state(read_component(reader)?);
        self.vrc6 = read_component(reader)?;
        self.frame_sequencer = read_component(reader)?;

        Ok(())
    }
}
