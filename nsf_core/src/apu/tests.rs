use super::channel::Channel;
use super::channels::{Dmc, NoiseWave, SquarePulse, TriangleWave};
use super::envelope::EnvelopeGenerator;
use super::frame_sequencer::FrameSequencer;
use super::mixer::Mixer;
use super::vrc6::Vrc6Pulse;
use super::Apu;
use crate::nsf_file::{ChipSet, NsfFile};
use std::{cell::RefCell, rc::Rc};

/// A loadable image whose whole 32K program space is `fill`.
fn test_file(fill: u8) -> Rc<RefCell<NsfFile>> {
    let mut data = vec![0; 0x80];
    data[..5].copy_from_slice(b"NESM\x1A");
    data[0x6] = 1; // songs
    data[0x7] = 1; // start song
    data[0x8] = 0x00; // load address 0x8000
    data[0x9] = 0x80;
    data.resize(0x80 + 0x8000, fill);

    Rc::new(RefCell::new(
        NsfFile::from_bytes(&data).expect("valid test image"),
    ))
}

#[test]
fn set_timer_high_reloads_length_counter_from_table() {
    // (register value, FrameCountLength[value >> 3])
    let cases = [(0x00, 10), (0x08, 254), (0x6B, 12), (0xFF, 30)];

    for (value, expected) in cases {
        let mut square = SquarePulse::new(true);
        square.set_timer_high(value);
        assert_eq!(square.length_counter().counter(), expected);

        let mut triangle = TriangleWave::new();
        triangle.set_timer_high(value);
        assert_eq!(triangle.length_counter().counter(), expected);

        let mut noise = NoiseWave::new();
        noise.set_length(value);
        assert_eq!(noise.length_counter().counter(), expected);
    }
}

#[test]
fn length_counter_is_not_reloaded_while_disabled() {
    let mut square = SquarePulse::new(true);
    square.set_enabled(false);
    square.set_timer_high(0x08);

    assert_eq!(square.length_counter().counter(), 0);
}

fn count_frame_events(sequencer: &mut FrameSequencer, cpu_clocks: u32) -> (u32, u32) {
    let mut quarters = 0;
    let mut halves = 0;

    for _ in 0..cpu_clocks {
        let (quarter, half) = sequencer.clock(1);
        quarters += quarter as u32;
        halves += half as u32;
    }

    (quarters, halves)
}

#[test]
fn four_step_sequence_emits_4_quarter_and_2_half_events() {
    let mut sequencer = FrameSequencer::new();
    sequencer.set_mode(false);

    // one full 4-step cycle wraps just past the 4th threshold
    let (quarters, halves) = count_frame_events(&mut sequencer, 29830);
    assert_eq!(quarters, 4);
    assert_eq!(halves, 2);

    // and the next cycle repeats the same pattern
    let (quarters, halves) = count_frame_events(&mut sequencer, 29830);
    assert_eq!(quarters, 4);
    assert_eq!(halves, 2);
}

#[test]
fn five_step_sequence_emits_4_quarter_and_2_half_events() {
    let mut sequencer = FrameSequencer::new();
    sequencer.set_mode(true);

    let (quarters, halves) = count_frame_events(&mut sequencer, 37282);
    assert_eq!(quarters, 4);
    assert_eq!(halves, 2);
}

#[test]
fn five_step_sequence_has_one_silent_step() {
    let mut sequencer = FrameSequencer::new();
    sequencer.set_mode(true);

    // five thresholds are crossed per cycle but only four of them clock
    // anything, the extra step is silent
    let mut step_events = Vec::new();
    for _ in 0..37282 {
        let (quarter, half) = sequencer.clock(1);
        if quarter || half {
            step_events.push((quarter, half));
        }
    }

    assert_eq!(
        step_events,
        [
            (true, true),  // step 1
            (true, false), // step 2
            (true, true),  // step 3
            (true, false), // wrap to step 0, step 4 emitted nothing
        ]
    );
}

#[test]
fn pulse_amplitude_matches_duty_and_volume_after_8_clocks() {
    let mut square = SquarePulse::new(true);

    // duty 1, constant volume 8, period 0x054 = one duty step per 170 clocks
    square.set_control(0x58);
    square.set_timer_low(0x54);
    square.set_timer_high(0x00);

    // 8 clocks in, before any frame-sequencer event, the sequence sits on
    // step 1 of duty sequence 1 -> volume * 1
    square.clock(8);
    assert_eq!(square.amplitude(), 8);

    // step 2 is also high, step 3 is low
    square.clock(170);
    assert_eq!(square.amplitude(), 8);
    square.clock(170);
    assert_eq!(square.amplitude(), 0);
}

#[test]
fn pulse_below_minimum_period_is_silent_and_frozen() {
    let mut square = SquarePulse::new(true);

    square.set_control(0x58);
    square.set_timer_low(0x07); // period 7 < minimum of 8
    square.set_timer_high(0x00);

    square.clock(1000);
    assert_eq!(square.amplitude(), 0);
}

#[test]
fn sweep_overflow_mutes_the_pulse() {
    let mut square = SquarePulse::new(true);

    square.set_control(0x58);
    square.set_timer_low(0xFF); // period 0x7FF
    square.set_timer_high(0x07);
    square.set_sweep_data(0x81); // enabled, increasing, shift 1

    square.clock(1);
    assert_eq!(square.amplitude(), 8);

    // the sweep pushes the period to 0x7FF + 0x3FF = 3070, from where the
    // next shift-and-add would leave the 12-bit range
    square.half_frame_clock();
    assert_eq!(square.amplitude(), 0);
}

#[test]
fn envelope_constant_volume_applies_immediately() {
    let mut envelope = EnvelopeGenerator::new();
    envelope.set_control(0x18);

    assert_eq!(envelope.volume(), 8);
}

#[test]
fn envelope_decays_and_loops() {
    let mut envelope = EnvelopeGenerator::new();
    // envelope mode, rate 0, looping (bit 4 clear)
    envelope.set_control(0x00);
    envelope.set_start_flag();

    envelope.clock();
    assert_eq!(envelope.volume(), 15);

    for expected in (0..15).rev() {
        envelope.clock();
        assert_eq!(envelope.volume(), expected);
    }

    // bottomed out, the loop reloads it
    envelope.clock();
    assert_eq!(envelope.volume(), 15);
}

#[test]
fn triangle_advances_only_with_both_counters_live() {
    let mut triangle = TriangleWave::new();

    triangle.set_timer_low(0x10); // period 16
    triangle.set_timer_high(0x00); // length counter loaded, reload flag set

    // linear counter still zero, the staircase must hold at step 0
    triangle.clock(100);
    assert_eq!(triangle.amplitude(), 0);

    // load the linear counter and let it run
    triangle.set_linear_counter(0x7F);
    triangle.quarter_frame_clock();

    triangle.clock(17);
    assert_eq!(triangle.amplitude(), 1);
    triangle.clock(17);
    assert_eq!(triangle.amplitude(), 2);
}

#[test]
fn noise_output_is_volume_or_silence() {
    let mut noise = NoiseWave::new();

    noise.set_control(0x18); // constant volume 8
    noise.set_timer_and_mode(0x00); // shortest period
    noise.set_length(0x08); // length 254

    let mut seen_high = false;
    let mut seen_low = false;

    for _ in 0..200 {
        noise.clock(4);
        let amplitude = noise.amplitude();
        assert!(amplitude == 0 || amplitude == 8);

        seen_high |= amplitude == 8;
        seen_low |= amplitude == 0;
    }

    assert!(seen_high && seen_low);
}

#[test]
fn dmc_address_wraps_and_level_clamps_high() {
    let file = test_file(0xFF);
    let mut dmc = Dmc::new(file);

    dmc.set_flags_and_rate(0x4F); // looping, fastest rate (54 clocks)
    dmc.set_sample_address(0xFF); // 0xFFC0
    dmc.set_sample_length(0x10); // 257 bytes, crosses 0xFFFF
    dmc.set_enabled(true);

    let mut wrapped = false;
    for _ in 0..0x80 * 8 {
        dmc.clock(54);
        wrapped |= dmc.current_address() < 0x9000;
        assert!(dmc.delta_counter() <= 0x3F);
    }

    // all-ones sample data pushes the level to the top and keeps it there
    assert!(wrapped);
    assert_eq!(dmc.delta_counter(), 0x3F);
    assert!(dmc.amplitude() <= 127);
}

#[test]
fn dmc_level_clamps_low() {
    let file = test_file(0x00);
    let mut dmc = Dmc::new(file);

    dmc.set_flags_and_rate(0x4F);
    dmc.set_sample_address(0x00);
    dmc.set_sample_length(0x04);
    dmc.set_direct_load(0x00);
    dmc.set_enabled(true);

    for _ in 0..500 {
        dmc.clock(54);
        assert_eq!(dmc.delta_counter(), 0);
    }
}

#[test]
fn vrc6_pulse_disable_clears_the_latched_volume() {
    let mut pulse = Vrc6Pulse::new();

    pulse.set_control(0x7F); // widest duty, volume 15
    pulse.set_timer_low(0x20);
    pulse.set_timer_high(0x80); // enable

    pulse.clock(0x21);
    assert_eq!(pulse.amplitude(), 15);

    pulse.set_timer_high(0x00); // disable also zeroes the volume
    assert_eq!(pulse.amplitude(), 0);

    pulse.set_timer_high(0x80);
    assert_eq!(pulse.amplitude(), 0);
}

#[test]
fn expansion_registers_are_inert_without_the_chip() {
    let file = test_file(0);

    // all-ones duty, volume 15, period 0x20, enabled
    let mut apu = Apu::new(file.clone(), ChipSet::empty());
    apu.write_expansion_register(0x9000, 0x8F);
    apu.write_expansion_register(0x9001, 0x20);
    apu.write_expansion_register(0x9002, 0x80);
    apu.clock(1000);
    assert_eq!(apu.sample(), 0.);

    let mut apu = Apu::new(file, ChipSet::VRC6);
    apu.write_expansion_register(0x9000, 0x8F);
    apu.write_expansion_register(0x9001, 0x20);
    apu.write_expansion_register(0x9002, 0x80);
    apu.clock(1000);
    assert!(apu.sample() > 0.);
}

#[test]
fn expansion_attenuation_is_the_product_of_declared_chips() {
    let mixer = Mixer::new(ChipSet::VRC6 | ChipSet::VRC7);
    let expected: f32 = 0.8 * 0.64 * 0.00852 * 61.;

    let sample = mixer.mix(0, 0, 0, 0, 0, 61);
    assert!((sample - expected).abs() < 1e-6);
}

#[test]
fn mixer_weights_the_channel_groups() {
    let mixer = Mixer::new(ChipSet::empty());

    let sample = mixer.mix(8, 8, 15, 0, 0, 0);
    let expected: f32 = 0.00752 * 16. + 0.00851 * 15.;
    assert!((sample - expected).abs() < 1e-6);
}
