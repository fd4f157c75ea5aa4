use crate::nsf_file::ChipSet;

// linear approximation of the APU mixer network
// http://wiki.nesdev.com/w/index.php/APU_Mixer
const PULSE_WEIGHT: f32 = 0.00752;
const TRIANGLE_WEIGHT: f32 = 0.00851;
const NOISE_WEIGHT: f32 = 0.00494;
const DMC_WEIGHT: f32 = 0.00335;
const VRC6_WEIGHT: f32 = 0.00852;

/// Combines the channel amplitudes into one normalized sample. Holds no
/// state besides the expansion attenuation derived from the loaded image.
pub(crate) struct Mixer {
    expansion_attenuation: f32,
}

impl Mixer {
    /// Every chip the image declares scales the expansion contribution
    /// down by a fixed factor.
    pub(crate) fn new(chips: ChipSet) -> Self {
        let mut attenuation = 1.0;

        if chips.contains(ChipSet::VRC6) {
            attenuation *= 0.8;
        }
        if chips.contains(ChipSet::VRC7) {
            attenuation *= 0.64;
        }
        if chips.contains(ChipSet::MMC5) {
            attenuation *= 0.83;
        }
        if chips.contains(ChipSet::FDS) {
            attenuation *= 0.9;
        }
        if chips.contains(ChipSet::NAMCO_163) {
            attenuation *= 0.7;
        }
        if chips.contains(ChipSet::SUNSOFT_5B) {
            attenuation *= 0.5;
        }

        Self {
            expansion_attenuation: attenuation,
        }
    }

    pub(crate) fn mix(
        &self,
        pulse_1: u8,
        pulse_2: u8,
        triangle: u8,
        noise: u8,
        dmc: u8,
        expansion: u8,
    ) -> f32 {
        let pulse_out = PULSE_WEIGHT * (pulse_1 + pulse_2) as f32;
        let tnd_out = TRIANGLE_WEIGHT * triangle as f32
            + NOISE_WEIGHT * noise as f32
            + DMC_WEIGHT * dmc as f32;

        pulse_out + tnd_out + self.expansion_attenuation * VRC6_WEIGHT * expansion as f32
    }
}
