#[macro_use]
mod common;
mod apu;
mod cpu6502;
mod nsf_file;

#[cfg(test)]
mod tests;

pub mod nsf;

pub use cpu6502::CpuError;
pub use nsf::{DEFAULT_SAMPLE_RATE, NSF};
pub use nsf_file::{ChipSet, NsfError, NsfFile};
