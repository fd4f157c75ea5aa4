mod dmc;
mod noise;
mod square;
mod triangle;

pub(crate) use dmc::Dmc;
pub(crate) use noise::NoiseWave;
pub(crate) use square::SquarePulse;
pub(crate) use triangle::TriangleWave;
