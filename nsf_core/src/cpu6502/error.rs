use std::{
    error::Error,
    fmt::{Debug, Display, Formatter, Result as fmtResult},
};

/// Fatal error from the instruction processor.
pub enum CpuError {
    /// The fetched opcode is outside the reproduced instruction set.
    /// Contains the opcode byte and the address it was fetched from.
    UnsupportedInstruction { opcode: u8, pc: u16 },
}

impl CpuError {
    fn get_message(&self) -> String {
        match self {
            Self::UnsupportedInstruction { opcode, pc } => {
                format!("Unsupported instruction {:02X} at {:04X}", opcode, pc)
            }
        }
    }
}

impl Error for CpuError {}

impl Display for CpuError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmtResult {
        write!(f, "{}", self.get_message())
    }
}

impl Debug for CpuError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmtResult {
        write!(f, "{}", self.get_message())
    }
}
