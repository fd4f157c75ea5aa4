use std::{
    error::Error,
    fmt::{Debug, Display, Formatter, Result as fmtResult},
    io::{Error as ioError, Read, Write},
};

/// Components that can dump and restore their mutable state.
pub trait Savable {
    fn save<W: Write>(&self, writer: &mut W) -> Result<(), SaveError>;
    fn load<R: Read>(&mut self, reader: &mut R) -> Result<(), SaveError>;
}

pub enum SaveError {
    /// Error with file input/output.
    IoError(ioError),

    /// The state data could not be encoded or decoded.
    SerializationError,

    /// The state data has extra bytes after all components were restored.
    ContainExtraData,
}

impl SaveError {
    fn get_message(&self) -> String {
        match self {
            Self::IoError(err) => format!("IO Error: {}", err),
            Self::SerializationError => "Could not encode/decode the state data".to_owned(),
            Self::ContainExtraData => {
                "The state data contain extra bytes at the end".to_owned()
            }
        }
    }
}

impl Error for SaveError {}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmtResult {
        write!(f, "{}", self.get_message())
    }
}

impl Debug for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmtResult {
        write!(f, "{}", self.get_message())
    }
}

impl From<ioError> for SaveError {
    fn from(from: ioError) -> Self {
        Self::IoError(from)
    }
}
