use std::{
    error::Error,
    fmt::{Debug, Display, Formatter, Result as fmtResult},
    io::Error as ioError,
};

/// Error happening when loading an NSF image.
pub enum NsfError {
    /// Error with file input/output.
    /// Contains an [`io::Error`][ioError] which provides more details about the error.
    FileError(ioError),

    /// The 5-byte `NESM $1A` signature is missing.
    InvalidMagic,

    /// The data ends before the fixed 0x80-byte header.
    TruncatedHeader,
}

impl NsfError {
    fn get_message(&self) -> String {
        match self {
            Self::FileError(err) => format!("FileError: {}", err),
            Self::InvalidMagic => "This is not a valid NSF file".to_owned(),
            Self::TruncatedHeader => {
                "The file ends before the fixed 128-byte NSF header".to_owned()
            }
        }
    }
}

impl Error for NsfError {}

impl Display for NsfError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmtResult {
        write!(f, "{}", self.get_message())
    }
}

impl Debug for NsfError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmtResult {
        write!(f, "{}", self.get_message())
    }
}

impl From<ioError> for NsfError {
    fn from(from: ioError) -> Self {
        Self::FileError(from)
    }
}
