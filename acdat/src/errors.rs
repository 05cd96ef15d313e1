//! Definition of errors.

use std::error::Error;
use std::fmt;

pub type Result<T, E = AcdatError> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum AcdatError {
    InvalidArgument(InvalidArgumentError),
    CastError(std::num::TryFromIntError),
    IOError(std::io::Error),
}

impl AcdatError {
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }
}

impl fmt::Display for AcdatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidArgument(e) => e.fmt(f),
            Self::CastError(e) => e.fmt(f),
            Self::IOError(e) => e.fmt(f),
        }
    }
}

impl Error for AcdatError {}

/// Error used when the argument is invalid.
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// Name of the argument.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

impl From<std::num::TryFromIntError> for AcdatError {
    fn from(error: std::num::TryFromIntError) -> Self {
        Self::CastError(error)
    }
}

impl From<std::io::Error> for AcdatError {
    fn from(error: std::io::Error) -> Self {
        Self::IOError(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let e = AcdatError::invalid_argument("pattern", "must not be empty");
        assert_eq!(
            "InvalidArgumentError: pattern: must not be empty",
            e.to_string()
        );
    }

    #[test]
    fn test_cast_error_from() {
        let e: AcdatError = u32::try_from(u64::MAX).unwrap_err().into();
        assert!(matches!(e, AcdatError::CastError(_)));
    }

    #[test]
    fn test_io_error_from() {
        let e: AcdatError = std::io::Error::new(std::io::ErrorKind::NotFound, "dict").into();
        assert!(matches!(e, AcdatError::IOError(_)));
        assert_eq!("dict", e.to_string());
    }
}
