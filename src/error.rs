//! Errors that abort the enclosing operation.
//!
//! Geometric misses (a LOR that does not correspond to any bin) are *not*
//! errors: they are reported as `None` by `ProjDataInfo::get_bin`.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Invalid scanner, segment or image parameters supplied at construction.
    Configuration { what: String },
    /// A derived ratio would divide by zero.
    DivisionByZero { what: &'static str },
    /// Two per-plane collections which must be indexed identically are not.
    RangeMismatch { what: &'static str, left: (i32, i32), right: (i32, i32) },
    /// An index outside the configured range was used to access data.
    OutOfRange { what: &'static str, index: i32, min: i32, max: i32 },
    Io(std::io::Error),
    Toml(toml::de::Error),
}

impl Error {
    pub(crate) fn config(what: impl Into<String>) -> Self { Self::Configuration { what: what.into() } }

    /// Whether this error reports invalid parameters, including malformed
    /// configuration files.
    pub fn is_configuration(&self) -> bool { matches!(self, Self::Configuration { .. } | Self::Toml(_)) }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { what } => write!(f, "configuration error: {what}"),
            Self::DivisionByZero { what } => write!(f, "division by zero when computing {what}"),
            Self::RangeMismatch { what, left, right } =>
                write!(f, "{what}: index ranges differ: [{}, {}] vs [{}, {}]",
                       left.0, left.1, right.0, right.1),
            Self::OutOfRange { what, index, min, max } =>
                write!(f, "{what} {index} out of range [{min}, {max}]"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self { Self::Io(e) }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self { Self::Toml(e) }
}

/// Return early with a `Configuration` error unless `condition` holds.
macro_rules! ensure_config {
    ($condition:expr, $($arg:tt)+) => {
        if !$condition { return Err($crate::Error::config(format!($($arg)+))) }
    };
}
pub(crate) use ensure_config;
