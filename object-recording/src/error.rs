use thiserror::Error;

/// A configuration that no session can be built from.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    #[error("{0} must be at least 1")]
    ZeroDivisions(&'static str),
    #[error("standoff distance must be a positive finite length, got {0}")]
    InvalidStandoffDistance(f64),
    #[error("{name} must be a non-negative number, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

/// The color image of a frame could not be brought into the canonical pixel
/// format. The frame is dropped; the session continues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageDecodeError {
    #[error("unsupported image encoding {0:?}")]
    UnsupportedEncoding(String),
    #[error("row stride of {step} bytes is smaller than a row of {row_bytes} bytes")]
    InvalidStep { step: u32, row_bytes: usize },
    #[error("image of {width} x {height} pixels with a {step} byte stride is too large to address")]
    Oversized { width: u32, height: u32, step: u32 },
    #[error("image buffer holds {actual} bytes but {expected} are required")]
    Truncated { expected: usize, actual: usize },
}

/// The external dataset writer failed.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("nothing to save: no recording session has been started")]
    NoSession,
    #[error("dataset writer failed: {0}")]
    Writer(String),
}
