use ninterp::error::{InterpolateError, ValidateError};
use thiserror::Error;

/// Errors raised while building spectral grids or resampling onto them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// The grid (or a source grid used for resampling) has too few samples.
    #[error("grid needs at least {required} samples, got {found}")]
    TooFewSamples { required: usize, found: usize },

    /// A sample is not finite or not strictly positive.
    #[error("wavelength sample {index} is invalid: {value}")]
    InvalidSample { index: usize, value: f64 },

    /// Samples are not strictly increasing.
    #[error("wavelength samples must be strictly increasing (index {index})")]
    NotIncreasing { index: usize },

    /// A value array does not match the grid it claims to be sampled on.
    #[error("expected {expected} values for the grid, got {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// A point fell outside the source domain while the gap policy was `Error`.
    #[error("wavelength {wavelength} lies outside [{lower}, {upper}]")]
    OutOfDomain {
        wavelength: f64,
        lower: f64,
        upper: f64,
    },

    /// The interpolation backend rejected the data.
    #[error("interpolation failed: {0}")]
    Interpolation(String),
}

impl From<ValidateError> for GridError {
    fn from(err: ValidateError) -> Self {
        Self::Interpolation(err.to_string())
    }
}

impl From<InterpolateError> for GridError {
    fn from(err: InterpolateError) -> Self {
        Self::Interpolation(err.to_string())
    }
}
