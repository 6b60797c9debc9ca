use thiserror::Error;

use crate::grid::GridError;

use super::FluxUnit;

/// Errors raised when a spectrum would hold invalid flux.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectrumError {
    /// A flux value is negative or not finite.
    #[error("flux value at channel {index} is invalid: {value}")]
    InvalidValue { index: usize, value: f64 },

    /// A scale factor is negative or not finite.
    #[error("scale factor must be finite and non-negative, got {0}")]
    InvalidFactor(f64),

    /// Two spectra combined with incompatible units.
    #[error("flux units differ: {expected:?} vs {found:?}")]
    UnitMismatch { expected: FluxUnit, found: FluxUnit },

    /// A sum of spectra was requested over no spectra at all.
    #[error("cannot sum an empty set of spectra")]
    NoComponents,

    /// Two spectra combined on different grids.
    #[error("spectra are sampled on different grids")]
    GridMismatch,

    /// The values do not fit the grid, or resampling failed.
    #[error(transparent)]
    Grid(#[from] GridError),
}
