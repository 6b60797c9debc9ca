//! Core spectral types for RadioSim.
//!
//! This crate defines the shared building blocks the simulation engine is
//! assembled from:
//!
//! - [`SpectralGrid`]: canonical wavelength sampling with an interpolation
//!   policy, onto which every curve is resampled
//! - [`Extrapolate`]: explicit gap policy for out-of-domain lookups
//! - [`Curve`]: wavelength-dependent scalar curves (efficiency, QE, ...)
//! - [`Spectrum`]: flux values on a grid, tagged with a [`FluxUnit`]
//! - [`radiometry`]: physical constants and the Planck law
//! - [`Observer`]: receives events emitted while a simulation runs

pub mod curve;
pub mod grid;
mod observer;
pub mod radiometry;
pub mod spectrum;

pub use curve::{Curve, CurveError, SampledCurve};
pub use grid::{Extrapolate, GridError, Interpolation, SpectralGrid, WavelengthUnit};
pub use observer::Observer;
pub use spectrum::{FluxUnit, Spectrum, SpectrumError};
