//! Radiometric simulation of a 1D spectrograph.
//!
//! The engine follows the flux from a source through an ordered train of
//! optical elements onto a detector and reports signal, background, noise
//! and SNR per spectral channel:
//!
//! - [`source`]: input spectra ([`Source`], [`SpectrumSource`]), including
//!   lamp-fed integrating spheres
//! - [`optics`]: transmissive, reflective and emissive elements and their
//!   composition into an [`OpticalTrain`](optics::OpticalTrain), plus
//!   builders for dusty instrument parts and airmass-dependent sky
//!   transmission
//! - [`detector`]: conversion of flux into counts per pixel
//! - [`noise`]: shot, dark and read noise combined in quadrature
//! - [`simulator`]: the end-to-end pipeline, its lifecycle and parallel
//!   sweeps
//!
//! All computation is deterministic and synchronous. The engine logs through
//! the [`log`] facade and never prints.

pub mod detector;
mod error;
pub mod noise;
pub mod optics;
pub mod simulator;
pub mod source;

pub use error::{CalibrationError, Error, ErrorKind};
pub use noise::{NoiseInputError, NoiseModel};
pub use source::{Source, SpectrumSource};
