use ndarray::Array1;
use radiosim_core::{Curve, Extrapolate, SpectralGrid};
use uom::si::{f64::Length, length::meter};

use crate::{CalibrationError, Error};

/// Maps spectral channels onto detector pixels.
///
/// Each variant yields the wavelength interval seen by one pixel, which may
/// vary across the band.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Dispersion {
    /// A grating of resolving power `R = λ/Δλ`, with each resolution element
    /// sampled by `pixels_per_element` pixels: `Δλ_px = λ / (R·p)`.
    ResolvingPower {
        resolving_power: f64,
        pixels_per_element: f64,
    },

    /// The same bandwidth for every pixel.
    Constant(Length),

    /// Bandwidth per pixel in metres, tabulated against wavelength. Values
    /// outside the table hold the nearest edge.
    Tabulated(Curve),
}

impl Dispersion {
    /// Wavelength interval in metres covered by one pixel at each channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Calibration`] if a parameter or tabulated value is
    /// not strictly positive.
    pub fn pixel_bandwidth(&self, grid: &SpectralGrid) -> Result<Array1<f64>, Error> {
        let bandwidth = match self {
            Self::ResolvingPower {
                resolving_power,
                pixels_per_element,
            } => {
                let r = CalibrationError::positive("resolving power", *resolving_power)?;
                let p = CalibrationError::positive(
                    "pixels per resolution element",
                    *pixels_per_element,
                )?;
                grid.wavelengths_m() / (r * p)
            }
            Self::Constant(width) => {
                let width = CalibrationError::positive("pixel bandwidth", width.get::<meter>())?;
                Array1::from_elem(grid.len(), width)
            }
            Self::Tabulated(curve) => curve.sample(grid, Extrapolate::Clamp)?,
        };

        for &value in &bandwidth {
            CalibrationError::positive("pixel bandwidth", value)?;
        }
        Ok(bandwidth)
    }
}
