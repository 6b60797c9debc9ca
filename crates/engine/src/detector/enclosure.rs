use ndarray::{Array1, Zip};
use radiosim_core::{SpectralGrid, radiometry::planck_photon_radiance};
use uom::si::{
    f64::{SolidAngle, ThermodynamicTemperature},
    solid_angle::steradian,
    thermodynamic_temperature::kelvin,
};

use crate::{CalibrationError, Error};

/// Warm surroundings seen directly by the detector, outside the optical
/// path: the cold-stop opening, the dewar walls, a mechanical baffle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThermalEnclosure {
    pub temperature: ThermodynamicTemperature,

    /// Projected solid angle the enclosure subtends from a pixel.
    pub solid_angle: SolidAngle,
}

impl ThermalEnclosure {
    #[must_use]
    pub fn new(temperature: ThermodynamicTemperature, solid_angle: SolidAngle) -> Self {
        Self {
            temperature,
            solid_angle,
        }
    }

    /// Photon radiance of the enclosure weighted by `qe` and integrated over
    /// the grid, in photons s⁻¹ m⁻² sr⁻¹.
    ///
    /// Multiplying by the pixel area and the solid angle gives the detected
    /// rate per pixel.
    pub(crate) fn detected_radiance(
        &self,
        grid: &SpectralGrid,
        qe: &Array1<f64>,
    ) -> Result<f64, Error> {
        let t = CalibrationError::non_negative(
            "enclosure temperature",
            self.temperature.get::<kelvin>(),
        )?;
        let weighted = Zip::from(qe)
            .and(&grid.wavelengths_m())
            .map_collect(|&qe, &wl| qe * planck_photon_radiance(wl, t));
        Ok(grid.integrate(&weighted)?)
    }

    pub(crate) fn solid_angle_sr(&self) -> Result<f64, CalibrationError> {
        CalibrationError::non_negative(
            "enclosure solid angle",
            self.solid_angle.get::<steradian>(),
        )
    }
}
