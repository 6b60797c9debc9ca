use std::sync::Arc;

use radiosim_core::{
    FluxUnit, SpectralGrid, Spectrum, SpectrumError,
    radiometry::{planck_radiance, wien_peak},
};
use uom::si::{
    f64::{Length, ThermodynamicTemperature},
    thermodynamic_temperature::kelvin,
};

use crate::{CalibrationError, Error, SpectrumSource};

/// Analytic Planck spectral radiance at a fixed temperature.
///
/// `scale` is a dimensionless factor applied to the Planck curve: a dilution
/// factor, a grey emissivity or a lamp power adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Blackbody {
    pub temperature: ThermodynamicTemperature,
    #[cfg_attr(feature = "serde", serde(default = "unit_scale"))]
    pub scale: f64,
}

#[cfg(feature = "serde")]
fn unit_scale() -> f64 {
    1.0
}

impl Blackbody {
    #[must_use]
    pub fn new(temperature: ThermodynamicTemperature) -> Self {
        Self {
            temperature,
            scale: 1.0,
        }
    }

    #[must_use]
    pub fn with_scale(self, scale: f64) -> Self {
        Self { scale, ..self }
    }

    /// Wavelength of peak spectral radiance, `None` at absolute zero.
    #[must_use]
    pub fn peak(&self) -> Option<Length> {
        wien_peak(self.temperature)
    }
}

impl SpectrumSource for Blackbody {
    fn evaluate(&self, grid: &Arc<SpectralGrid>) -> Result<Spectrum, Error> {
        let t = CalibrationError::non_negative(
            "blackbody temperature",
            self.temperature.get::<kelvin>(),
        )?;
        if !self.scale.is_finite() || self.scale < 0.0 {
            return Err(SpectrumError::InvalidFactor(self.scale).into());
        }
        Ok(Spectrum::from_fn(
            Arc::clone(grid),
            FluxUnit::SpectralRadiance,
            |wl| self.scale * planck_radiance(wl, t),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use radiosim_core::WavelengthUnit;
    use uom::si::length::micrometer;

    use super::*;

    fn kelvins(t: f64) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<kelvin>(t)
    }

    #[test]
    fn follows_planck_law_with_scale() {
        let grid =
            Arc::new(SpectralGrid::logarithmic(0.5, 5.0, 20, WavelengthUnit::Micrometer).unwrap());
        let bb = Blackbody::new(kelvins(1000.0));
        let scaled = bb.with_scale(0.25);

        let full = bb.evaluate(&grid).unwrap();
        let quarter = scaled.evaluate(&grid).unwrap();
        assert_eq!(full.unit(), FluxUnit::SpectralRadiance);

        for (i, (&a, &b)) in full.values().iter().zip(quarter.values()).enumerate() {
            let wl = grid.wavelengths_m()[i];
            assert_relative_eq!(a, planck_radiance(wl, 1000.0), max_relative = 1e-12);
            assert_relative_eq!(b, 0.25 * a, max_relative = 1e-12);
        }

        assert_relative_eq!(
            bb.peak().unwrap().get::<micrometer>(),
            2.897_771_955,
            max_relative = 1e-9
        );
    }

    #[test]
    fn rejects_negative_scale() {
        let grid =
            Arc::new(SpectralGrid::linear(1.0, 2.0, 2, WavelengthUnit::Micrometer).unwrap());
        let err = Blackbody::new(kelvins(300.0))
            .with_scale(-1.0)
            .evaluate(&grid)
            .unwrap_err();
        assert_eq!(err, Error::InvalidSpectrum(SpectrumError::InvalidFactor(-1.0)));
    }
}
