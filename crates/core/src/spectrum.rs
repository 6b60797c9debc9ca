//! Flux sampled on a spectral grid.

mod error;
mod unit;

pub use error::SpectrumError;
pub use unit::FluxUnit;

use std::sync::Arc;

use ndarray::{Array1, Zip};

use crate::{
    grid::{Extrapolate, SpectralGrid},
    radiometry::photon_energy,
};

/// Flux values paired with the grid they are sampled on.
///
/// # Invariants
///
/// - `values.len() == grid.len()`.
/// - Every value is finite and non-negative.
///
/// Transformations return new spectra sharing the same grid; the grid itself
/// is never modified.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Spectrum {
    grid: Arc<SpectralGrid>,
    values: Array1<f64>,
    unit: FluxUnit,
}

impl Spectrum {
    /// Creates a spectrum from values sampled on `grid`.
    ///
    /// # Errors
    ///
    /// Returns a [`SpectrumError`] if the length does not match the grid or a
    /// value is negative or not finite.
    pub fn new(
        grid: Arc<SpectralGrid>,
        values: impl Into<Array1<f64>>,
        unit: FluxUnit,
    ) -> Result<Self, SpectrumError> {
        let values = values.into();
        grid.check_len(&values)?;
        check_values(&values)?;
        Ok(Self { grid, values, unit })
    }

    /// A spectrum of zero flux.
    #[must_use]
    pub fn zeros(grid: Arc<SpectralGrid>, unit: FluxUnit) -> Self {
        let values = Array1::zeros(grid.len());
        Self { grid, values, unit }
    }

    /// Evaluates `f` at every wavelength of `grid`, in metres.
    ///
    /// # Errors
    ///
    /// Returns a [`SpectrumError`] if `f` yields a negative or non-finite value.
    pub fn from_fn(
        grid: Arc<SpectralGrid>,
        unit: FluxUnit,
        f: impl Fn(f64) -> f64,
    ) -> Result<Self, SpectrumError> {
        let values = grid.wavelengths_m().mapv(f);
        Self::new(grid, values, unit)
    }

    #[must_use]
    pub fn grid(&self) -> &Arc<SpectralGrid> {
        &self.grid
    }

    #[must_use]
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    #[must_use]
    pub fn unit(&self) -> FluxUnit {
        self.unit
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn into_values(self) -> Array1<f64> {
        self.values
    }

    /// Multiplies every value by a constant factor.
    ///
    /// # Errors
    ///
    /// Returns [`SpectrumError::InvalidFactor`] if `factor` is negative or
    /// not finite.
    pub fn scaled(&self, factor: f64) -> Result<Self, SpectrumError> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(SpectrumError::InvalidFactor(factor));
        }
        Ok(self.with_values(&self.values * factor))
    }

    /// Multiplies each channel by the matching transfer value.
    ///
    /// # Errors
    ///
    /// Returns a [`SpectrumError`] if `transfer` does not match the grid or
    /// holds a negative or non-finite value.
    pub fn attenuated(&self, transfer: &Array1<f64>) -> Result<Self, SpectrumError> {
        self.grid.check_len(transfer)?;
        check_values(transfer)?;
        Ok(self.with_values(&self.values * transfer))
    }

    /// Adds another spectrum channel by channel.
    ///
    /// # Errors
    ///
    /// Returns a [`SpectrumError`] if the spectra differ in unit or grid.
    pub fn plus(&self, other: &Spectrum) -> Result<Self, SpectrumError> {
        if self.unit != other.unit {
            return Err(SpectrumError::UnitMismatch {
                expected: self.unit,
                found: other.unit,
            });
        }
        if !self.shares_grid(other) {
            return Err(SpectrumError::GridMismatch);
        }
        Ok(self.with_values(&self.values + &other.values))
    }

    /// Whether both spectra are sampled on the same wavelengths.
    #[must_use]
    pub fn shares_grid(&self, other: &Spectrum) -> bool {
        Arc::ptr_eq(&self.grid, &other.grid) || self.grid == other.grid
    }

    /// Converts energy flux to photon flux; photon spectra are returned as is.
    #[must_use]
    pub fn to_photons(&self) -> Self {
        if self.unit.is_photon() {
            return self.clone();
        }
        let mut values = self.values.clone();
        Zip::from(&mut values)
            .and(&self.grid.wavelengths_m())
            .for_each(|v, &wl| *v /= photon_energy(wl));
        Self {
            grid: Arc::clone(&self.grid),
            values,
            unit: self.unit.photon(),
        }
    }

    /// Converts photon flux to energy flux; energy spectra are returned as is.
    #[must_use]
    pub fn to_energy(&self) -> Self {
        if !self.unit.is_photon() {
            return self.clone();
        }
        let mut values = self.values.clone();
        Zip::from(&mut values)
            .and(&self.grid.wavelengths_m())
            .for_each(|v, &wl| *v *= photon_energy(wl));
        Self {
            grid: Arc::clone(&self.grid),
            values,
            unit: self.unit.energy(),
        }
    }

    /// Resamples onto another grid using this spectrum's grid as the source.
    ///
    /// # Errors
    ///
    /// Returns a [`SpectrumError`] if resampling fails under the gap policy
    /// or the policy fills with an invalid value.
    pub fn resampled(
        &self,
        target: Arc<SpectralGrid>,
        extrapolate: Extrapolate,
    ) -> Result<Self, SpectrumError> {
        let values = target.resample(&self.values, &self.grid, extrapolate)?;
        Self::new(target, values, self.unit)
    }

    /// Flux integrated over wavelength (trapezoidal rule, metres).
    #[must_use]
    pub fn integrated(&self) -> f64 {
        self.grid.trapezoid(&self.values)
    }

    fn with_values(&self, values: Array1<f64>) -> Self {
        Self {
            grid: Arc::clone(&self.grid),
            values,
            unit: self.unit,
        }
    }
}

fn check_values(values: &Array1<f64>) -> Result<(), SpectrumError> {
    match values
        .iter()
        .enumerate()
        .find(|&(_, v)| !v.is_finite() || *v < 0.0)
    {
        Some((index, &value)) => Err(SpectrumError::InvalidValue { index, value }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use crate::grid::WavelengthUnit;

    use super::*;

    fn grid() -> Arc<SpectralGrid> {
        Arc::new(
            SpectralGrid::new(array![500.0, 1000.0, 2000.0], WavelengthUnit::Nanometer).unwrap(),
        )
    }

    #[test]
    fn rejects_invalid_flux() {
        let grid = grid();
        assert_eq!(
            Spectrum::new(Arc::clone(&grid), array![1.0, -2.0, 3.0], FluxUnit::SpectralRadiance),
            Err(SpectrumError::InvalidValue {
                index: 1,
                value: -2.0
            })
        );
        assert!(matches!(
            Spectrum::new(Arc::clone(&grid), array![1.0, 2.0], FluxUnit::SpectralRadiance),
            Err(SpectrumError::Grid(_))
        ));
        assert!(
            Spectrum::new(grid, array![1.0, f64::INFINITY, 3.0], FluxUnit::SpectralRadiance)
                .is_err()
        );
    }

    #[test]
    fn transformations_leave_the_original_untouched() {
        let grid = grid();
        let spectrum = Spectrum::new(
            Arc::clone(&grid),
            array![1.0, 2.0, 3.0],
            FluxUnit::SpectralIrradiance,
        )
        .unwrap();

        let scaled = spectrum.scaled(2.0).unwrap();
        let attenuated = spectrum.attenuated(&array![0.5, 0.5, 0.0]).unwrap();
        let sum = spectrum.plus(&scaled).unwrap();

        assert_eq!(spectrum.values(), &array![1.0, 2.0, 3.0]);
        assert_eq!(scaled.values(), &array![2.0, 4.0, 6.0]);
        assert_eq!(attenuated.values(), &array![0.5, 1.0, 0.0]);
        assert_eq!(sum.values(), &array![3.0, 6.0, 9.0]);
        assert!(Arc::ptr_eq(sum.grid(), &grid));

        assert_eq!(spectrum.scaled(-1.0), Err(SpectrumError::InvalidFactor(-1.0)));
    }

    #[test]
    fn plus_requires_matching_units() {
        let grid = grid();
        let a = Spectrum::zeros(Arc::clone(&grid), FluxUnit::SpectralRadiance);
        let b = Spectrum::zeros(grid, FluxUnit::PhotonRadiance);
        assert!(matches!(a.plus(&b), Err(SpectrumError::UnitMismatch { .. })));
    }

    #[test]
    fn photon_conversion_round_trips() {
        let spectrum =
            Spectrum::new(grid(), array![1.0, 1.0, 1.0], FluxUnit::SpectralRadiance).unwrap();
        let photons = spectrum.to_photons();
        assert_eq!(photons.unit(), FluxUnit::PhotonRadiance);

        // Longer wavelengths carry more photons per joule.
        assert_relative_eq!(photons.values()[2] / photons.values()[0], 4.0, max_relative = 1e-12);
        assert_relative_eq!(photons.values()[0], 500e-9 / (PLANCK_C), max_relative = 1e-12);

        let energy = photons.to_energy();
        for (a, b) in energy.values().iter().zip(spectrum.values()) {
            assert_relative_eq!(a, b, max_relative = 1e-12);
        }
    }

    const PLANCK_C: f64 = crate::radiometry::PLANCK * crate::radiometry::SPEED_OF_LIGHT;

    #[test]
    fn integrates_over_wavelength() {
        let spectrum =
            Spectrum::new(grid(), array![2.0, 2.0, 2.0], FluxUnit::SpectralIrradiance).unwrap();
        assert_relative_eq!(spectrum.integrated(), 3e-6, max_relative = 1e-12);
    }
}
