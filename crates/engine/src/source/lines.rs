use std::{f64::consts::PI, sync::Arc};

use ndarray::{Array1, Zip};
use radiosim_core::{
    FluxUnit, SpectralGrid, Spectrum, SpectrumError,
    radiometry::{BOLTZMANN, PROTON_MASS, SPEED_OF_LIGHT},
};
use uom::si::{
    f64::{Length, ThermodynamicTemperature},
    length::meter,
    thermodynamic_temperature::kelvin,
};

use crate::{CalibrationError, Error, SpectrumSource};

/// Lines further than this many standard deviations from the grid are
/// skipped.
const LINE_CUTOFF_SIGMAS: f64 = 6.0;

/// Whether a line adds flux to the continuum or removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LineKind {
    #[default]
    Emission,
    Absorption,
}

/// A single spectral line.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpectralLine {
    /// Rest wavelength of the line centre.
    pub wavelength: Length,

    /// Integrated flux of the line, in the source unit times metres.
    pub strength: f64,

    /// Mass of the emitting species in proton masses; sets the thermal
    /// Doppler width.
    #[cfg_attr(feature = "serde", serde(default = "hydrogen"))]
    pub mass: f64,

    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: LineKind,
}

#[cfg(feature = "serde")]
fn hydrogen() -> f64 {
    1.0
}

impl SpectralLine {
    #[must_use]
    pub fn emission(wavelength: Length, strength: f64) -> Self {
        Self {
            wavelength,
            strength,
            mass: 1.0,
            kind: LineKind::Emission,
        }
    }

    #[must_use]
    pub fn absorption(wavelength: Length, strength: f64) -> Self {
        Self {
            kind: LineKind::Absorption,
            ..Self::emission(wavelength, strength)
        }
    }

    #[must_use]
    pub fn with_mass(self, mass: f64) -> Self {
        Self { mass, ..self }
    }
}

/// A line list over a flat continuum, e.g. an arc lamp.
///
/// Each line is a normalized Gaussian whose width is the quadrature sum of
/// the instrument line-spread function, the thermal Doppler width of the
/// species and the local channel width of the grid. The last term keeps
/// lines narrower than a channel from falling between samples.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSource {
    /// Continuum level, in `unit`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub continuum: f64,

    pub unit: FluxUnit,

    pub lines: Vec<SpectralLine>,

    /// Full width at half maximum of the instrument line-spread function.
    pub line_spread: Length,

    /// Kinetic temperature of the emitting gas.
    pub kinetic_temperature: ThermodynamicTemperature,
}

impl LineSource {
    /// An empty line list with no continuum, no instrumental broadening and
    /// cold gas.
    #[must_use]
    pub fn new(unit: FluxUnit) -> Self {
        Self {
            continuum: 0.0,
            unit,
            lines: Vec::new(),
            line_spread: Length::new::<meter>(0.0),
            kinetic_temperature: ThermodynamicTemperature::new::<kelvin>(0.0),
        }
    }

    #[must_use]
    pub fn with_continuum(self, continuum: f64) -> Self {
        Self { continuum, ..self }
    }

    #[must_use]
    pub fn with_line_spread(self, fwhm: Length) -> Self {
        Self {
            line_spread: fwhm,
            ..self
        }
    }

    #[must_use]
    pub fn with_kinetic_temperature(self, temperature: ThermodynamicTemperature) -> Self {
        Self {
            kinetic_temperature: temperature,
            ..self
        }
    }

    #[must_use]
    pub fn with_line(mut self, line: SpectralLine) -> Self {
        self.lines.push(line);
        self
    }
}

impl SpectrumSource for LineSource {
    fn evaluate(&self, grid: &Arc<SpectralGrid>) -> Result<Spectrum, Error> {
        if !self.continuum.is_finite() || self.continuum < 0.0 {
            return Err(SpectrumError::InvalidValue {
                index: 0,
                value: self.continuum,
            }
            .into());
        }
        let fwhm = CalibrationError::non_negative(
            "line-spread FWHM",
            self.line_spread.get::<meter>(),
        )?;
        let temperature = CalibrationError::non_negative(
            "kinetic temperature",
            self.kinetic_temperature.get::<kelvin>(),
        )?;
        let lsf_sigma = fwhm / (2.0 * (2.0 * 2.0_f64.ln()).sqrt());

        let wl = grid.wavelengths_m();
        let widths = grid.channel_widths_m();
        let (lower, upper) = (wl[0], wl[wl.len() - 1]);
        let mut values = Array1::from_elem(wl.len(), self.continuum);

        for (index, line) in self.lines.iter().enumerate() {
            let center =
                CalibrationError::positive("line wavelength", line.wavelength.get::<meter>())?;
            let mass = CalibrationError::positive("line species mass", line.mass)?;
            if !line.strength.is_finite() || line.strength < 0.0 {
                return Err(SpectrumError::InvalidValue {
                    index,
                    value: line.strength,
                }
                .into());
            }

            let sigma = (lsf_sigma.powi(2)
                + doppler_sigma(center, temperature, mass).powi(2)
                + widths[nearest_sample(&wl, center)].powi(2))
            .sqrt();

            if sigma == 0.0 {
                log::trace!("line {index} at {center:e} m has zero width, skipped");
                continue;
            }
            if center + LINE_CUTOFF_SIGMAS * sigma < lower
                || center - LINE_CUTOFF_SIGMAS * sigma > upper
            {
                log::trace!("line {index} at {center:e} m lies outside the grid, skipped");
                continue;
            }

            let amplitude = match line.kind {
                LineKind::Emission => line.strength,
                LineKind::Absorption => -line.strength,
            } / (sigma * (2.0 * PI).sqrt());

            Zip::from(&mut values).and(&wl).for_each(|v, &x| {
                *v += amplitude * (-0.5 * ((x - center) / sigma).powi(2)).exp();
            });
        }

        values.mapv_inplace(|v| v.max(0.0));
        Ok(Spectrum::new(Arc::clone(grid), values, self.unit)?)
    }
}

/// Index of the grid sample closest to `center`.
fn nearest_sample(wavelengths: &Array1<f64>, center: f64) -> usize {
    wavelengths
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - center).abs().total_cmp(&(*b - center).abs()))
        .map_or(0, |(index, _)| index)
}

/// Thermal Doppler standard deviation of a line, in metres.
fn doppler_sigma(center_m: f64, temperature_k: f64, mass: f64) -> f64 {
    center_m * (2.0 * BOLTZMANN * temperature_k / (mass * PROTON_MASS)).sqrt() / SPEED_OF_LIGHT
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use radiosim_core::WavelengthUnit;
    use uom::si::length::nanometer;

    use super::*;

    fn nm(value: f64) -> Length {
        Length::new::<nanometer>(value)
    }

    fn grid() -> Arc<SpectralGrid> {
        Arc::new(SpectralGrid::linear(1000.0, 2000.0, 101, WavelengthUnit::Nanometer).unwrap())
    }

    #[test]
    fn doppler_width_of_hydrogen_alpha() {
        assert_relative_eq!(
            doppler_sigma(656.28e-9, 1e4, 1.0),
            2.812_718e-11,
            max_relative = 1e-6
        );
    }

    #[test]
    fn unresolved_line_keeps_its_flux() {
        // Centred between two samples, narrower than a channel.
        let source = LineSource::new(FluxUnit::SpectralRadiance)
            .with_line(SpectralLine::emission(nm(1505.0), 3.0e-6));

        let spectrum = source.evaluate(&grid()).unwrap();
        assert_relative_eq!(spectrum.integrated(), 3.0e-6, max_relative = 1e-6);
        assert!(spectrum.values()[50] > 0.0);
        assert_relative_eq!(spectrum.values()[51], spectrum.values()[50], max_relative = 1e-9);
    }

    #[test]
    fn line_spread_widens_lines() {
        let narrow = LineSource::new(FluxUnit::SpectralRadiance)
            .with_line(SpectralLine::emission(nm(1500.0), 1.0));
        let wide = narrow.clone().with_line_spread(nm(100.0));

        let grid = grid();
        let narrow = narrow.evaluate(&grid).unwrap();
        let wide = wide.evaluate(&grid).unwrap();
        assert!(wide.values()[50] < narrow.values()[50]);
        assert_relative_eq!(wide.integrated(), narrow.integrated(), max_relative = 1e-6);
    }

    #[test]
    fn absorption_never_goes_negative() {
        let source = LineSource::new(FluxUnit::PhotonRadiance)
            .with_continuum(1.0)
            .with_line(SpectralLine::absorption(nm(1500.0), 1.0));

        let spectrum = source.evaluate(&grid()).unwrap();
        assert_eq!(spectrum.values()[50], 0.0);
        assert_relative_eq!(spectrum.values()[0], 1.0);
        assert!(spectrum.values().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn distant_lines_are_skipped() {
        let source = LineSource::new(FluxUnit::SpectralRadiance)
            .with_continuum(2.0)
            .with_line(SpectralLine::emission(nm(500.0), 1.0).with_mass(40.0));

        let spectrum = source.evaluate(&grid()).unwrap();
        assert!(spectrum.values().iter().all(|&v| v == 2.0));
    }

    #[test]
    fn line_width_follows_the_closest_channel() {
        let grid = Arc::new(
            SpectralGrid::new(
                array![1000.0, 1001.0, 1100.0, 1400.0],
                WavelengthUnit::Nanometer,
            )
            .unwrap(),
        );
        let wl = grid.wavelengths_m();
        assert_eq!(nearest_sample(&wl, 1002e-9), 1);
        assert_eq!(nearest_sample(&wl, 1051e-9), 2);
        assert_eq!(nearest_sample(&wl, 900e-9), 0);
        assert_eq!(nearest_sample(&wl, 2000e-9), 3);

        // A line just past a fine channel is broadened by that channel, not
        // by the coarse one above it.
        let source = LineSource::new(FluxUnit::SpectralRadiance)
            .with_line(SpectralLine::emission(nm(1002.0), 1.0));
        let spectrum = source.evaluate(&grid).unwrap();
        let sigma = grid.channel_widths_m()[1];
        let offset: f64 = 1e-9;
        assert_relative_eq!(
            spectrum.values()[1],
            (-0.5 * (offset / sigma).powi(2)).exp() / (sigma * (2.0 * PI).sqrt()),
            max_relative = 1e-9
        );
    }

    #[test]
    fn rejects_negative_strength() {
        let source = LineSource::new(FluxUnit::SpectralRadiance)
            .with_line(SpectralLine::emission(nm(1500.0), -1.0));

        assert_eq!(
            source.evaluate(&grid()).unwrap_err(),
            Error::InvalidSpectrum(SpectrumError::InvalidValue {
                index: 0,
                value: -1.0
            })
        );
    }
}
