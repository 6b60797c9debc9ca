//! Conversion of spectral flux into detected counts per pixel.
//!
//! The detector turns the signal and background leaving the optical train
//! into expected electron counts per spectral channel:
//!
//! ```text
//! N(λ) = F_γ(λ) · G · Δλ_px(λ) · QE(λ) · b · t · n
//! ```
//!
//! where `F_γ` is the photon flux density, `G` the collecting geometry (area
//! times solid angle for radiance, area alone for irradiance), `Δλ_px` the
//! bandwidth seen by one pixel, `b` the on-chip binning, `t` the exposure
//! time of one read and `n` the number of coadds.

mod dispersion;
mod enclosure;
mod read_noise;

pub use dispersion::Dispersion;
pub use enclosure::ThermalEnclosure;
pub use read_noise::ReadNoise;

use ndarray::Array1;
use radiosim_core::{Curve, Extrapolate, SpectralGrid, Spectrum, SpectrumError};
use uom::si::{
    area::square_meter,
    f64::{Area, Frequency, SolidAngle, Time},
    frequency::hertz,
    solid_angle::steradian,
    time::second,
};

use crate::{CalibrationError, Error, noise::NoiseModel};

/// Detector calibration and exposure settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorModel {
    /// Quantum efficiency; wavelengths outside the curve detect nothing.
    pub quantum_efficiency: Curve,

    pub dispersion: Dispersion,

    /// Integration time of a single read.
    pub exposure_time: Time,

    /// Dark current in electrons per second per pixel.
    #[cfg_attr(feature = "serde", serde(default = "defaults::dark_current"))]
    pub dark_current: Frequency,

    #[cfg_attr(feature = "serde", serde(default))]
    pub read_noise: ReadNoise,

    #[cfg_attr(feature = "serde", serde(default = "defaults::one"))]
    pub coadds: u32,

    /// On-chip binning factor along the dispersion axis.
    #[cfg_attr(feature = "serde", serde(default = "defaults::one"))]
    pub binning: u32,

    /// Electrons per ADU.
    #[cfg_attr(feature = "serde", serde(default = "defaults::gain"))]
    pub gain: f64,

    /// Telescope collecting area.
    pub collecting_area: Area,

    /// Solid angle on the sky seen by one pixel.
    pub pixel_solid_angle: SolidAngle,

    /// Physical pixel area, used only for thermal enclosures.
    #[cfg_attr(feature = "serde", serde(default = "defaults::pixel_area"))]
    pub pixel_area: Area,

    #[cfg_attr(feature = "serde", serde(default))]
    pub enclosures: Vec<ThermalEnclosure>,

    /// Full-well capacity in electrons, if saturation should be reported.
    #[cfg_attr(feature = "serde", serde(default))]
    pub full_well: Option<f64>,
}

#[cfg(feature = "serde")]
mod defaults {
    use uom::si::{
        area::square_meter,
        f64::{Area, Frequency},
        frequency::hertz,
    };

    pub(super) fn dark_current() -> Frequency {
        Frequency::new::<hertz>(0.0)
    }

    pub(super) fn one() -> u32 {
        1
    }

    pub(super) fn gain() -> f64 {
        1.0
    }

    pub(super) fn pixel_area() -> Area {
        Area::new::<square_meter>(0.0)
    }
}

/// Expected per-channel rates and counts for one exposure.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Detection {
    /// Quantum efficiency on the working grid.
    pub quantum_efficiency: Array1<f64>,

    /// Wavelength interval seen by one pixel, in metres.
    pub pixel_bandwidth: Array1<f64>,

    /// Number of pixels spanned by each channel of the grid.
    pub pixels_per_channel: Array1<f64>,

    /// Signal electrons per second per pixel.
    pub signal_rate: Array1<f64>,

    /// Background electrons per second per pixel, enclosure included.
    pub background_rate: Array1<f64>,

    /// Electrons per second per pixel from thermal enclosures.
    pub enclosure_rate: f64,

    /// Signal electrons accumulated over every coadd.
    pub signal: Array1<f64>,

    /// Background electrons accumulated over every coadd.
    pub background: Array1<f64>,
}

impl DetectorModel {
    /// A detector with no dark current, no read noise, a single unbinned
    /// read, unit gain and unit collecting area and solid angle.
    #[must_use]
    pub fn new(quantum_efficiency: Curve, dispersion: Dispersion, exposure_time: Time) -> Self {
        Self {
            quantum_efficiency,
            dispersion,
            exposure_time,
            dark_current: Frequency::new::<hertz>(0.0),
            read_noise: ReadNoise::default(),
            coadds: 1,
            binning: 1,
            gain: 1.0,
            collecting_area: Area::new::<square_meter>(1.0),
            pixel_solid_angle: SolidAngle::new::<steradian>(1.0),
            pixel_area: Area::new::<square_meter>(0.0),
            enclosures: Vec::new(),
            full_well: None,
        }
    }

    #[must_use]
    pub fn with_exposure_time(self, exposure_time: Time) -> Self {
        Self {
            exposure_time,
            ..self
        }
    }

    #[must_use]
    pub fn with_dark_current(self, dark_current: Frequency) -> Self {
        Self {
            dark_current,
            ..self
        }
    }

    #[must_use]
    pub fn with_read_noise(self, read_noise: ReadNoise) -> Self {
        Self { read_noise, ..self }
    }

    #[must_use]
    pub fn with_coadds(self, coadds: u32) -> Self {
        Self { coadds, ..self }
    }

    #[must_use]
    pub fn with_binning(self, binning: u32) -> Self {
        Self { binning, ..self }
    }

    #[must_use]
    pub fn with_gain(self, gain: f64) -> Self {
        Self { gain, ..self }
    }

    #[must_use]
    pub fn with_collecting_area(self, collecting_area: Area) -> Self {
        Self {
            collecting_area,
            ..self
        }
    }

    #[must_use]
    pub fn with_pixel_solid_angle(self, pixel_solid_angle: SolidAngle) -> Self {
        Self {
            pixel_solid_angle,
            ..self
        }
    }

    #[must_use]
    pub fn with_pixel_area(self, pixel_area: Area) -> Self {
        Self { pixel_area, ..self }
    }

    #[must_use]
    pub fn with_enclosure(mut self, enclosure: ThermalEnclosure) -> Self {
        self.enclosures.push(enclosure);
        self
    }

    #[must_use]
    pub fn with_full_well(self, full_well: f64) -> Self {
        Self {
            full_well: Some(full_well),
            ..self
        }
    }

    /// Checks every scalar calibration parameter.
    ///
    /// Curves are checked against the working grid in [`DetectorModel::detect`].
    ///
    /// # Errors
    ///
    /// Returns a [`CalibrationError`] naming the first invalid parameter.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        CalibrationError::positive("exposure time", self.exposure_time.get::<second>())?;
        CalibrationError::non_negative("dark current", self.dark_current.get::<hertz>())?;
        self.read_noise.validate()?;
        if self.coadds == 0 {
            return Err(CalibrationError::ZeroCount { name: "coadds" });
        }
        if self.binning == 0 {
            return Err(CalibrationError::ZeroCount { name: "binning" });
        }
        CalibrationError::positive("gain", self.gain)?;
        CalibrationError::positive(
            "collecting area",
            self.collecting_area.get::<square_meter>(),
        )?;
        CalibrationError::positive(
            "pixel solid angle",
            self.pixel_solid_angle.get::<steradian>(),
        )?;
        if self.enclosures.is_empty() {
            CalibrationError::non_negative("pixel area", self.pixel_area.get::<square_meter>())?;
        } else {
            CalibrationError::positive("pixel area", self.pixel_area.get::<square_meter>())?;
        }
        if let Some(full_well) = self.full_well {
            CalibrationError::positive("full well", full_well)?;
        }
        Ok(())
    }

    /// Read noise of a single read at the configured exposure time.
    #[must_use]
    pub fn effective_read_noise(&self) -> f64 {
        self.read_noise.at(self.exposure_time)
    }

    /// The noise model matching this detector's settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNoiseInput`] if a parameter is negative or not
    /// finite, or if `coadds` is zero.
    pub fn noise_model(&self) -> Result<NoiseModel, Error> {
        Ok(NoiseModel::new(
            self.dark_current,
            self.effective_read_noise(),
            self.exposure_time,
            self.coadds,
        )?)
    }

    /// Converts the spectra leaving the optical train into expected counts.
    ///
    /// Both spectra must share one grid. Energy units are converted to
    /// photons first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Calibration`] for invalid detector parameters or a QE
    /// outside [0, 1], and [`Error::InvalidSpectrum`] if the spectra do not
    /// share a grid.
    pub fn detect(&self, signal: &Spectrum, background: &Spectrum) -> Result<Detection, Error> {
        self.validate()?;
        if !signal.shares_grid(background) {
            return Err(SpectrumError::GridMismatch.into());
        }
        let grid = signal.grid();

        let qe = self.quantum_efficiency.sample(grid, Extrapolate::ZERO)?;
        CalibrationError::unit_range("detector", "quantum efficiency", &qe)?;
        let pixel_bandwidth = self.dispersion.pixel_bandwidth(grid)?;
        let pixels_per_channel = grid.channel_widths_m() / &pixel_bandwidth;

        let per_pixel = &pixel_bandwidth * &qe * f64::from(self.binning);
        let signal_rate = self.photon_rate(signal, &per_pixel);

        let enclosure_rate = self.enclosure_rate(grid, &qe)?;
        let background_rate = self.photon_rate(background, &per_pixel) + enclosure_rate;

        let integration = self.exposure_time.get::<second>() * f64::from(self.coadds);
        log::trace!(
            "detected {} channels over {integration} s, enclosure {enclosure_rate:e} e-/s",
            grid.len()
        );

        Ok(Detection {
            signal: &signal_rate * integration,
            background: &background_rate * integration,
            quantum_efficiency: qe,
            pixel_bandwidth,
            pixels_per_channel,
            signal_rate,
            background_rate,
            enclosure_rate,
        })
    }

    /// Photon flux density times collecting geometry times `per_pixel`.
    fn photon_rate(&self, spectrum: &Spectrum, per_pixel: &Array1<f64>) -> Array1<f64> {
        let photons = spectrum.to_photons();
        let area = self.collecting_area.get::<square_meter>();
        let geometry = if photons.unit().is_radiance() {
            area * self.pixel_solid_angle.get::<steradian>()
        } else {
            area
        };
        photons.values() * per_pixel * geometry
    }

    fn enclosure_rate(&self, grid: &SpectralGrid, qe: &Array1<f64>) -> Result<f64, Error> {
        let pixel_area = self.pixel_area.get::<square_meter>();
        self.enclosures.iter().try_fold(0.0, |rate, enclosure| -> Result<f64, Error> {
            let radiance = enclosure.detected_radiance(grid, qe)?;
            Ok(rate + pixel_area * enclosure.solid_angle_sr()? * radiance)
        })
    }
}
