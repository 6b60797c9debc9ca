//! Per-channel noise budget.
//!
//! Total noise is the quadrature sum of four independent contributors:
//!
//! ```text
//! σ² = S + B + D·t·n + R²·n
//! ```
//!
//! where `S` and `B` are the signal and background counts accumulated over
//! all coadds, `D` the dark current, `t` the exposure time of a single read,
//! `n` the number of coadds and `R` the read noise per read.

use ndarray::{Array1, Zip};
use thiserror::Error;
use uom::si::{
    f64::{Frequency, Time},
    frequency::hertz,
    time::second,
};

/// Errors raised for invalid noise model inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NoiseInputError {
    #[error("{quantity} must be finite and non-negative, got {value}")]
    InvalidValue { quantity: &'static str, value: f64 },

    #[error("at least one coadd is required")]
    ZeroCoadds,

    #[error("signal has {signal} channels but background has {background}")]
    LengthMismatch { signal: usize, background: usize },
}

/// Combines shot, dark and read noise into a total per-channel uncertainty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseModel {
    dark_counts: f64,
    read_variance: f64,
    read_noise: f64,
    coadds: u32,
}

impl NoiseModel {
    /// Creates a noise model for one detector configuration.
    ///
    /// `read_noise` is the RMS noise of a single read, in electrons.
    ///
    /// # Errors
    ///
    /// Returns a [`NoiseInputError`] if any parameter is negative or not
    /// finite, or if `coadds` is zero.
    pub fn new(
        dark_current: Frequency,
        read_noise: f64,
        exposure_time: Time,
        coadds: u32,
    ) -> Result<Self, NoiseInputError> {
        let dark = check("dark current", dark_current.get::<hertz>())?;
        let read_noise = check("read noise", read_noise)?;
        let exposure = check("exposure time", exposure_time.get::<second>())?;
        if coadds == 0 {
            return Err(NoiseInputError::ZeroCoadds);
        }

        let n = f64::from(coadds);
        Ok(Self {
            dark_counts: dark * exposure * n,
            read_variance: read_noise * read_noise * n,
            read_noise,
            coadds,
        })
    }

    /// Expected dark counts accumulated over every coadd.
    #[must_use]
    pub fn dark_counts(&self) -> f64 {
        self.dark_counts
    }

    #[must_use]
    pub fn coadds(&self) -> u32 {
        self.coadds
    }

    /// Total noise per channel, in electrons.
    ///
    /// # Errors
    ///
    /// Returns a [`NoiseInputError`] if the inputs differ in length or hold a
    /// negative or non-finite count.
    pub fn noise(
        &self,
        signal: &Array1<f64>,
        background: &Array1<f64>,
    ) -> Result<Array1<f64>, NoiseInputError> {
        self.budget(signal, background).map(|budget| budget.total)
    }

    /// Per-contributor noise breakdown, in electrons.
    ///
    /// # Errors
    ///
    /// Returns a [`NoiseInputError`] if the inputs differ in length or hold a
    /// negative or non-finite count.
    pub fn budget(
        &self,
        signal: &Array1<f64>,
        background: &Array1<f64>,
    ) -> Result<NoiseBudget, NoiseInputError> {
        if signal.len() != background.len() {
            return Err(NoiseInputError::LengthMismatch {
                signal: signal.len(),
                background: background.len(),
            });
        }
        for &value in signal {
            check("signal counts", value)?;
        }
        for &value in background {
            check("background counts", value)?;
        }

        let fixed = self.dark_counts + self.read_variance;
        let total = Zip::from(signal)
            .and(background)
            .map_collect(|&s, &b| (s + b + fixed).sqrt());

        Ok(NoiseBudget {
            signal_shot: signal.mapv(f64::sqrt),
            background_shot: background.mapv(f64::sqrt),
            dark: self.dark_counts.sqrt(),
            read: self.read_variance.sqrt(),
            total,
        })
    }

    /// Read noise of a single read.
    #[must_use]
    pub fn read_noise(&self) -> f64 {
        self.read_noise
    }
}

/// Noise contributions per channel, each in electrons RMS.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NoiseBudget {
    /// Photon shot noise of the signal.
    pub signal_shot: Array1<f64>,

    /// Shot noise of the background.
    pub background_shot: Array1<f64>,

    /// Dark current shot noise, identical in every channel.
    pub dark: f64,

    /// Read noise accumulated over all coadds, identical in every channel.
    pub read: f64,

    /// Quadrature sum of all contributors.
    pub total: Array1<f64>,
}

impl NoiseBudget {
    /// Signal-to-noise ratio per channel.
    ///
    /// A channel with zero noise has an SNR of zero when it also has zero
    /// signal, and [`f64::INFINITY`] otherwise. JSON has no infinity, so
    /// `serde_json` writes such a channel as `null`.
    #[must_use]
    pub fn snr(&self, signal: &Array1<f64>) -> Array1<f64> {
        Zip::from(signal)
            .and(&self.total)
            .map_collect(|&s, &n| match (s, n) {
                (s, _) if s == 0.0 => 0.0,
                (_, n) if n == 0.0 => f64::INFINITY,
                (s, n) => s / n,
            })
    }
}

fn check(quantity: &'static str, value: f64) -> Result<f64, NoiseInputError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(NoiseInputError::InvalidValue { quantity, value })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    fn model(dark: f64, read: f64, exposure: f64, coadds: u32) -> NoiseModel {
        NoiseModel::new(
            Frequency::new::<hertz>(dark),
            read,
            Time::new::<second>(exposure),
            coadds,
        )
        .unwrap()
    }

    #[test]
    fn pure_shot_noise() {
        let noise = model(0.0, 0.0, 1.0, 1)
            .noise(&array![100.0], &array![50.0])
            .unwrap();
        assert_relative_eq!(noise[0], 150.0_f64.sqrt());
    }

    #[test]
    fn contributors_add_in_quadrature() {
        let budget = model(2.0, 3.0, 10.0, 4)
            .budget(&array![16.0, 0.0], &array![9.0, 0.0])
            .unwrap();

        assert_relative_eq!(budget.dark, 80.0_f64.sqrt());
        assert_relative_eq!(budget.read, 6.0);
        assert_relative_eq!(budget.signal_shot[0], 4.0);
        assert_relative_eq!(budget.background_shot[0], 3.0);
        assert_relative_eq!(budget.total[0], (16.0 + 9.0 + 80.0 + 36.0_f64).sqrt());
        assert_relative_eq!(budget.total[1], (80.0 + 36.0_f64).sqrt());
    }

    #[test]
    fn read_noise_grows_with_root_of_coadds() {
        let one = model(0.0, 5.0, 1.0, 1).budget(&array![0.0], &array![0.0]).unwrap();
        let nine = model(0.0, 5.0, 1.0, 9).budget(&array![0.0], &array![0.0]).unwrap();
        assert_relative_eq!(nine.read / one.read, 3.0);
    }

    #[test]
    fn rejects_invalid_inputs() {
        assert_eq!(
            NoiseModel::new(
                Frequency::new::<hertz>(0.0),
                1.0,
                Time::new::<second>(1.0),
                0
            ),
            Err(NoiseInputError::ZeroCoadds)
        );
        assert!(matches!(
            NoiseModel::new(
                Frequency::new::<hertz>(-1.0),
                1.0,
                Time::new::<second>(1.0),
                1
            ),
            Err(NoiseInputError::InvalidValue {
                quantity: "dark current",
                ..
            })
        ));

        let model = model(0.0, 1.0, 1.0, 1);
        assert!(matches!(
            model.noise(&array![-1.0], &array![0.0]),
            Err(NoiseInputError::InvalidValue { .. })
        ));
        assert!(matches!(
            model.noise(&array![f64::NAN], &array![0.0]),
            Err(NoiseInputError::InvalidValue { .. })
        ));
        assert_eq!(
            model.noise(&array![1.0, 2.0], &array![0.0]),
            Err(NoiseInputError::LengthMismatch {
                signal: 2,
                background: 1
            })
        );
    }

    #[test]
    fn snr_handles_noiseless_channels() {
        let model = model(0.0, 0.0, 1.0, 1);
        let signal = array![100.0, 0.0];
        let budget = model.budget(&signal, &array![0.0, 0.0]).unwrap();
        let snr = budget.snr(&signal);
        assert_relative_eq!(snr[0], 10.0);
        assert_eq!(snr[1], 0.0);
    }
}
