use ndarray::Array1;
use radiosim_core::{Curve, Extrapolate, SpectralGrid};
use uom::si::{f64::Power, power::watt};

use crate::{CalibrationError, Error};

/// A calibration lamp described by its spectral power output.
///
/// The spectral power is in W·m⁻¹ at the lamp's nominal rating. A lamp run
/// at a different electrical power scales its whole spectrum by the ratio to
/// the rating, and an attenuator removes a fixed fraction on top.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lamp {
    pub label: String,

    /// Spectral power at the nominal rating, W·m⁻¹.
    pub spectral_power: Curve,

    pub rating: Option<PowerRating>,

    /// Fraction of the output removed by an attenuator, in [0, 1].
    #[cfg_attr(feature = "serde", serde(default))]
    pub attenuation: f64,
}

/// The power a lamp was characterized at and the power it is run at.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerRating {
    pub nominal: Power,
    pub operating: Power,
}

impl Lamp {
    /// An unrated, unattenuated lamp.
    #[must_use]
    pub fn new(label: impl Into<String>, spectral_power: Curve) -> Self {
        Self {
            label: label.into(),
            spectral_power,
            rating: None,
            attenuation: 0.0,
        }
    }

    /// Records the power the spectrum was measured at and runs the lamp
    /// there.
    #[must_use]
    pub fn with_rating(self, nominal: Power) -> Self {
        Self {
            rating: Some(PowerRating {
                nominal,
                operating: nominal,
            }),
            ..self
        }
    }

    #[must_use]
    pub fn with_attenuation(self, attenuation: f64) -> Self {
        Self {
            attenuation,
            ..self
        }
    }

    /// The same lamp run at `power`.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::MissingPowerRating`] if the lamp has no
    /// nominal rating to scale against.
    pub fn adjusted_to(self, power: Power) -> Result<Self, Error> {
        let Some(rating) = self.rating else {
            return Err(CalibrationError::MissingPowerRating { label: self.label }.into());
        };
        Ok(Self {
            rating: Some(PowerRating {
                operating: power,
                ..rating
            }),
            ..self
        })
    }

    /// Factor applied to the nominal spectrum: operating over nominal power,
    /// times the unattenuated fraction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Calibration`] if a power is negative, the nominal
    /// power is zero, or the attenuation leaves [0, 1].
    pub fn power_factor(&self) -> Result<f64, Error> {
        if !(0.0..=1.0).contains(&self.attenuation) {
            return Err(CalibrationError::OutOfUnitRange {
                label: self.label.clone(),
                quantity: "attenuation",
                value: self.attenuation,
            }
            .into());
        }
        let ratio = match self.rating {
            Some(PowerRating { nominal, operating }) => {
                let nominal =
                    CalibrationError::positive("lamp nominal power", nominal.get::<watt>())?;
                let operating = CalibrationError::non_negative(
                    "lamp operating power",
                    operating.get::<watt>(),
                )?;
                operating / nominal
            }
            None => 1.0,
        };
        Ok(ratio * (1.0 - self.attenuation))
    }

    /// Spectral power on `grid` in W·m⁻¹, zero outside the tabulated range.
    ///
    /// # Errors
    ///
    /// See [`Lamp::power_factor`]. Also fails if the spectral power curve is
    /// malformed.
    pub fn spectral_power_on(&self, grid: &SpectralGrid) -> Result<Array1<f64>, Error> {
        let factor = self.power_factor()?;
        Ok(self.spectral_power.sample(grid, Extrapolate::ZERO)? * factor)
    }
}
