use uom::si::{f64::Time, time::second};

use crate::CalibrationError;

/// RMS read noise of a single read, in electrons.
///
/// Infrared arrays read with multiple samples for long exposures, which
/// lowers the effective read noise past some exposure time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ReadNoise {
    Constant(f64),

    /// `short` applies below `threshold`, `long` at or above it.
    ExposureDependent {
        short: f64,
        long: f64,
        threshold: Time,
    },
}

impl ReadNoise {
    /// Read noise for a single read of the given exposure time.
    #[must_use]
    pub fn at(&self, exposure_time: Time) -> f64 {
        match *self {
            Self::Constant(noise) => noise,
            Self::ExposureDependent {
                short,
                long,
                threshold,
            } => {
                if exposure_time < threshold {
                    short
                } else {
                    long
                }
            }
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CalibrationError> {
        match *self {
            Self::Constant(noise) => {
                CalibrationError::non_negative("read noise", noise)?;
            }
            Self::ExposureDependent {
                short,
                long,
                threshold,
            } => {
                CalibrationError::non_negative("short-exposure read noise", short)?;
                CalibrationError::non_negative("long-exposure read noise", long)?;
                CalibrationError::non_negative(
                    "read noise threshold",
                    threshold.get::<second>(),
                )?;
            }
        }
        Ok(())
    }
}

impl Default for ReadNoise {
    fn default() -> Self {
        Self::Constant(0.0)
    }
}
