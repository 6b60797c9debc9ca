use std::fmt;

use radiosim_core::{CurveError, GridError, SpectrumError};
use thiserror::Error;

use crate::noise::NoiseInputError;

/// Errors produced by the simulation engine.
///
/// Every failure is deterministic: the same configuration always fails the
/// same way, so nothing is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A grid is too small or malformed, or a lookup left its domain.
    #[error("domain error: {0}")]
    Domain(#[from] GridError),

    /// A spectrum holds negative or non-finite flux, or spectra are combined
    /// inconsistently.
    #[error("invalid spectrum: {0}")]
    InvalidSpectrum(SpectrumError),

    /// Propagation was requested through a train with no elements.
    #[error("optical train has no elements")]
    EmptyTrain,

    /// An optical element or the detector is malformed.
    #[error("calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    /// The noise model received negative or non-finite inputs.
    #[error("invalid noise input: {0}")]
    InvalidNoiseInput(#[from] NoiseInputError),
}

impl Error {
    /// The broad category of this error, for front ends.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::Domain,
            Self::InvalidSpectrum(_) => ErrorKind::InvalidSpectrum,
            Self::EmptyTrain => ErrorKind::EmptyTrain,
            Self::Calibration(_) => ErrorKind::Calibration,
            Self::InvalidNoiseInput(_) => ErrorKind::InvalidNoiseInput,
        }
    }
}

impl From<SpectrumError> for Error {
    fn from(err: SpectrumError) -> Self {
        match err {
            SpectrumError::Grid(err) => Self::Domain(err),
            err => Self::InvalidSpectrum(err),
        }
    }
}

/// Malformed curve values are calibration problems; grid problems stay
/// domain problems.
impl From<CurveError> for Error {
    fn from(err: CurveError) -> Self {
        match err {
            CurveError::Grid(err) => Self::Domain(err),
            err @ CurveError::InvalidValue { .. } => {
                Self::Calibration(CalibrationError::Curve(err))
            }
        }
    }
}

/// Category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Domain,
    InvalidSpectrum,
    EmptyTrain,
    Calibration,
    InvalidNoiseInput,
}

impl ErrorKind {
    /// Process exit code a command-line front end reports for this kind.
    ///
    /// Zero is reserved for a completed simulation.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Domain => 2,
            Self::InvalidSpectrum => 3,
            Self::EmptyTrain => 4,
            Self::Calibration => 5,
            Self::InvalidNoiseInput => 6,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Domain => "DomainError",
            Self::InvalidSpectrum => "InvalidSpectrumError",
            Self::EmptyTrain => "EmptyTrainError",
            Self::Calibration => "CalibrationError",
            Self::InvalidNoiseInput => "InvalidNoiseInputError",
        })
    }
}

/// Malformed optical or detector calibration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// A transfer curve (transmission, reflectance, QE) leaves [0, 1].
    #[error("{quantity} of `{label}` must lie in [0, 1], found {value}")]
    OutOfUnitRange {
        label: String,
        quantity: &'static str,
        value: f64,
    },

    /// Transmission plus emissivity exceeds one.
    #[error("`{label}` emits and transmits more than it receives at channel {index}: {sum}")]
    EnergyBalance {
        label: String,
        index: usize,
        sum: f64,
    },

    /// A scalar parameter is negative, zero where it must be positive, or not
    /// finite.
    #[error("{name} is invalid: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// A lamp power adjustment was requested without a nominal rating.
    #[error("lamp `{label}` has no nominal power rating to adjust against")]
    MissingPowerRating { label: String },

    /// A two-dimensional table does not match its axes.
    #[error("`{label}` table must be {expected:?} (rows, columns), found {found:?}")]
    TableShape {
        label: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// A count (coadds, binning) is zero.
    #[error("{name} must be at least 1")]
    ZeroCount { name: &'static str },

    /// A curve holds negative or non-finite values.
    #[error(transparent)]
    Curve(CurveError),
}

impl CalibrationError {
    /// Checks that a scalar parameter is finite and non-negative.
    pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<f64, Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(Self::InvalidParameter { name, value })
        }
    }

    /// Checks that a scalar parameter is finite and strictly positive.
    pub(crate) fn positive(name: &'static str, value: f64) -> Result<f64, Self> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(Self::InvalidParameter { name, value })
        }
    }

    /// Checks that every value of a sampled transfer curve lies in [0, 1].
    pub(crate) fn unit_range<'a>(
        label: &str,
        quantity: &'static str,
        values: impl IntoIterator<Item = &'a f64>,
    ) -> Result<(), Self> {
        match values.into_iter().find(|v| !(0.0..=1.0).contains(*v)) {
            Some(&value) => Err(Self::OutOfUnitRange {
                label: label.to_owned(),
                quantity,
                value,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectrum_grid_errors_map_to_domain() {
        let grid_err = GridError::TooFewSamples {
            required: 2,
            found: 1,
        };
        let err: Error = SpectrumError::Grid(grid_err.clone()).into();
        assert_eq!(err, Error::Domain(grid_err));
        assert_eq!(err.kind(), ErrorKind::Domain);

        let err: Error = SpectrumError::InvalidFactor(-1.0).into();
        assert_eq!(err.kind(), ErrorKind::InvalidSpectrum);
    }

    #[test]
    fn curve_values_map_to_calibration() {
        let err: Error = CurveError::InvalidValue {
            index: 0,
            value: -1.0,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Calibration);
        assert_eq!(err.kind().exit_code(), 5);
        assert_eq!(err.kind().to_string(), "CalibrationError");
    }

    #[test]
    fn unit_range_reports_offending_value() {
        let values = ndarray::array![0.2, 1.3, 0.5];
        assert_eq!(
            CalibrationError::unit_range("M1", "efficiency", &values),
            Err(CalibrationError::OutOfUnitRange {
                label: "M1".into(),
                quantity: "efficiency",
                value: 1.3,
            })
        );
        assert!(CalibrationError::positive("gain", 0.0).is_err());
        assert!(CalibrationError::non_negative("dark current", 0.0).is_ok());
    }
}
