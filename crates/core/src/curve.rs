//! Wavelength-dependent scalar curves (efficiency, emissivity, QE, ...).

use ndarray::Array1;
use thiserror::Error;

use crate::grid::{Extrapolate, GridError, SpectralGrid, WavelengthUnit};

/// Errors raised while building or sampling a [`Curve`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("curve value at sample {index} is invalid: {value}")]
    InvalidValue { index: usize, value: f64 },

    #[error(transparent)]
    Grid(#[from] GridError),
}

/// A scalar curve over wavelength.
///
/// Values are finite and non-negative. Curves keep their native sampling and
/// are resampled onto a working grid on demand.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Curve {
    /// The same value at every wavelength.
    Constant(f64),
    /// Values tabulated on the curve's own grid.
    Sampled(SampledCurve),
}

impl Curve {
    /// A constant curve.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidValue`] if `value` is negative or not finite.
    pub fn constant(value: f64) -> Result<Self, CurveError> {
        check_value(0, value)?;
        Ok(Self::Constant(value))
    }

    /// A curve tabulated at `wavelengths` (in `unit`).
    ///
    /// # Errors
    ///
    /// Returns a [`CurveError`] if the table is malformed.
    pub fn sampled(
        wavelengths: impl Into<Array1<f64>>,
        values: impl Into<Array1<f64>>,
        unit: WavelengthUnit,
    ) -> Result<Self, CurveError> {
        let grid = SpectralGrid::new(wavelengths, unit)?;
        Ok(Self::Sampled(SampledCurve::new(grid, values)?))
    }

    /// Values of the curve on `grid`.
    ///
    /// Constant curves cover every wavelength. Sampled curves are resampled
    /// with their native interpolation and resolve gaps through `extrapolate`.
    ///
    /// # Errors
    ///
    /// Returns a [`CurveError`] if the curve or the stored values are
    /// invalid, or if resampling fails under the gap policy.
    pub fn sample(
        &self,
        grid: &SpectralGrid,
        extrapolate: Extrapolate,
    ) -> Result<Array1<f64>, CurveError> {
        match self {
            Self::Constant(value) => {
                check_value(0, *value)?;
                Ok(Array1::from_elem(grid.len(), *value))
            }
            Self::Sampled(curve) => {
                let values = grid.resample(&curve.values, &curve.grid, extrapolate)?;
                check_values(&values)?;
                Ok(values)
            }
        }
    }

    /// Smallest and largest stored values.
    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        match self {
            Self::Constant(value) => (*value, *value),
            Self::Sampled(curve) => curve
                .values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                }),
        }
    }
}

impl From<SampledCurve> for Curve {
    fn from(curve: SampledCurve) -> Self {
        Self::Sampled(curve)
    }
}

/// A curve tabulated on its own grid.
///
/// The native grid must hold at least two samples so that it can be
/// resampled.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "SampledCurveDef", into = "SampledCurveDef")
)]
pub struct SampledCurve {
    grid: SpectralGrid,
    values: Array1<f64>,
}

impl SampledCurve {
    /// # Errors
    ///
    /// Returns a [`CurveError`] if the grid has fewer than two samples, the
    /// values do not match it, or a value is negative or not finite.
    pub fn new(grid: SpectralGrid, values: impl Into<Array1<f64>>) -> Result<Self, CurveError> {
        let values = values.into();
        if grid.len() < 2 {
            return Err(GridError::TooFewSamples {
                required: 2,
                found: grid.len(),
            }
            .into());
        }
        grid.check_len(&values)?;
        check_values(&values)?;
        Ok(Self { grid, values })
    }

    #[must_use]
    pub fn grid(&self) -> &SpectralGrid {
        &self.grid
    }

    #[must_use]
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }
}

fn check_value(index: usize, value: f64) -> Result<(), CurveError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CurveError::InvalidValue { index, value })
    }
}

fn check_values(values: &Array1<f64>) -> Result<(), CurveError> {
    values
        .iter()
        .enumerate()
        .try_for_each(|(index, &value)| check_value(index, value))
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct SampledCurveDef {
    wavelengths: Vec<f64>,
    values: Vec<f64>,
    #[serde(default)]
    unit: WavelengthUnit,
    #[serde(default)]
    interpolation: crate::grid::Interpolation,
}

#[cfg(feature = "serde")]
impl TryFrom<SampledCurveDef> for SampledCurve {
    type Error = CurveError;

    fn try_from(def: SampledCurveDef) -> Result<Self, Self::Error> {
        let grid =
            SpectralGrid::new(def.wavelengths, def.unit)?.with_interpolation(def.interpolation);
        Self::new(grid, def.values)
    }
}

#[cfg(feature = "serde")]
impl From<SampledCurve> for SampledCurveDef {
    fn from(curve: SampledCurve) -> Self {
        Self {
            wavelengths: curve.grid.samples().to_vec(),
            values: curve.values.to_vec(),
            unit: curve.grid.unit(),
            interpolation: curve.grid.interpolation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    fn working_grid() -> SpectralGrid {
        SpectralGrid::linear(400.0, 1000.0, 7, WavelengthUnit::Nanometer).unwrap()
    }

    #[test]
    fn constant_covers_every_wavelength() {
        let values = Curve::constant(0.9)
            .unwrap()
            .sample(&working_grid(), Extrapolate::Error)
            .unwrap();
        assert_eq!(values, Array1::from_elem(7, 0.9));
        assert!(Curve::constant(-0.1).is_err());
    }

    #[test]
    fn sampled_curve_zero_fills_gaps() {
        // Native table in micrometres covering 0.5 to 0.8 µm only.
        let curve = Curve::sampled(
            array![0.5, 0.8],
            array![0.2, 0.8],
            WavelengthUnit::Micrometer,
        )
        .unwrap();

        let values = curve.sample(&working_grid(), Extrapolate::ZERO).unwrap();
        assert_eq!(values[0], 0.0);
        assert_relative_eq!(values[1], 0.2, max_relative = 1e-12);
        assert_relative_eq!(values[3], 0.6, max_relative = 1e-12);
        assert_eq!(values[5], 0.0);

        assert_eq!(curve.range(), (0.2, 0.8));
    }

    #[test]
    fn sampled_curve_validates_table() {
        assert!(matches!(
            Curve::sampled(array![500.0, 600.0], array![0.5, -0.5], WavelengthUnit::Nanometer),
            Err(CurveError::InvalidValue { index: 1, .. })
        ));
        assert!(matches!(
            Curve::sampled(array![500.0], array![0.5], WavelengthUnit::Nanometer),
            Err(CurveError::Grid(GridError::TooFewSamples { .. }))
        ));
        assert!(matches!(
            Curve::sampled(array![600.0, 500.0], array![0.5, 0.5], WavelengthUnit::Nanometer),
            Err(CurveError::Grid(GridError::NotIncreasing { index: 1 }))
        ));
    }

    #[test]
    fn fill_value_is_checked() {
        let curve =
            Curve::sampled(array![500.0, 600.0], array![0.5, 0.5], WavelengthUnit::Nanometer)
                .unwrap();
        assert!(matches!(
            curve.sample(&working_grid(), Extrapolate::Fill(-1.0)),
            Err(CurveError::InvalidValue { value, .. }) if value == -1.0
        ));
    }
}
