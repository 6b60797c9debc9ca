//! Canonical wavelength sampling.
//!
//! A [`SpectralGrid`] is the set of wavelengths every curve of a simulation
//! is resampled onto. Grids may be linearly or logarithmically spaced, and
//! carry the interpolation policy that applies to data sampled on them.
//!
//! Data leaving the domain of its native grid is resolved by an explicit
//! [`Extrapolate`] gap policy chosen at each call site.

mod error;
mod extrapolate;
mod interpolation;
mod unit;

pub use error::GridError;
pub use extrapolate::Extrapolate;
pub use interpolation::Interpolation;
pub use unit::WavelengthUnit;

use ndarray::Array1;
use uom::si::{f64::Length, length::meter};

use interpolation::Interpolant;

/// Relative distance under which a resampled point is snapped onto the edge
/// of the source domain, absorbing round-off from unit conversion.
const EDGE_SNAP: f64 = 1e-12;

/// An ordered, strictly increasing sequence of wavelength samples.
///
/// # Invariants
///
/// - At least one sample.
/// - Every sample is finite and strictly positive.
/// - Samples are strictly increasing (no duplicate abscissas).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "GridDef", into = "GridDef")
)]
pub struct SpectralGrid {
    samples: Array1<f64>,
    unit: WavelengthUnit,
    interpolation: Interpolation,
}

impl SpectralGrid {
    /// Creates a grid from explicit samples expressed in `unit`.
    ///
    /// The grid uses [`Interpolation::Linear`]; see
    /// [`SpectralGrid::with_interpolation`].
    ///
    /// # Errors
    ///
    /// Returns a [`GridError`] if the samples are empty, not finite, not
    /// positive or not strictly increasing.
    pub fn new(samples: impl Into<Array1<f64>>, unit: WavelengthUnit) -> Result<Self, GridError> {
        let samples = samples.into();
        validate(&samples)?;
        Ok(Self {
            samples,
            unit,
            interpolation: Interpolation::default(),
        })
    }

    /// Creates `count` evenly spaced samples from `start` to `end` inclusive.
    ///
    /// # Errors
    ///
    /// Returns a [`GridError`] if `count < 2` or the bounds are invalid.
    pub fn linear(
        start: f64,
        end: f64,
        count: usize,
        unit: WavelengthUnit,
    ) -> Result<Self, GridError> {
        if count < 2 {
            return Err(GridError::TooFewSamples {
                required: 2,
                found: count,
            });
        }
        let step = (end - start) / (count - 1) as f64;
        let mut samples = Array1::from_shape_fn(count, |i| start + step * i as f64);
        samples[count - 1] = end;
        Self::new(samples, unit)
    }

    /// Creates `count` logarithmically spaced samples from `start` to `end`
    /// inclusive (constant resolving power λ/Δλ).
    ///
    /// # Errors
    ///
    /// Returns a [`GridError`] if `count < 2` or the bounds are invalid.
    pub fn logarithmic(
        start: f64,
        end: f64,
        count: usize,
        unit: WavelengthUnit,
    ) -> Result<Self, GridError> {
        if count < 2 {
            return Err(GridError::TooFewSamples {
                required: 2,
                found: count,
            });
        }
        if !(start > 0.0 && end > 0.0) {
            return Err(GridError::InvalidSample {
                index: if start > 0.0 { count - 1 } else { 0 },
                value: if start > 0.0 { end } else { start },
            });
        }
        let ratio = (end / start).ln() / (count - 1) as f64;
        let mut samples = Array1::from_shape_fn(count, |i| start * (ratio * i as f64).exp());
        samples[0] = start;
        samples[count - 1] = end;
        Self::new(samples, unit)
    }

    /// Returns this grid with a different interpolation policy.
    #[must_use]
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; grids hold at least one sample.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw samples, expressed in [`SpectralGrid::unit`].
    #[must_use]
    pub fn samples(&self) -> &Array1<f64> {
        &self.samples
    }

    #[must_use]
    pub fn unit(&self) -> WavelengthUnit {
        self.unit
    }

    #[must_use]
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// First and last raw samples.
    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        (self.samples[0], self.samples[self.len() - 1])
    }

    /// Wavelength of sample `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn wavelength(&self, index: usize) -> Length {
        self.unit.length(self.samples[index])
    }

    /// Whether `wavelength` lies within the closed range of the grid.
    #[must_use]
    pub fn contains(&self, wavelength: Length) -> bool {
        let value = self.unit.value_of(wavelength);
        let (lower, upper) = self.bounds();
        (lower..=upper).contains(&value)
    }

    /// Samples converted to metres.
    #[must_use]
    pub fn wavelengths_m(&self) -> Array1<f64> {
        let factor = self.unit.length(1.0).get::<meter>();
        self.samples.mapv(|s| s * factor)
    }

    /// Width in metres of the channel around each sample.
    ///
    /// Channel edges sit halfway between neighbouring samples; the outer
    /// channels extend symmetrically past the first and last samples. A
    /// single-sample grid has a zero-width channel.
    #[must_use]
    pub fn channel_widths_m(&self) -> Array1<f64> {
        let wl = self.wavelengths_m();
        let n = wl.len();
        if n < 2 {
            return Array1::zeros(n);
        }
        Array1::from_shape_fn(n, |i| match i {
            0 => wl[1] - wl[0],
            i if i == n - 1 => wl[n - 1] - wl[n - 2],
            i => 0.5 * (wl[i + 1] - wl[i - 1]),
        })
    }

    /// Integrates values sampled on this grid over wavelength in metres
    /// using the trapezoidal rule.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::LengthMismatch`] if `values` is not sampled on
    /// this grid.
    pub fn integrate(&self, values: &Array1<f64>) -> Result<f64, GridError> {
        self.check_len(values)?;
        Ok(self.trapezoid(values))
    }

    pub(crate) fn trapezoid(&self, values: &Array1<f64>) -> f64 {
        let wl = self.wavelengths_m();
        wl.windows(2)
            .into_iter()
            .zip(values.windows(2))
            .map(|(x, y)| 0.5 * (y[0] + y[1]) * (x[1] - x[0]))
            .sum()
    }

    /// Resamples `values`, sampled on `source`, onto this grid.
    ///
    /// Interpolation follows the source grid's policy. Points of this grid
    /// outside the source domain resolve through `extrapolate`. Resampling
    /// data onto its own grid returns an exact copy.
    ///
    /// # Errors
    ///
    /// Returns a [`GridError`] if `source` has fewer than two samples, if
    /// `values` does not match `source`, or if a point is out of domain
    /// under [`Extrapolate::Error`].
    pub fn resample(
        &self,
        values: &Array1<f64>,
        source: &SpectralGrid,
        extrapolate: Extrapolate,
    ) -> Result<Array1<f64>, GridError> {
        if source.len() < 2 {
            return Err(GridError::TooFewSamples {
                required: 2,
                found: source.len(),
            });
        }
        source.check_len(values)?;

        if source.unit == self.unit && source.samples == self.samples {
            return Ok(values.clone());
        }

        let factor = self.unit.factor_to(source.unit);
        let (lower, upper) = source.bounds();
        let interp =
            Interpolant::new(source.samples.clone(), values.clone(), source.interpolation)?;

        self.samples
            .iter()
            .map(|&sample| {
                let point = snap_to_edges(sample * factor, lower, upper);
                if point < lower || point > upper {
                    match extrapolate {
                        Extrapolate::Fill(value) => Ok(value),
                        Extrapolate::Clamp => interp.at(point.clamp(lower, upper)),
                        Extrapolate::Error => Err(GridError::OutOfDomain {
                            wavelength: point,
                            lower,
                            upper,
                        }),
                    }
                } else {
                    interp.at(point)
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Array1::from)
    }

    pub(crate) fn check_len(&self, values: &Array1<f64>) -> Result<(), GridError> {
        if values.len() == self.len() {
            Ok(())
        } else {
            Err(GridError::LengthMismatch {
                expected: self.len(),
                found: values.len(),
            })
        }
    }
}

fn validate(samples: &Array1<f64>) -> Result<(), GridError> {
    if samples.is_empty() {
        return Err(GridError::TooFewSamples {
            required: 1,
            found: 0,
        });
    }
    for (index, &value) in samples.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(GridError::InvalidSample { index, value });
        }
        if index > 0 && value <= samples[index - 1] {
            return Err(GridError::NotIncreasing { index });
        }
    }
    Ok(())
}

fn snap_to_edges(point: f64, lower: f64, upper: f64) -> f64 {
    if point < lower && (lower - point) <= EDGE_SNAP * lower {
        lower
    } else if point > upper && (point - upper) <= EDGE_SNAP * upper {
        upper
    } else {
        point
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct GridDef {
    samples: Vec<f64>,
    #[serde(default)]
    unit: WavelengthUnit,
    #[serde(default)]
    interpolation: Interpolation,
}

#[cfg(feature = "serde")]
impl TryFrom<GridDef> for SpectralGrid {
    type Error = GridError;

    fn try_from(def: GridDef) -> Result<Self, Self::Error> {
        Ok(Self::new(def.samples, def.unit)?.with_interpolation(def.interpolation))
    }
}

#[cfg(feature = "serde")]
impl From<SpectralGrid> for GridDef {
    fn from(grid: SpectralGrid) -> Self {
        Self {
            samples: grid.samples.to_vec(),
            unit: grid.unit,
            interpolation: grid.interpolation,
        }
    }
}
