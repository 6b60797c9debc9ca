use ndarray::Array1;
use ninterp::{
    prelude::{Interp1DOwned, Interpolator as _},
    strategy::enums::Strategy1DEnum,
};

use super::GridError;

/// How values sampled on a grid are estimated between its samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Interpolation {
    /// Straight lines between neighbouring samples.
    #[default]
    Linear,

    /// Straight lines in (ln λ, ln f), i.e. power laws between samples.
    ///
    /// Segments touching a non-positive value fall back to linear
    /// interpolation.
    LogLog,

    /// Value of the closest sample.
    Nearest,
}

/// An interpolant built over in-domain data.
///
/// Callers resolve out-of-domain points with their gap policy before
/// evaluating, so the interpolant itself never extrapolates.
pub(crate) enum Interpolant {
    Table(Interp1DOwned<f64, Strategy1DEnum>),
    LogLog(PowerLaw),
}

impl Interpolant {
    pub(crate) fn new(
        x: Array1<f64>,
        f_x: Array1<f64>,
        strategy: Interpolation,
    ) -> Result<Self, GridError> {
        let extrapolate = ninterp::interpolator::Extrapolate::Error;
        match strategy {
            Interpolation::Linear => Ok(Self::Table(Interp1DOwned::new(
                x,
                f_x,
                ninterp::strategy::Linear.into(),
                extrapolate,
            )?)),
            Interpolation::Nearest => Ok(Self::Table(Interp1DOwned::new(
                x,
                f_x,
                ninterp::strategy::Nearest.into(),
                extrapolate,
            )?)),
            Interpolation::LogLog => Ok(Self::LogLog(PowerLaw {
                x: x.to_vec(),
                f_x: f_x.to_vec(),
            })),
        }
    }

    pub(crate) fn at(&self, point: f64) -> Result<f64, GridError> {
        match self {
            Self::Table(interp) => interp.interpolate(&[point]).map_err(Into::into),
            Self::LogLog(power_law) => Ok(power_law.at(point)),
        }
    }
}

pub(crate) struct PowerLaw {
    x: Vec<f64>,
    f_x: Vec<f64>,
}

impl PowerLaw {
    fn at(&self, point: f64) -> f64 {
        let last = self.x.len() - 1;
        let upper = self.x.partition_point(|&x| x <= point).clamp(1, last);
        let lower = upper - 1;

        let (x0, x1) = (self.x[lower], self.x[upper]);
        let (f0, f1) = (self.f_x[lower], self.f_x[upper]);

        if point == x0 {
            return f0;
        }
        if point == x1 {
            return f1;
        }

        if f0 > 0.0 && f1 > 0.0 {
            let t = (point / x0).ln() / (x1 / x0).ln();
            (f0.ln() + t * (f1 / f0).ln()).exp()
        } else {
            f0 + (point - x0) / (x1 - x0) * (f1 - f0)
        }
    }
}
