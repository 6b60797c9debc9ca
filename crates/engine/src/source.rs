//! Input spectra.
//!
//! A [`SpectrumSource`] produces the flux entering the optical train,
//! evaluated on the working grid. Sources never produce negative flux; they
//! fail with [`Error::InvalidSpectrum`] instead.

mod blackbody;
mod constant;
mod lamp;
mod lines;
mod sphere;
mod table;

pub use blackbody::Blackbody;
pub use constant::ConstantSource;
pub use lamp::{Lamp, PowerRating};
pub use lines::{LineKind, LineSource, SpectralLine};
pub use sphere::IntegratingSphere;
pub use table::TableSource;

use std::sync::Arc;

use radiosim_core::{SpectralGrid, Spectrum, SpectrumError};

use crate::Error;

/// Produces a spectral flux density on a grid.
///
/// Sources are immutable and shared between parallel runs.
pub trait SpectrumSource: Send + Sync {
    /// Evaluates the source on `grid`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the source is malformed or would produce
    /// negative or non-finite flux.
    fn evaluate(&self, grid: &Arc<SpectralGrid>) -> Result<Spectrum, Error>;
}

impl<S: SpectrumSource + ?Sized> SpectrumSource for Box<S> {
    fn evaluate(&self, grid: &Arc<SpectralGrid>) -> Result<Spectrum, Error> {
        (**self).evaluate(grid)
    }
}

impl<S: SpectrumSource + ?Sized> SpectrumSource for Arc<S> {
    fn evaluate(&self, grid: &Arc<SpectralGrid>) -> Result<Spectrum, Error> {
        (**self).evaluate(grid)
    }
}

/// Any of the built-in sources, as found in a configuration file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Source {
    Constant(ConstantSource),
    Blackbody(Blackbody),
    Lines(LineSource),
    Table(TableSource),
    IntegratingSphere(IntegratingSphere),

    /// Sum of several sources sharing one flux unit, e.g. a lamp seen
    /// against the sky.
    Composite { sources: Vec<Source> },

    /// Another source multiplied by a non-negative factor, e.g. a lamp
    /// attenuator or power adjustment.
    Scaled { factor: f64, source: Box<Source> },
}

impl Source {
    /// Wraps this source in a scale factor.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::Scaled {
            factor,
            source: Box::new(self),
        }
    }
}

impl SpectrumSource for Source {
    fn evaluate(&self, grid: &Arc<SpectralGrid>) -> Result<Spectrum, Error> {
        match self {
            Self::Constant(source) => source.evaluate(grid),
            Self::Blackbody(source) => source.evaluate(grid),
            Self::Lines(source) => source.evaluate(grid),
            Self::Table(source) => source.evaluate(grid),
            Self::IntegratingSphere(source) => source.evaluate(grid),
            Self::Composite { sources } => {
                let mut sources = sources.iter();
                let first = sources.next().ok_or(SpectrumError::NoComponents)?;
                sources.try_fold(
                    first.evaluate(grid)?,
                    |sum, source| -> Result<Spectrum, Error> {
                        Ok(sum.plus(&source.evaluate(grid)?)?)
                    },
                )
            }
            Self::Scaled { factor, source } => Ok(source.evaluate(grid)?.scaled(*factor)?),
        }
    }
}

impl From<ConstantSource> for Source {
    fn from(source: ConstantSource) -> Self {
        Self::Constant(source)
    }
}

impl From<Blackbody> for Source {
    fn from(source: Blackbody) -> Self {
        Self::Blackbody(source)
    }
}

impl From<LineSource> for Source {
    fn from(source: LineSource) -> Self {
        Self::Lines(source)
    }
}

impl From<TableSource> for Source {
    fn from(source: TableSource) -> Self {
        Self::Table(source)
    }
}

impl From<IntegratingSphere> for Source {
    fn from(source: IntegratingSphere) -> Self {
        Self::IntegratingSphere(source)
    }
}
