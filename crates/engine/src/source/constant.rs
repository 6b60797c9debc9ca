use std::sync::Arc;

use radiosim_core::{FluxUnit, SpectralGrid, Spectrum};

use crate::{Error, SpectrumSource};

/// A flat spectrum, used for calibration and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstantSource {
    pub value: f64,
    pub unit: FluxUnit,
}

impl ConstantSource {
    #[must_use]
    pub fn new(value: f64, unit: FluxUnit) -> Self {
        Self { value, unit }
    }
}

impl SpectrumSource for ConstantSource {
    fn evaluate(&self, grid: &Arc<SpectralGrid>) -> Result<Spectrum, Error> {
        Ok(Spectrum::from_fn(Arc::clone(grid), self.unit, |_| self.value)?)
    }
}
