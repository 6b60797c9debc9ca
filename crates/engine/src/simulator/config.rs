use std::sync::Arc;

use radiosim_core::SpectralGrid;

use crate::{detector::DetectorModel, optics::OpticalTrain, source::Source};

/// Everything a simulation run needs, fixed before the run starts.
///
/// A configuration is an immutable value: the simulator keeps it behind an
/// [`Arc`] and parallel sweeps share it between threads.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig<S = Source> {
    /// Working wavelength grid.
    pub grid: Arc<SpectralGrid>,

    /// The observed target.
    pub source: S,

    /// Radiance entering the train alongside the target, e.g. sky emission.
    pub background: Option<S>,

    pub train: OpticalTrain,

    pub detector: DetectorModel,
}

impl<S> SimulationConfig<S> {
    #[must_use]
    pub fn new(
        grid: impl Into<Arc<SpectralGrid>>,
        source: S,
        train: OpticalTrain,
        detector: DetectorModel,
    ) -> Self {
        Self {
            grid: grid.into(),
            source,
            background: None,
            train,
            detector,
        }
    }

    #[must_use]
    pub fn with_background(self, background: S) -> Self {
        Self {
            background: Some(background),
            ..self
        }
    }

    /// The same setup with a different detector, e.g. for an exposure sweep.
    #[must_use]
    pub fn with_detector(self, detector: DetectorModel) -> Self {
        Self { detector, ..self }
    }
}
