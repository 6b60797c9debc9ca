use radiosim_core::Spectrum;

use crate::{detector::Detection, optics::StageEvent};

use super::SimulationResult;

/// Progress reported to an observer during a run, in pipeline order.
#[derive(Debug, Clone, Copy)]
pub enum SimulationEvent<'a> {
    /// The source, and background if configured, were evaluated on the grid.
    SourceEvaluated {
        signal: &'a Spectrum,
        background: Option<&'a Spectrum>,
    },

    /// One optical element was applied.
    Stage(StageEvent<'a>),

    /// Flux was converted to counts.
    Detected(&'a Detection),

    /// The run completed.
    Finished(&'a SimulationResult),
}
