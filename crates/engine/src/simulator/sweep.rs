use rayon::prelude::*;

use crate::source::SpectrumSource;

use super::{SimulationConfig, SimulationFailure, SimulationResult, simulate_unobserved};

/// Runs independent configurations in parallel.
///
/// Results keep the order of `configs`. Each run fails or succeeds on its
/// own; one failure does not stop the others.
#[must_use]
pub fn sweep<S: SpectrumSource>(
    configs: &[SimulationConfig<S>],
) -> Vec<Result<SimulationResult, SimulationFailure>> {
    log::debug!("sweeping {} configurations", configs.len());
    configs
        .par_iter()
        .map(|config| simulate_unobserved(config))
        .collect()
}
