//! End-to-end simulation of one spectrograph exposure.
//!
//! A run evaluates the source on the working grid, propagates it through
//! the optical train, converts the delivered flux to counts and computes
//! the noise budget:
//!
//! ```text
//! source ─▶ train ─▶ detector ─▶ noise ─▶ SNR
//! ```
//!
//! # Example
//!
//! ```ignore
//! use radiosim_engine::simulator::{SimulationConfig, Simulator};
//!
//! let mut simulator = Simulator::new(SimulationConfig::new(grid, source, train, detector));
//! let result = simulator.run()?;
//!
//! for channel in result.channels() {
//!     println!("{:?}: SNR {}", channel.wavelength, channel.snr);
//! }
//! ```

mod config;
mod event;
mod failure;
mod result;
mod sweep;

pub use config::SimulationConfig;
pub use event::SimulationEvent;
pub use failure::{PipelineStage, SimulationFailure};
pub use result::{Channel, SimulationResult};
pub use sweep::sweep;

use std::sync::Arc;

use radiosim_core::Observer;

use crate::{
    optics::StageEvent,
    source::{Source, SpectrumSource},
};

use failure::InStage;

/// Lifecycle of a [`Simulator`].
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationState {
    /// Ready to run; no result yet.
    Configured,

    /// A run is in progress.
    Running,

    /// The last run completed.
    Completed(Arc<SimulationResult>),

    /// The last run failed; no partial result is kept.
    Failed(SimulationFailure),
}

/// Owns a configuration and the outcome of its latest run.
///
/// Running again recomputes everything from the configuration, so repeated
/// runs yield identical results.
#[derive(Debug, Clone)]
pub struct Simulator<S = Source> {
    config: Arc<SimulationConfig<S>>,
    state: SimulationState,
}

impl<S: SpectrumSource> Simulator<S> {
    #[must_use]
    pub fn new(config: SimulationConfig<S>) -> Self {
        Self::from_shared(Arc::new(config))
    }

    /// A simulator sharing a configuration with other simulators.
    #[must_use]
    pub fn from_shared(config: Arc<SimulationConfig<S>>) -> Self {
        Self {
            config,
            state: SimulationState::Configured,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Arc<SimulationConfig<S>> {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// The result of the last run, if it completed.
    #[must_use]
    pub fn result(&self) -> Option<&Arc<SimulationResult>> {
        match &self.state {
            SimulationState::Completed(result) => Some(result),
            _ => None,
        }
    }

    /// Runs the simulation without observation.
    ///
    /// # Errors
    ///
    /// Returns the [`SimulationFailure`] of the first failing step. The same
    /// failure is kept as the simulator's state.
    pub fn run(&mut self) -> Result<Arc<SimulationResult>, SimulationFailure> {
        self.run_observed(())
    }

    /// Runs the simulation, reporting each step to `observer`.
    ///
    /// # Errors
    ///
    /// See [`Simulator::run`].
    pub fn run_observed<O>(
        &mut self,
        observer: O,
    ) -> Result<Arc<SimulationResult>, SimulationFailure>
    where
        O: for<'a> Observer<SimulationEvent<'a>>,
    {
        self.state = SimulationState::Running;
        match simulate(&self.config, observer) {
            Ok(result) => {
                let result = Arc::new(result);
                self.state = SimulationState::Completed(Arc::clone(&result));
                Ok(result)
            }
            Err(failure) => {
                self.state = SimulationState::Failed(failure.clone());
                Err(failure)
            }
        }
    }
}

/// Runs one simulation from a configuration.
///
/// # Algorithm
///
/// 1. Evaluate the source and optional background on the grid.
/// 2. Propagate both through the optical train; every element attenuates
///    what reaches it and emissive elements add their own radiance.
/// 3. Convert the delivered signal and background to counts per channel.
/// 4. Combine shot, dark and read noise and compute the SNR.
///
/// # Observer
///
/// The observer receives a [`SimulationEvent`] after each step, including
/// one per optical element.
///
/// # Errors
///
/// Returns the first error raised, tagged with the [`PipelineStage`] that
/// raised it.
pub fn simulate<S, O>(
    config: &SimulationConfig<S>,
    mut observer: O,
) -> Result<SimulationResult, SimulationFailure>
where
    S: SpectrumSource,
    O: for<'a> Observer<SimulationEvent<'a>>,
{
    let SimulationConfig {
        grid,
        source,
        background,
        train,
        detector,
    } = config;
    log::debug!(
        "simulating {} channels through {} elements",
        grid.len(),
        train.len()
    );

    let incident_signal = source.evaluate(grid).in_stage(PipelineStage::Source)?;
    let incident_background = background
        .as_ref()
        .map(|background| background.evaluate(grid))
        .transpose()
        .in_stage(PipelineStage::Background)?;
    observer.observe(&SimulationEvent::SourceEvaluated {
        signal: &incident_signal,
        background: incident_background.as_ref(),
    });

    let propagation = train
        .propagate_observed(
            &incident_signal,
            incident_background.as_ref(),
            |event: &StageEvent<'_>| observer.observe(&SimulationEvent::Stage(*event)),
        )
        .in_stage(PipelineStage::Train)?;

    let detection = detector
        .detect(&propagation.signal, &propagation.background)
        .in_stage(PipelineStage::Detector)?;
    observer.observe(&SimulationEvent::Detected(&detection));

    let noise_model = detector.noise_model().in_stage(PipelineStage::Noise)?;
    let noise = noise_model
        .budget(&detection.signal, &detection.background)
        .in_stage(PipelineStage::Noise)?;
    let snr = noise.snr(&detection.signal);

    let result = SimulationResult {
        grid: Arc::clone(grid),
        incident_signal,
        incident_background,
        throughput: propagation.throughput,
        delivered_signal: propagation.signal,
        delivered_background: propagation.background,
        dark: noise_model.dark_counts(),
        noise,
        snr,
        detection,
        exposure_time: detector.exposure_time,
        coadds: detector.coadds,
        gain: detector.gain,
        full_well: detector.full_well,
    };
    log::debug!(
        "simulation finished, peak SNR {:?}",
        result.peak_snr().map(|(_, snr)| snr)
    );
    observer.observe(&SimulationEvent::Finished(&result));
    Ok(result)
}

/// Runs one simulation without observation.
///
/// This is a convenience wrapper around [`simulate`] that discards events.
///
/// # Errors
///
/// See [`simulate`].
pub fn simulate_unobserved<S: SpectrumSource>(
    config: &SimulationConfig<S>,
) -> Result<SimulationResult, SimulationFailure> {
    simulate(config, ())
}
