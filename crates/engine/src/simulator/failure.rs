use std::fmt;

use thiserror::Error;

use crate::{Error, ErrorKind};

/// Pipeline step that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Source,
    Background,
    Train,
    Detector,
    Noise,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Background => "background",
            Self::Train => "optical train",
            Self::Detector => "detector",
            Self::Noise => "noise",
        })
    }
}

/// The first error of a failed run and where it happened.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} failed: {error}")]
pub struct SimulationFailure {
    pub stage: PipelineStage,
    #[source]
    pub error: Error,
}

impl SimulationFailure {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Tags the error of a pipeline step with its stage.
pub(crate) trait InStage<T> {
    fn in_stage(self, stage: PipelineStage) -> Result<T, SimulationFailure>;
}

impl<T, E: Into<Error>> InStage<T> for Result<T, E> {
    fn in_stage(self, stage: PipelineStage) -> Result<T, SimulationFailure> {
        self.map_err(|error| SimulationFailure {
            stage,
            error: error.into(),
        })
    }
}
