//! Optical elements and their composition into a train.
//!
//! Element kinds form a closed set dispatched by `match`; adding a kind is a
//! compile error at every propagation step until it is handled.

mod element;
mod part;
mod sky;
mod train;

pub use element::{ElementKind, ElementResponse, Emissivity, OpticalElement};
pub use part::{DustCoverage, InstrumentPart, SurfaceGroup, SurfaceResponse};
pub use sky::SkyTransmission;
pub use train::{OpticalTrain, Propagation, StageEvent};
