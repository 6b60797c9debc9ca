//! Shared fixtures for the integration tests.

use std::sync::Arc;

use radiosim_core::{Curve, FluxUnit, SpectralGrid, WavelengthUnit};
use radiosim_engine::{
    detector::{DetectorModel, Dispersion},
    optics::OpticalTrain,
    simulator::SimulationConfig,
    source::ConstantSource,
};
use uom::si::{
    f64::{Length, Time},
    length::nanometer,
    time::second,
};

/// Near-infrared working grid, 1.0 to 2.5 µm in 16 channels.
#[must_use]
pub fn nir_grid() -> Arc<SpectralGrid> {
    Arc::new(SpectralGrid::linear(1.0, 2.5, 16, WavelengthUnit::Micrometer).expect("valid grid"))
}

/// A noiseless detector with unit QE, unit geometry, 0.1 nm pixels and a
/// 1 s exposure, so counts equal photon flux density times 1e-10.
#[must_use]
pub fn ideal_detector() -> DetectorModel {
    DetectorModel::new(
        Curve::Constant(1.0),
        Dispersion::Constant(Length::new::<nanometer>(0.1)),
        Time::new::<second>(1.0),
    )
}

/// A flat photon radiance of `value` through `train` onto [`ideal_detector`].
#[must_use]
pub fn flat_config(value: f64, train: OpticalTrain) -> SimulationConfig {
    SimulationConfig::new(
        nir_grid(),
        ConstantSource::new(value, FluxUnit::PhotonRadiance).into(),
        train,
        ideal_detector(),
    )
}
