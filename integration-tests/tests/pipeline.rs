use std::sync::Arc;

use approx::assert_relative_eq;
use integration_tests::{flat_config, ideal_detector, nir_grid};
use ndarray::{Array1, array};
use radiosim_core::{
    Curve, Extrapolate, FluxUnit, SpectralGrid, WavelengthUnit, radiometry::planck_radiance,
};
use radiosim_engine::{
    ErrorKind, NoiseModel,
    detector::ReadNoise,
    optics::{Emissivity, OpticalElement, OpticalTrain},
    simulator::{PipelineStage, SimulationConfig, Simulator, simulate_unobserved, sweep},
    source::{ConstantSource, SpectrumSource, TableSource},
};
use uom::si::{
    f64::{Frequency, ThermodynamicTemperature, Time},
    frequency::hertz,
    thermodynamic_temperature::kelvin,
    time::second,
};

fn kelvins(t: f64) -> ThermodynamicTemperature {
    ThermodynamicTemperature::new::<kelvin>(t)
}

#[test]
fn resampling_onto_the_same_grid_is_identity() {
    let grid = SpectralGrid::logarithmic(1.0, 2.5, 9, WavelengthUnit::Micrometer).unwrap();
    let values = grid.samples().mapv(|wl| wl.powi(3) - wl);
    let resampled = grid.resample(&values, &grid, Extrapolate::Error).unwrap();
    assert_eq!(resampled, values);

    let table = TableSource::new(
        grid.samples().clone(),
        values.clone(),
        WavelengthUnit::Micrometer,
        FluxUnit::SpectralRadiance,
    )
    .unwrap();
    let evaluated = table.evaluate(&Arc::new(grid)).unwrap();
    assert_eq!(evaluated.values(), &values);
}

#[test]
fn transmissive_train_multiplies_efficiencies() {
    let train = OpticalTrain::new()
        .with(OpticalElement::transmissive("fiber", Curve::Constant(0.9)))
        .with(OpticalElement::reflective("grating", Curve::Constant(0.6)))
        .with(OpticalElement::transmissive("filter", Curve::Constant(0.8)));

    let result = simulate_unobserved(&flat_config(1e12, train)).unwrap();
    for i in 0..result.grid.len() {
        assert_relative_eq!(result.throughput[i], 0.432, max_relative = 1e-12);
        assert_relative_eq!(result.delivered_signal.values()[i], 0.432e12, max_relative = 1e-12);
        assert_eq!(result.delivered_background.values()[i], 0.0);
        assert_eq!(result.background()[i], 0.0);
    }
}

#[test]
fn last_element_emission_is_unattenuated() {
    let emissivity = 0.3;
    let train = OpticalTrain::new()
        .with(OpticalElement::transmissive("filter", Curve::Constant(0.5)))
        .with(OpticalElement::emissive(
            "window",
            Curve::Constant(0.7),
            kelvins(300.0),
            Emissivity::Curve(Curve::Constant(emissivity)),
        ));

    let result = simulate_unobserved(&flat_config(0.0, train)).unwrap();
    let wl = result.grid.wavelengths_m();
    for i in 0..wl.len() {
        assert_relative_eq!(
            result.delivered_background.values()[i],
            emissivity * planck_radiance(wl[i], 300.0),
            max_relative = 1e-12
        );
    }
}

#[test]
fn two_element_worked_example() {
    let emissivity = Curve::Constant(0.5);
    let train = OpticalTrain::new()
        .with(OpticalElement::emissive(
            "warm relay",
            Curve::Constant(0.5),
            kelvins(290.0),
            Emissivity::Curve(emissivity),
        ))
        .with(OpticalElement::transmissive("filter", Curve::Constant(0.8)));

    let config: SimulationConfig = SimulationConfig::new(
        nir_grid(),
        ConstantSource::new(2.0e3, FluxUnit::SpectralRadiance).into(),
        train,
        ideal_detector(),
    );
    let result = simulate_unobserved(&config).unwrap();

    let wl = result.grid.wavelengths_m();
    for i in 0..wl.len() {
        let b1 = 0.5 * planck_radiance(wl[i], 290.0);
        assert_relative_eq!(
            result.delivered_background.values()[i],
            0.8 * b1,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            result.delivered_signal.values()[i],
            0.4 * 2.0e3,
            max_relative = 1e-12
        );
    }
}

#[test]
fn shot_noise_of_signal_and_background() {
    let model = NoiseModel::new(Frequency::new::<hertz>(0.0), 0.0, Time::new::<second>(1.0), 1)
        .unwrap();
    let noise = model.noise(&array![100.0], &array![50.0]).unwrap();
    assert_relative_eq!(noise[0], 150.0_f64.sqrt(), max_relative = 1e-12);
}

#[test]
fn coadds_scale_counts_and_read_noise() {
    let train =
        OpticalTrain::new().with(OpticalElement::transmissive("fiber", Curve::Constant(1.0)));
    let faint = |coadds| {
        let config = flat_config(1e11, train.clone());
        let detector = config
            .detector
            .clone()
            .with_read_noise(ReadNoise::Constant(50.0))
            .with_coadds(coadds);
        simulate_unobserved(&config.with_detector(detector)).unwrap()
    };

    let single = faint(1);
    let stacked = faint(9);
    assert_relative_eq!(stacked.noise.read, 3.0 * single.noise.read, max_relative = 1e-12);
    for i in 0..single.grid.len() {
        assert_relative_eq!(stacked.signal()[i], 9.0 * single.signal()[i], max_relative = 1e-12);
        // Read-noise dominated: SNR grows close to √9.
        assert!(stacked.snr[i] > single.snr[i]);
        assert_relative_eq!(stacked.snr[i] / single.snr[i], 3.0, max_relative = 1e-2);
    }
}

#[test]
fn empty_train_is_an_error() {
    let mut simulator = Simulator::new(flat_config(1.0, OpticalTrain::new()));
    let failure = simulator.run().unwrap_err();
    assert_eq!(failure.stage, PipelineStage::Train);
    assert_eq!(failure.kind(), ErrorKind::EmptyTrain);
    assert_eq!(failure.kind().exit_code(), 4);
    assert!(simulator.result().is_none());
}

#[test]
fn runs_are_deterministic() {
    let train = OpticalTrain::new()
        .with(OpticalElement::emissive(
            "window",
            Curve::Constant(0.95),
            kelvins(280.0),
            Emissivity::Kirchhoff,
        ))
        .with(OpticalElement::reflective("grating", Curve::Constant(0.7)));
    let configs: Vec<_> = [1e10, 1e11, 1e12]
        .into_iter()
        .map(|value| flat_config(value, train.clone()))
        .collect();

    let parallel = sweep(&configs);
    for (config, swept) in configs.iter().zip(parallel) {
        let mut simulator = Simulator::new(config.clone());
        let first = simulator.run().unwrap();
        let again = simulator.run().unwrap();
        assert_eq!(first, again);
        assert_eq!(*first, swept.unwrap());
    }
}

#[test]
fn repeated_surfaces_compound() {
    let mirror = OpticalElement::reflective("silver", Curve::Constant(0.97));
    let mut train = OpticalTrain::new();
    train.push_repeated(&mirror, 5);

    let result = simulate_unobserved(&flat_config(1.0, train)).unwrap();
    let expected: Array1<f64> = Array1::from_elem(result.grid.len(), 0.97_f64.powi(5));
    for (actual, expected) in result.throughput.iter().zip(&expected) {
        assert_relative_eq!(*actual, *expected, max_relative = 1e-12);
    }
}
