use std::sync::Arc;

use ndarray::{Array1, Zip};
use radiosim_core::{SpectralGrid, Spectrum};
use uom::si::{
    f64::{Length, Time},
    time::second,
};

use crate::{detector::Detection, noise::NoiseBudget};

/// Everything computed by a completed run.
///
/// Counts are in electrons accumulated over every coadd unless noted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SimulationResult {
    pub grid: Arc<SpectralGrid>,

    /// The source as evaluated on the grid.
    pub incident_signal: Spectrum,

    /// The background source as evaluated on the grid, if any.
    pub incident_background: Option<Spectrum>,

    /// End-to-end throughput of the optical train.
    pub throughput: Array1<f64>,

    /// Source flux reaching the detector.
    pub delivered_signal: Spectrum,

    /// Background radiance reaching the detector.
    pub delivered_background: Spectrum,

    pub detection: Detection,

    /// Dark counts per channel, identical in every channel.
    pub dark: f64,

    pub noise: NoiseBudget,

    /// Signal-to-noise ratio per channel; see [`NoiseBudget::snr`] for
    /// noiseless channels.
    pub snr: Array1<f64>,

    pub exposure_time: Time,
    pub coadds: u32,

    /// Electrons per ADU.
    pub gain: f64,

    pub full_well: Option<f64>,
}

/// One row of a result table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub index: usize,
    pub wavelength: Length,
    pub signal: f64,
    pub background: f64,
    pub noise: f64,
    pub snr: f64,
}

impl SimulationResult {
    /// Signal counts per channel.
    #[must_use]
    pub fn signal(&self) -> &Array1<f64> {
        &self.detection.signal
    }

    /// Background counts per channel.
    #[must_use]
    pub fn background(&self) -> &Array1<f64> {
        &self.detection.background
    }

    /// Total noise per channel.
    #[must_use]
    pub fn total_noise(&self) -> &Array1<f64> {
        &self.noise.total
    }

    /// Iterates over the channels in grid order.
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        (0..self.grid.len()).map(|index| Channel {
            index,
            wavelength: self.grid.wavelength(index),
            signal: self.detection.signal[index],
            background: self.detection.background[index],
            noise: self.noise.total[index],
            snr: self.snr[index],
        })
    }

    /// Signal converted to ADU through the detector gain.
    #[must_use]
    pub fn signal_adu(&self) -> Array1<f64> {
        &self.detection.signal / self.gain
    }

    /// Expected counts in a single read: signal, background and dark.
    #[must_use]
    pub fn counts_per_read(&self) -> Array1<f64> {
        let n = f64::from(self.coadds);
        Zip::from(&self.detection.signal)
            .and(&self.detection.background)
            .map_collect(|&s, &b| (s + b + self.dark) / n)
    }

    /// Noise-free single-read exposure time at which the brightest channel
    /// collects `count_limit` electrons.
    ///
    /// Returns `None` if nothing is detected or the limit is not positive.
    #[must_use]
    pub fn exposure_to_reach(&self, count_limit: f64) -> Option<Time> {
        let peak = self
            .counts_per_read()
            .iter()
            .copied()
            .fold(0.0_f64, f64::max);
        if peak <= 0.0 || count_limit.is_nan() || count_limit <= 0.0 {
            return None;
        }
        let per_second = peak / self.exposure_time.get::<second>();
        Some(Time::new::<second>(count_limit / per_second))
    }

    /// Channels whose single-read counts reach the full well.
    ///
    /// Empty when no full well is configured.
    #[must_use]
    pub fn saturated_channels(&self) -> Vec<usize> {
        let Some(full_well) = self.full_well else {
            return Vec::new();
        };
        self.counts_per_read()
            .iter()
            .enumerate()
            .filter_map(|(i, &counts)| (counts >= full_well).then_some(i))
            .collect()
    }

    /// Index and value of the highest signal-to-noise ratio.
    #[must_use]
    pub fn peak_snr(&self) -> Option<(usize, f64)> {
        self.snr
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use radiosim_core::{Curve, FluxUnit, WavelengthUnit};
    use uom::si::{f64::Length, length::nanometer};

    use super::*;
    use crate::{
        detector::{DetectorModel, Dispersion},
        optics::{OpticalElement, OpticalTrain},
        simulator::{SimulationConfig, simulate_unobserved},
        source::ConstantSource,
    };

    /// Signal of 100 e⁻ per read in the last channel, ramping up from 0.
    fn result(coadds: u32, full_well: Option<f64>) -> SimulationResult {
        let grid = SpectralGrid::linear(1.0, 2.0, 3, WavelengthUnit::Micrometer).unwrap();
        let qe = Curve::sampled(
            ndarray::array![1.0, 2.0],
            ndarray::array![0.0, 1.0],
            WavelengthUnit::Micrometer,
        )
        .unwrap();
        let mut detector = DetectorModel::new(
            qe,
            Dispersion::Constant(Length::new::<nanometer>(1.0)),
            Time::new::<second>(10.0),
        )
        .with_coadds(coadds)
        .with_gain(2.0);
        detector.full_well = full_well;

        let source = ConstantSource::new(1e10, FluxUnit::PhotonIrradiance);
        let train =
            OpticalTrain::new().with(OpticalElement::transmissive("fiber", Curve::Constant(1.0)));
        simulate_unobserved(&SimulationConfig::new(grid, source, train, detector)).unwrap()
    }

    #[test]
    fn adu_and_channels() {
        let result = result(1, None);
        assert_relative_eq!(result.signal()[2], 100.0, max_relative = 1e-12);
        assert_relative_eq!(result.signal_adu()[2], 50.0, max_relative = 1e-12);

        let channels: Vec<_> = result.channels().collect();
        assert_eq!(channels.len(), 3);
        assert_eq!(channels[0].snr, 0.0);
        assert_relative_eq!(channels[2].snr, 10.0, max_relative = 1e-12);
        assert_relative_eq!(
            channels[1].wavelength.get::<nanometer>(),
            1500.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn exposure_to_reach_scales_from_single_read() {
        let result = result(4, None);
        // 100 e⁻ per 10 s read in the brightest channel.
        let time = result.exposure_to_reach(1000.0).unwrap();
        assert_relative_eq!(time.get::<second>(), 100.0, max_relative = 1e-12);
        assert!(result.exposure_to_reach(0.0).is_none());
    }

    #[test]
    fn saturation_uses_single_read_counts() {
        assert!(result(1, None).saturated_channels().is_empty());
        assert_eq!(result(3, Some(80.0)).saturated_channels(), vec![2]);
        assert!(result(3, Some(150.0)).saturated_channels().is_empty());
    }

    #[test]
    fn peak_snr_finds_brightest_channel() {
        let (index, snr) = result(4, None).peak_snr().unwrap();
        assert_eq!(index, 2);
        // 400 e⁻ over four coadds.
        assert_relative_eq!(snr, 20.0, max_relative = 1e-12);
    }
}
