use radiosim_core::{Curve, SampledCurve};
use uom::si::f64::ThermodynamicTemperature;

use crate::{CalibrationError, Error};

use super::{Emissivity, OpticalElement};

/// A table describing one kind of surface, either directly or through its
/// emissivity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SurfaceResponse {
    Throughput(Curve),

    /// Converted to a throughput of `1 - ε`.
    Emissivity(Curve),
}

impl SurfaceResponse {
    /// The throughput of one surface.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::OutOfUnitRange`] if an emissivity leaves
    /// [0, 1].
    pub fn throughput(&self, label: &str) -> Result<Curve, Error> {
        match self {
            Self::Throughput(curve) => Ok(curve.clone()),
            Self::Emissivity(curve) => {
                let (lowest, highest) = curve.range();
                CalibrationError::unit_range(label, "emissivity", [&lowest, &highest])?;
                Ok(match curve {
                    Curve::Constant(emissivity) => Curve::Constant(1.0 - emissivity),
                    Curve::Sampled(sampled) => SampledCurve::new(
                        sampled.grid().clone(),
                        sampled.values().mapv(|e| 1.0 - e),
                    )?
                    .into(),
                })
            }
        }
    }
}

/// A run of identical surfaces inside a part.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceGroup {
    pub count: u32,
    pub response: SurfaceResponse,
}

/// Grey dust settled on the optical surfaces of a part.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DustCoverage {
    /// Fraction of each mirror covered by dust.
    pub mirror_fraction: f64,

    /// Fraction of each lens covered by dust.
    pub lens_fraction: f64,

    /// Emissivity of the dust itself.
    pub emissivity: f64,
}

impl Default for DustCoverage {
    /// Half a percent of every mirror covered by dust of emissivity 0.5;
    /// lenses clean.
    fn default() -> Self {
        Self {
            mirror_fraction: 0.005,
            lens_fraction: 0.0,
            emissivity: 0.5,
        }
    }
}

/// A warm instrument section made of mirrors and lenses at one temperature.
///
/// A part is a shorthand for a run of Kirchhoff emitters: one grey element
/// for the dust on all its surfaces, then every mirror, then every lens.
/// Elements at a common temperature chain to the same result as a single
/// emitter of the combined throughput `t`, radiating `B(T) (1 - t)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstrumentPart {
    pub label: String,
    pub temperature: ThermodynamicTemperature,
    pub mirrors: Option<SurfaceGroup>,
    pub lenses: Option<SurfaceGroup>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub dust: DustCoverage,

    /// Scales the dust emissivity, for parts whose dusty area differs from
    /// the beam footprint.
    #[cfg_attr(feature = "serde", serde(default = "unit_scaling"))]
    pub area_scaling: f64,
}

#[cfg(feature = "serde")]
fn unit_scaling() -> f64 {
    1.0
}

impl InstrumentPart {
    /// A part with no surfaces and default dust.
    #[must_use]
    pub fn new(label: impl Into<String>, temperature: ThermodynamicTemperature) -> Self {
        Self {
            label: label.into(),
            temperature,
            mirrors: None,
            lenses: None,
            dust: DustCoverage::default(),
            area_scaling: 1.0,
        }
    }

    #[must_use]
    pub fn with_mirrors(self, count: u32, response: SurfaceResponse) -> Self {
        Self {
            mirrors: Some(SurfaceGroup { count, response }),
            ..self
        }
    }

    #[must_use]
    pub fn with_lenses(self, count: u32, response: SurfaceResponse) -> Self {
        Self {
            lenses: Some(SurfaceGroup { count, response }),
            ..self
        }
    }

    #[must_use]
    pub fn with_dust(self, dust: DustCoverage) -> Self {
        Self { dust, ..self }
    }

    #[must_use]
    pub fn with_area_scaling(self, area_scaling: f64) -> Self {
        Self {
            area_scaling,
            ..self
        }
    }

    /// Grey throughput of the dust on every surface of the part.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Calibration`] if a dust parameter leaves [0, 1], the
    /// area scaling is negative, or the scaled dust absorbs more than
    /// everything.
    pub fn dust_transmission(&self) -> Result<f64, Error> {
        let label = self.label.as_str();
        let dust = &self.dust;
        for (quantity, value) in [
            ("dust emissivity", dust.emissivity),
            ("mirror dust fraction", dust.mirror_fraction),
            ("lens dust fraction", dust.lens_fraction),
        ] {
            CalibrationError::unit_range(label, quantity, [&value])?;
        }
        let scaling = CalibrationError::non_negative("dust area scaling", self.area_scaling)?;

        let surviving = |fraction: f64, group: Option<&SurfaceGroup>| {
            let count = group.map_or(0, |g| g.count);
            (1.0 - dust.emissivity * fraction).powf(f64::from(count))
        };
        let mut transmission = surviving(dust.mirror_fraction, self.mirrors.as_ref())
            * surviving(dust.lens_fraction, self.lenses.as_ref());

        if scaling != 1.0 {
            transmission = 1.0 - (1.0 - transmission) * scaling;
            CalibrationError::unit_range(label, "dust transmission", [&transmission])?;
        }
        Ok(transmission)
    }

    /// Expands the part into its emissive elements, in propagation order.
    ///
    /// The dust element is left out when the surfaces are clean.
    ///
    /// # Errors
    ///
    /// See [`InstrumentPart::dust_transmission`] and
    /// [`SurfaceResponse::throughput`].
    pub fn elements(&self) -> Result<Vec<OpticalElement>, Error> {
        let emitter = |label: String, transmission: Curve| {
            OpticalElement::emissive(label, transmission, self.temperature, Emissivity::Kirchhoff)
        };

        let mut elements = Vec::new();
        let dust = self.dust_transmission()?;
        if dust < 1.0 {
            elements.push(emitter(format!("{} dust", self.label), Curve::Constant(dust)));
        }
        for (surface, group) in [("mirror", &self.mirrors), ("lens", &self.lenses)] {
            let Some(group) = group else { continue };
            let throughput = group.response.throughput(&self.label)?;
            elements.extend(
                (1..=group.count)
                    .map(|n| emitter(format!("{} {surface} {n}", self.label), throughput.clone())),
            );
        }
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use radiosim_core::{Extrapolate, SpectralGrid, WavelengthUnit};
    use uom::si::thermodynamic_temperature::kelvin;

    use super::*;

    fn part() -> InstrumentPart {
        InstrumentPart::new("relay", ThermodynamicTemperature::new::<kelvin>(280.0))
    }

    #[test]
    fn default_dust_sits_on_mirrors_only() {
        let part = part()
            .with_mirrors(2, SurfaceResponse::Throughput(Curve::Constant(0.97)))
            .with_lenses(3, SurfaceResponse::Throughput(Curve::Constant(0.99)));
        assert_relative_eq!(
            part.dust_transmission().unwrap(),
            0.9975_f64.powi(2),
            max_relative = 1e-12
        );

        let scaled = part.with_area_scaling(4.0);
        assert_relative_eq!(
            scaled.dust_transmission().unwrap(),
            1.0 - 4.0 * (1.0 - 0.9975_f64.powi(2)),
            max_relative = 1e-12
        );
    }

    #[test]
    fn overscaled_dust_is_rejected() {
        let part = part()
            .with_mirrors(1, SurfaceResponse::Throughput(Curve::Constant(0.97)))
            .with_dust(DustCoverage {
                mirror_fraction: 0.5,
                ..DustCoverage::default()
            })
            .with_area_scaling(10.0);
        assert!(matches!(
            part.dust_transmission(),
            Err(Error::Calibration(CalibrationError::OutOfUnitRange {
                quantity: "dust transmission",
                ..
            }))
        ));
    }

    #[test]
    fn expands_into_dust_then_surfaces() {
        let part = part()
            .with_mirrors(2, SurfaceResponse::Throughput(Curve::Constant(0.97)))
            .with_lenses(1, SurfaceResponse::Emissivity(Curve::Constant(0.02)));
        let elements = part.elements().unwrap();

        let labels: Vec<_> = elements.iter().map(OpticalElement::label).collect();
        assert_eq!(labels, ["relay dust", "relay mirror 1", "relay mirror 2", "relay lens 1"]);
        let Curve::Constant(lens) = elements[3].transfer_curve() else {
            panic!("expected a constant lens throughput");
        };
        assert_relative_eq!(*lens, 0.98, max_relative = 1e-12);

        let clean = self::part().elements().unwrap();
        assert!(clean.is_empty());
    }

    #[test]
    fn emissivity_tables_become_throughput() {
        let grid = SpectralGrid::linear(1.0, 3.0, 3, WavelengthUnit::Micrometer).unwrap();
        let emissivity =
            Curve::sampled(array![1.0, 2.0], array![0.1, 0.3], WavelengthUnit::Micrometer)
                .unwrap();
        let throughput = SurfaceResponse::Emissivity(emissivity)
            .throughput("lens")
            .unwrap()
            .sample(&grid, Extrapolate::ZERO)
            .unwrap();
        assert_relative_eq!(throughput[0], 0.9, max_relative = 1e-12);
        assert_relative_eq!(throughput[1], 0.7, max_relative = 1e-12);
        assert_eq!(throughput[2], 0.0);

        let err = SurfaceResponse::Emissivity(Curve::Constant(1.5))
            .throughput("lens")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Calibration(CalibrationError::OutOfUnitRange { value, .. }) if value == 1.5
        ));
    }
}
