use std::{f64::consts::PI, sync::Arc};

use ndarray::{Array1, Zip};
use radiosim_core::{Curve, Extrapolate, FluxUnit, SpectralGrid, Spectrum};
use uom::si::{
    area::square_meter,
    f64::{Area, Length},
    length::meter,
};

use crate::{CalibrationError, Error, SpectrumSource};

use super::Lamp;

/// Uniform radiance at the exit port of an integrating sphere fed by lamps.
///
/// Light bounces around the sphere until it is absorbed by the walls or
/// leaves through a port, which raises the wall radiance by the sphere
/// multiplier `ρ / (1 - ρ (1 - f))`, with `ρ` the wall reflectance and `f`
/// the fraction of the sphere surface open to ports. The exit radiance is
///
/// ```text
/// L(λ) = Φ(λ) ρ(λ) / (π A (1 - ρ(λ) (1 - f)))
/// ```
///
/// for a total lamp spectral power `Φ` and sphere surface area `A`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntegratingSphere {
    pub radius: Length,

    /// Total area of the ports cut into the sphere wall.
    pub port_area: Area,

    /// Reflectance of the wall coating. Zero outside a tabulated range.
    pub reflectance: Curve,

    #[cfg_attr(feature = "serde", serde(default))]
    pub lamps: Vec<Lamp>,
}

impl IntegratingSphere {
    /// A sphere with no lamps.
    #[must_use]
    pub fn new(radius: Length, port_area: Area, reflectance: Curve) -> Self {
        Self {
            radius,
            port_area,
            reflectance,
            lamps: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_lamp(mut self, lamp: Lamp) -> Self {
        self.lamps.push(lamp);
        self
    }

    /// Inner surface area of the sphere, `4πr²`.
    #[must_use]
    pub fn sphere_area(&self) -> Area {
        self.radius * self.radius * (4.0 * PI)
    }

    /// Fraction of the sphere surface open to ports.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Calibration`] if the radius is not positive or the
    /// ports do not leave any wall.
    pub fn port_fraction(&self) -> Result<f64, Error> {
        CalibrationError::positive("sphere radius", self.radius.get::<meter>())?;
        let sphere = self.sphere_area().get::<square_meter>();
        let ports = CalibrationError::non_negative(
            "sphere port area",
            self.port_area.get::<square_meter>(),
        )?;
        if ports >= sphere {
            return Err(CalibrationError::InvalidParameter {
                name: "sphere port area",
                value: ports,
            }
            .into());
        }
        Ok(ports / sphere)
    }

    /// Total spectral power of every lamp on `grid`, W·m⁻¹.
    fn lamp_power(&self, grid: &SpectralGrid) -> Result<Array1<f64>, Error> {
        self.lamps
            .iter()
            .try_fold(Array1::zeros(grid.len()), |total, lamp| -> Result<_, Error> {
                Ok(total + lamp.spectral_power_on(grid)?)
            })
    }
}

impl SpectrumSource for IntegratingSphere {
    fn evaluate(&self, grid: &Arc<SpectralGrid>) -> Result<Spectrum, Error> {
        let port_fraction = self.port_fraction()?;
        let reflectance = self.reflectance.sample(grid, Extrapolate::ZERO)?;
        CalibrationError::unit_range("integrating sphere", "wall reflectance", &reflectance)?;
        if port_fraction == 0.0 && reflectance.iter().any(|&rho| rho == 1.0) {
            return Err(CalibrationError::InvalidParameter {
                name: "closed sphere wall reflectance",
                value: 1.0,
            }
            .into());
        }

        let area = self.sphere_area().get::<square_meter>();
        let power = self.lamp_power(grid)?;
        log::debug!(
            "integrating sphere: {} lamp(s), port fraction {port_fraction:.3e}",
            self.lamps.len()
        );

        let radiance = Zip::from(&power)
            .and(&reflectance)
            .map_collect(|&phi, &rho| {
                phi * rho / (PI * area * (1.0 - rho * (1.0 - port_fraction)))
            });
        Ok(Spectrum::new(
            Arc::clone(grid),
            radiance,
            FluxUnit::SpectralRadiance,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use radiosim_core::WavelengthUnit;
    use uom::si::{f64::Power, power::watt};

    use super::*;

    fn grid() -> Arc<SpectralGrid> {
        Arc::new(SpectralGrid::linear(1.0, 2.0, 3, WavelengthUnit::Micrometer).unwrap())
    }

    fn sphere(port_area: f64, reflectance: Curve) -> IntegratingSphere {
        IntegratingSphere::new(
            Length::new::<meter>(0.1),
            Area::new::<square_meter>(port_area),
            reflectance,
        )
    }

    #[test]
    fn multiplies_lamp_power_by_the_sphere_gain() {
        let lamp =
            Lamp::new("QTH", Curve::Constant(1.0e6)).with_rating(Power::new::<watt>(50.0));
        let source = sphere(0.01, Curve::Constant(0.98))
            .with_lamp(lamp.clone())
            .with_lamp(lamp.adjusted_to(Power::new::<watt>(25.0)).unwrap());

        let area = 4.0 * PI * 0.01;
        let fraction = 0.01 / area;
        assert_relative_eq!(source.port_fraction().unwrap(), fraction, max_relative = 1e-12);

        let expected = 1.5e6 * 0.98 / (PI * area * (1.0 - 0.98 * (1.0 - fraction)));
        let spectrum = source.evaluate(&grid()).unwrap();
        assert_eq!(spectrum.unit(), FluxUnit::SpectralRadiance);
        for &value in spectrum.values() {
            assert_relative_eq!(value, expected, max_relative = 1e-12);
        }
    }

    #[test]
    fn dark_outside_the_coating_data() {
        let coating =
            Curve::sampled(array![1.0, 1.5], array![0.95, 0.95], WavelengthUnit::Micrometer)
                .unwrap();
        let source = sphere(0.01, coating).with_lamp(Lamp::new("QTH", Curve::Constant(1.0)));

        let spectrum = source.evaluate(&grid()).unwrap();
        assert!(spectrum.values()[0] > 0.0);
        assert!(spectrum.values()[1] > 0.0);
        assert_eq!(spectrum.values()[2], 0.0);
    }

    #[test]
    fn without_lamps_the_sphere_is_dark() {
        let spectrum = sphere(0.01, Curve::Constant(0.9))
            .evaluate(&grid())
            .unwrap();
        assert!(spectrum.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn rejects_impossible_geometry() {
        let oversized = sphere(1.0, Curve::Constant(0.9));
        assert!(matches!(
            oversized.evaluate(&grid()),
            Err(Error::Calibration(CalibrationError::InvalidParameter {
                name: "sphere port area",
                ..
            }))
        ));

        let closed_mirror = sphere(0.0, Curve::Constant(1.0));
        assert!(matches!(
            closed_mirror.evaluate(&grid()),
            Err(Error::Calibration(CalibrationError::InvalidParameter { .. }))
        ));

        let bad_coating = sphere(0.01, Curve::Constant(1.2));
        assert!(matches!(
            bad_coating.evaluate(&grid()),
            Err(Error::Calibration(CalibrationError::OutOfUnitRange { .. }))
        ));
    }
}
