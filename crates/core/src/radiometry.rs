//! Radiometric constants and the Planck law.
//!
//! Spectral functions take raw SI values (wavelength in metres, temperature
//! in kelvin) so they can be mapped over grid samples; quantities that cross
//! the public API are `uom` types.

use uom::si::{
    f64::{Length, ThermodynamicTemperature},
    length::meter,
    thermodynamic_temperature::kelvin,
};

/// Speed of light in vacuum, m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Planck constant, J·s.
pub const PLANCK: f64 = 6.626_070_15e-34;

/// Boltzmann constant, J/K.
pub const BOLTZMANN: f64 = 1.380_649e-23;

/// Wien displacement constant, m·K.
pub const WIEN: f64 = 2.897_771_955e-3;

/// Proton mass, kg. Species masses are given in units of this.
pub const PROTON_MASS: f64 = 1.672_621_9e-27;

/// Spectral radiance of a black body, W·m⁻²·sr⁻¹·m⁻¹.
///
/// Returns zero at (or below) absolute zero and wherever the exponent
/// overflows.
#[must_use]
pub fn planck_radiance(wavelength_m: f64, temperature_k: f64) -> f64 {
    if temperature_k <= 0.0 || wavelength_m <= 0.0 {
        return 0.0;
    }
    let x = PLANCK * SPEED_OF_LIGHT / (wavelength_m * BOLTZMANN * temperature_k);
    let denom = x.exp_m1();
    if !denom.is_finite() {
        return 0.0;
    }
    2.0 * PLANCK * SPEED_OF_LIGHT.powi(2) / wavelength_m.powi(5) / denom
}

/// Spectral photon radiance of a black body, s⁻¹·m⁻²·sr⁻¹·m⁻¹.
#[must_use]
pub fn planck_photon_radiance(wavelength_m: f64, temperature_k: f64) -> f64 {
    planck_radiance(wavelength_m, temperature_k) / photon_energy(wavelength_m)
}

/// Energy of a single photon, J.
#[must_use]
pub fn photon_energy(wavelength_m: f64) -> f64 {
    PLANCK * SPEED_OF_LIGHT / wavelength_m
}

/// Wavelength at which a black body at `temperature` peaks.
///
/// Returns `None` at absolute zero.
#[must_use]
pub fn wien_peak(temperature: ThermodynamicTemperature) -> Option<Length> {
    let t = temperature.get::<kelvin>();
    (t > 0.0).then(|| Length::new::<meter>(WIEN / t))
}
