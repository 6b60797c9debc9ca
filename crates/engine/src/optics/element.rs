use std::sync::Arc;

use ndarray::{Array1, Zip};
use radiosim_core::{
    Curve, Extrapolate, FluxUnit, SpectralGrid, Spectrum, radiometry::planck_radiance,
};
use uom::si::{f64::ThermodynamicTemperature, thermodynamic_temperature::kelvin};

use crate::{CalibrationError, Error};

/// Tolerance on `t + ε ≤ 1` absorbing round-off in tabulated curves.
const ENERGY_BALANCE_TOLERANCE: f64 = 1e-9;

/// Kind of an optical element, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ElementKind {
    Transmissive,
    Reflective,
    Emissive,
}

/// How an emissive element radiates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Emissivity {
    /// Everything not transmitted is absorbed and re-emitted: `ε = 1 - t`.
    Kirchhoff,
    /// An explicit emissivity curve.
    Curve(Curve),
}

/// A single wavelength-dependent transfer stage.
///
/// Elements hold their curves on their native grids; the curves are
/// resampled onto the working grid each time the element is applied.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum OpticalElement {
    /// Filters, windows, fibers, lenses.
    Transmissive { label: String, efficiency: Curve },

    /// Mirrors and gratings. Behaves exactly like a transmissive element.
    Reflective { label: String, reflectance: Curve },

    /// A warm element that attenuates like any other and radiates per
    /// Planck's law at its physical temperature.
    Emissive {
        label: String,
        transmission: Curve,
        temperature: ThermodynamicTemperature,
        emissivity: Emissivity,
    },
}

/// The response of one element on a working grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementResponse {
    /// Fraction of incoming flux passed on, per channel.
    pub transfer: Array1<f64>,

    /// Spectral radiance emitted by the element, if it radiates.
    pub emission: Option<Array1<f64>>,
}

impl OpticalElement {
    #[must_use]
    pub fn transmissive(label: impl Into<String>, efficiency: Curve) -> Self {
        Self::Transmissive {
            label: label.into(),
            efficiency,
        }
    }

    #[must_use]
    pub fn reflective(label: impl Into<String>, reflectance: Curve) -> Self {
        Self::Reflective {
            label: label.into(),
            reflectance,
        }
    }

    #[must_use]
    pub fn emissive(
        label: impl Into<String>,
        transmission: Curve,
        temperature: ThermodynamicTemperature,
        emissivity: Emissivity,
    ) -> Self {
        Self::Emissive {
            label: label.into(),
            transmission,
            temperature,
            emissivity,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Transmissive { label, .. }
            | Self::Reflective { label, .. }
            | Self::Emissive { label, .. } => label,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Transmissive { .. } => ElementKind::Transmissive,
            Self::Reflective { .. } => ElementKind::Reflective,
            Self::Emissive { .. } => ElementKind::Emissive,
        }
    }

    /// The element's transfer curve (efficiency, reflectance or transmission).
    #[must_use]
    pub fn transfer_curve(&self) -> &Curve {
        match self {
            Self::Transmissive { efficiency, .. } => efficiency,
            Self::Reflective { reflectance, .. } => reflectance,
            Self::Emissive { transmission, .. } => transmission,
        }
    }

    /// Resolves the element on `grid`.
    ///
    /// Gaps in the element's curves resolve through `gap`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Calibration`] if a transfer or emissivity value lies
    /// outside [0, 1], if transmission plus emissivity exceeds one, or if the
    /// temperature is negative. Returns [`Error::Domain`] if a gap is hit
    /// under [`Extrapolate::Error`].
    pub fn response(
        &self,
        grid: &SpectralGrid,
        gap: Extrapolate,
    ) -> Result<ElementResponse, Error> {
        let transfer = self.transfer_curve().sample(grid, gap)?;
        CalibrationError::unit_range(self.label(), self.quantity(), &transfer)?;

        let emission = match self {
            Self::Transmissive { .. } | Self::Reflective { .. } => None,
            Self::Emissive {
                label,
                temperature,
                emissivity,
                ..
            } => {
                let t = CalibrationError::non_negative(
                    "element temperature",
                    temperature.get::<kelvin>(),
                )?;
                let emissivity = match emissivity {
                    Emissivity::Kirchhoff => self
                        .transfer_curve()
                        .sample(grid, kirchhoff_gap(gap))?
                        .mapv(|t| 1.0 - t),
                    Emissivity::Curve(curve) => {
                        let emissivity = curve.sample(grid, gap)?;
                        CalibrationError::unit_range(label, "emissivity", &emissivity)?;
                        check_energy_balance(label, &transfer, &emissivity)?;
                        emissivity
                    }
                };
                let wl = grid.wavelengths_m();
                Some(
                    Zip::from(&emissivity)
                        .and(&wl)
                        .map_collect(|&e, &wl| e * planck_radiance(wl, t)),
                )
            }
        };

        Ok(ElementResponse { transfer, emission })
    }

    /// Applies the element to an input spectrum.
    ///
    /// Returns the transmitted spectrum and the spectral radiance emitted by
    /// the element itself, zero for non-emissive elements.
    ///
    /// # Errors
    ///
    /// See [`OpticalElement::response`].
    pub fn apply(
        &self,
        input: &Spectrum,
        gap: Extrapolate,
    ) -> Result<(Spectrum, Spectrum), Error> {
        let grid = input.grid();
        let response = self.response(grid, gap)?;
        let output = input.attenuated(&response.transfer)?;
        let emitted = match response.emission {
            Some(emission) => {
                Spectrum::new(Arc::clone(grid), emission, FluxUnit::SpectralRadiance)?
            }
            None => Spectrum::zeros(Arc::clone(grid), FluxUnit::SpectralRadiance),
        };
        Ok((output, emitted))
    }

    fn quantity(&self) -> &'static str {
        match self {
            Self::Transmissive { .. } => "efficiency",
            Self::Reflective { .. } => "reflectance",
            Self::Emissive { .. } => "transmission",
        }
    }
}

/// Gap policy for the transmission behind a Kirchhoff emissivity.
///
/// A filled gap neither transmits nor emits, so the transmission is read as
/// one there and `1 - t` vanishes.
fn kirchhoff_gap(gap: Extrapolate) -> Extrapolate {
    match gap {
        Extrapolate::Fill(_) => Extrapolate::Fill(1.0),
        held => held,
    }
}

fn check_energy_balance(
    label: &str,
    transfer: &Array1<f64>,
    emissivity: &Array1<f64>,
) -> Result<(), CalibrationError> {
    match transfer
        .iter()
        .zip(emissivity)
        .map(|(t, e)| t + e)
        .enumerate()
        .find(|&(_, sum)| sum > 1.0 + ENERGY_BALANCE_TOLERANCE)
    {
        Some((index, sum)) => Err(CalibrationError::EnergyBalance {
            label: label.to_owned(),
            index,
            sum,
        }),
        None => Ok(()),
    }
}
