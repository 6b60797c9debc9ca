use ndarray::{Array1, Array2};
use ninterp::{
    interpolator::Extrapolate,
    prelude::{Interp2DOwned, Interpolator as _},
    strategy::enums::Strategy2DEnum,
};
use radiosim_core::{Curve, GridError, SampledCurve, SpectralGrid, WavelengthUnit};

use crate::{CalibrationError, Error};

use super::OpticalElement;

/// Atmospheric transmission tabulated over wavelength and airmass.
///
/// Each column of the table is the sky transmission at one airmass. Between
/// tabulated airmasses the table is interpolated bilinearly. Beyond them the
/// nearest column is extended with Beer-Lambert scaling, `t(X) = t(X₀)^(X/X₀)`.
/// The sky absorbs but does not radiate; its emission belongs in the
/// background source.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "SkyDef", into = "SkyDef")
)]
pub struct SkyTransmission {
    wavelengths: SpectralGrid,
    airmasses: Array1<f64>,
    table: Array2<f64>,
}

impl SkyTransmission {
    /// Builds a sky from a table with one row per wavelength and one column
    /// per airmass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if the wavelengths do not form a grid of at
    /// least two samples, and [`Error::Calibration`] if the airmasses are not
    /// positive and increasing, the table does not match both axes, or a
    /// transmission leaves [0, 1].
    pub fn new(
        wavelengths: impl Into<Array1<f64>>,
        unit: WavelengthUnit,
        airmasses: impl Into<Array1<f64>>,
        table: Array2<f64>,
    ) -> Result<Self, Error> {
        let wavelengths = SpectralGrid::new(wavelengths, unit)?;
        if wavelengths.len() < 2 {
            return Err(GridError::TooFewSamples {
                required: 2,
                found: wavelengths.len(),
            }
            .into());
        }

        let airmasses = airmasses.into();
        if airmasses.is_empty() {
            return Err(CalibrationError::ZeroCount { name: "sky airmasses" }.into());
        }
        for (index, &airmass) in airmasses.iter().enumerate() {
            CalibrationError::positive("sky airmass", airmass)?;
            if index > 0 && airmass <= airmasses[index - 1] {
                return Err(CalibrationError::InvalidParameter {
                    name: "sky airmass (not increasing)",
                    value: airmass,
                }
                .into());
            }
        }

        let expected = (wavelengths.len(), airmasses.len());
        if table.dim() != expected {
            return Err(CalibrationError::TableShape {
                label: "sky".to_owned(),
                expected,
                found: table.dim(),
            }
            .into());
        }
        CalibrationError::unit_range("sky", "transmission", &table)?;

        Ok(Self {
            wavelengths,
            airmasses,
            table,
        })
    }

    /// Tabulated airmass range.
    #[must_use]
    pub fn airmass_range(&self) -> (f64, f64) {
        (self.airmasses[0], self.airmasses[self.airmasses.len() - 1])
    }

    /// Transmission at `airmass` on the table's own wavelengths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Calibration`] if the airmass is not positive.
    pub fn curve_at(&self, airmass: f64) -> Result<Curve, Error> {
        let airmass = CalibrationError::positive("airmass", airmass)?;
        let (lowest, highest) = self.airmass_range();
        let edge = airmass.clamp(lowest, highest);
        if edge != airmass {
            log::debug!("airmass {airmass} outside [{lowest}, {highest}], scaling from {edge}");
        }

        let exponent = airmass / edge;
        let transmission = self.column_at(edge)?.mapv(|t| t.powf(exponent));
        Ok(SampledCurve::new(self.wavelengths.clone(), transmission)?.into())
    }

    /// A transmissive element for the atmosphere at `airmass`.
    ///
    /// # Errors
    ///
    /// See [`SkyTransmission::curve_at`].
    pub fn element(&self, airmass: f64) -> Result<OpticalElement, Error> {
        Ok(OpticalElement::transmissive("sky", self.curve_at(airmass)?))
    }

    /// Interpolated column at an airmass inside the table.
    fn column_at(&self, airmass: f64) -> Result<Array1<f64>, GridError> {
        if self.airmasses.len() == 1 {
            return Ok(self.table.column(0).to_owned());
        }
        let samples = self.wavelengths.samples();
        let interp: Interp2DOwned<f64, Strategy2DEnum> = Interp2DOwned::new(
            samples.clone(),
            self.airmasses.clone(),
            self.table.clone(),
            ninterp::strategy::Linear.into(),
            Extrapolate::Error,
        )?;
        samples
            .iter()
            .map(|&wl| interp.interpolate(&[wl, airmass]).map_err(GridError::from))
            .collect()
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct SkyDef {
    wavelengths: Vec<f64>,
    #[serde(default)]
    unit: WavelengthUnit,
    airmasses: Vec<f64>,
    /// One row per wavelength.
    transmission: Vec<Vec<f64>>,
}

#[cfg(feature = "serde")]
impl TryFrom<SkyDef> for SkyTransmission {
    type Error = Error;

    fn try_from(def: SkyDef) -> Result<Self, Self::Error> {
        let rows = def.transmission.len();
        let columns = def.airmasses.len();
        if let Some(row) = def.transmission.iter().find(|row| row.len() != columns) {
            return Err(CalibrationError::TableShape {
                label: "sky".to_owned(),
                expected: (def.wavelengths.len(), columns),
                found: (rows, row.len()),
            }
            .into());
        }
        let flat: Vec<f64> = def.transmission.into_iter().flatten().collect();
        let table = Array2::from_shape_vec((rows, columns), flat).map_err(|_| {
            CalibrationError::TableShape {
                label: "sky".to_owned(),
                expected: (def.wavelengths.len(), columns),
                found: (rows, columns),
            }
        })?;
        Self::new(def.wavelengths, def.unit, def.airmasses, table)
    }
}

#[cfg(feature = "serde")]
impl From<SkyTransmission> for SkyDef {
    fn from(sky: SkyTransmission) -> Self {
        Self {
            wavelengths: sky.wavelengths.samples().to_vec(),
            unit: sky.wavelengths.unit(),
            airmasses: sky.airmasses.to_vec(),
            transmission: sky.table.rows().into_iter().map(|row| row.to_vec()).collect(),
        }
    }
}
