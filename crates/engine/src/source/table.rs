use std::sync::Arc;

use ndarray::Array1;
use radiosim_core::{
    Extrapolate, FluxUnit, GridError, Interpolation, SpectralGrid, Spectrum, WavelengthUnit,
};

use crate::{Error, SpectrumSource};

/// A spectrum tabulated in memory, e.g. parsed from a lamp data sheet.
///
/// The table keeps its native sampling and is resampled onto the working
/// grid when evaluated. Wavelengths outside the table resolve through the
/// gap policy, zero flux by default.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "TableDef", into = "TableDef")
)]
pub struct TableSource {
    table: Spectrum,
    gap: Extrapolate,
}

impl TableSource {
    /// Builds a source from (wavelength, value) pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if the wavelengths do not form a valid grid
    /// of at least two samples, and [`Error::InvalidSpectrum`] if a value is
    /// negative or not finite.
    pub fn new(
        wavelengths: impl Into<Array1<f64>>,
        values: impl Into<Array1<f64>>,
        wavelength_unit: WavelengthUnit,
        unit: FluxUnit,
    ) -> Result<Self, Error> {
        let grid = SpectralGrid::new(wavelengths, wavelength_unit)?;
        if grid.len() < 2 {
            return Err(GridError::TooFewSamples {
                required: 2,
                found: grid.len(),
            }
            .into());
        }
        Ok(Self {
            table: Spectrum::new(Arc::new(grid), values, unit)?,
            gap: Extrapolate::ZERO,
        })
    }

    /// Uses a different policy for wavelengths outside the table.
    #[must_use]
    pub fn with_gap_policy(self, gap: Extrapolate) -> Self {
        Self { gap, ..self }
    }

    /// Uses a different interpolation between table rows.
    ///
    /// # Errors
    ///
    /// Never fails for a table that was valid to begin with.
    pub fn with_interpolation(self, interpolation: Interpolation) -> Result<Self, Error> {
        let grid = SpectralGrid::clone(self.table.grid()).with_interpolation(interpolation);
        let unit = self.table.unit();
        Ok(Self {
            table: Spectrum::new(Arc::new(grid), self.table.into_values(), unit)?,
            gap: self.gap,
        })
    }

    /// The table on its native grid.
    #[must_use]
    pub fn table(&self) -> &Spectrum {
        &self.table
    }

    #[must_use]
    pub fn gap_policy(&self) -> Extrapolate {
        self.gap
    }
}

impl SpectrumSource for TableSource {
    fn evaluate(&self, grid: &Arc<SpectralGrid>) -> Result<Spectrum, Error> {
        Ok(self.table.resampled(Arc::clone(grid), self.gap)?)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct TableDef {
    wavelengths: Vec<f64>,
    values: Vec<f64>,
    #[serde(default)]
    wavelength_unit: WavelengthUnit,
    unit: FluxUnit,
    #[serde(default)]
    interpolation: Interpolation,
    #[serde(default)]
    gap: Extrapolate,
}

#[cfg(feature = "serde")]
impl TryFrom<TableDef> for TableSource {
    type Error = Error;

    fn try_from(def: TableDef) -> Result<Self, Self::Error> {
        Self::new(def.wavelengths, def.values, def.wavelength_unit, def.unit)?
            .with_interpolation(def.interpolation)
            .map(|table| table.with_gap_policy(def.gap))
    }
}

#[cfg(feature = "serde")]
impl From<TableSource> for TableDef {
    fn from(source: TableSource) -> Self {
        let grid = source.table.grid();
        Self {
            wavelengths: grid.samples().to_vec(),
            values: source.table.values().to_vec(),
            wavelength_unit: grid.unit(),
            unit: source.table.unit(),
            interpolation: grid.interpolation(),
            gap: source.gap,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    fn table() -> TableSource {
        TableSource::new(
            array![1.0, 1.5, 2.0],
            array![10.0, 20.0, 30.0],
            WavelengthUnit::Micrometer,
            FluxUnit::SpectralIrradiance,
        )
        .unwrap()
    }

    #[test]
    fn resamples_with_gap_policy() {
        let grid = Arc::new(
            SpectralGrid::new(array![800.0, 1250.0, 2500.0], WavelengthUnit::Nanometer).unwrap(),
        );

        let zero = table().evaluate(&grid).unwrap();
        assert_eq!(zero.values()[0], 0.0);
        assert_relative_eq!(zero.values()[1], 15.0, max_relative = 1e-12);
        assert_eq!(zero.values()[2], 0.0);

        let held = table()
            .with_gap_policy(Extrapolate::Clamp)
            .evaluate(&grid)
            .unwrap();
        assert_relative_eq!(held.values()[0], 10.0);
        assert_relative_eq!(held.values()[2], 30.0);

        let strict = table().with_gap_policy(Extrapolate::Error).evaluate(&grid);
        assert!(matches!(strict, Err(Error::Domain(GridError::OutOfDomain { .. }))));
    }

    #[test]
    fn rejects_invalid_tables() {
        let negative = TableSource::new(
            array![1.0, 2.0],
            array![1.0, -1.0],
            WavelengthUnit::Micrometer,
            FluxUnit::SpectralRadiance,
        );
        assert!(matches!(negative, Err(Error::InvalidSpectrum(_))));

        let nan = TableSource::new(
            array![1.0, 2.0],
            array![f64::NAN, 1.0],
            WavelengthUnit::Micrometer,
            FluxUnit::SpectralRadiance,
        );
        assert!(matches!(nan, Err(Error::InvalidSpectrum(_))));

        let single = TableSource::new(
            array![1.0],
            array![1.0],
            WavelengthUnit::Micrometer,
            FluxUnit::SpectralRadiance,
        );
        assert!(matches!(single, Err(Error::Domain(_))));
    }

    #[test]
    fn negative_fill_is_rejected() {
        let grid = Arc::new(SpectralGrid::new(array![500.0], WavelengthUnit::Nanometer).unwrap());
        let err = table()
            .with_gap_policy(Extrapolate::Fill(-1.0))
            .evaluate(&grid)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSpectrum(_)));
    }
}
