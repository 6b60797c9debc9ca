use uom::si::{
    f64::Length,
    length::{meter, micrometer, nanometer},
};

/// Length unit in which the samples of a [`SpectralGrid`](super::SpectralGrid) are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WavelengthUnit {
    #[default]
    Nanometer,
    Micrometer,
    Meter,
}

impl WavelengthUnit {
    /// Wraps a raw sample expressed in this unit as a `uom` length.
    #[must_use]
    pub fn length(self, value: f64) -> Length {
        match self {
            Self::Nanometer => Length::new::<nanometer>(value),
            Self::Micrometer => Length::new::<micrometer>(value),
            Self::Meter => Length::new::<meter>(value),
        }
    }

    /// Expresses a `uom` length as a raw sample in this unit.
    #[must_use]
    pub fn value_of(self, length: Length) -> f64 {
        match self {
            Self::Nanometer => length.get::<nanometer>(),
            Self::Micrometer => length.get::<micrometer>(),
            Self::Meter => length.get::<meter>(),
        }
    }

    /// Factor converting a raw sample in `self` into a raw sample in `target`.
    #[must_use]
    pub fn factor_to(self, target: Self) -> f64 {
        if self == target {
            1.0
        } else {
            target.value_of(self.length(1.0))
        }
    }
}
