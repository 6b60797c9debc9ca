use std::sync::Arc;

use ndarray::Array1;
use radiosim_core::{Extrapolate, FluxUnit, Observer, SpectralGrid, Spectrum, SpectrumError};

use crate::Error;

use super::{ElementKind, InstrumentPart, OpticalElement};

/// An ordered chain of optical elements in physical propagation order.
///
/// The order is never changed. Gaps in element curves resolve through the
/// train-wide gap policy, zero transfer and zero emission by default.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpticalTrain {
    elements: Vec<OpticalElement>,
    #[cfg_attr(feature = "serde", serde(default))]
    gap: Extrapolate,
}

/// Signal and background reaching the end of a train.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Propagation {
    /// The source attenuated by every element.
    pub signal: Spectrum,

    /// Spectral radiance emitted along the train (plus any incoming
    /// background), each contribution attenuated by the elements after it.
    pub background: Spectrum,

    /// End-to-end throughput, the product of all transfer curves.
    pub throughput: Array1<f64>,
}

/// Emitted after each element during propagation.
#[derive(Debug, Clone, Copy)]
pub struct StageEvent<'a> {
    /// Position of the element in the train.
    pub index: usize,

    pub label: &'a str,

    pub kind: ElementKind,

    /// The element's transfer curve on the working grid.
    pub transfer: &'a Array1<f64>,

    /// Running signal after this element.
    pub signal: &'a Spectrum,

    /// Running background after this element.
    pub background: &'a Spectrum,
}

impl OpticalTrain {
    /// An empty train with the default zero-fill gap policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `gap` for every element lookup outside a curve's domain.
    #[must_use]
    pub fn with_gap_policy(self, gap: Extrapolate) -> Self {
        Self { gap, ..self }
    }

    /// Appends an element after the current last one.
    pub fn push(&mut self, element: OpticalElement) {
        self.elements.push(element);
    }

    /// Builder form of [`OpticalTrain::push`].
    #[must_use]
    pub fn with(mut self, element: OpticalElement) -> Self {
        self.push(element);
        self
    }

    /// Appends `count` identical surfaces, e.g. the mirrors of a relay that
    /// share one coating. Each copy attenuates and emits in turn.
    pub fn push_repeated(&mut self, element: &OpticalElement, count: usize) {
        self.elements.extend(std::iter::repeat_n(element, count).cloned());
    }

    /// Appends every element of an instrument part.
    ///
    /// # Errors
    ///
    /// Returns the part's calibration error, leaving the train unchanged.
    pub fn push_part(&mut self, part: &InstrumentPart) -> Result<(), Error> {
        self.elements.extend(part.elements()?);
        Ok(())
    }

    /// Builder form of [`OpticalTrain::push_part`].
    ///
    /// # Errors
    ///
    /// See [`OpticalTrain::push_part`].
    pub fn with_part(mut self, part: &InstrumentPart) -> Result<Self, Error> {
        self.push_part(part)?;
        Ok(self)
    }

    #[must_use]
    pub fn elements(&self) -> &[OpticalElement] {
        &self.elements
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[must_use]
    pub fn gap_policy(&self) -> Extrapolate {
        self.gap
    }

    /// End-to-end throughput on `grid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyTrain`] if the train has no elements, or the
    /// first element error encountered.
    pub fn throughput(&self, grid: &SpectralGrid) -> Result<Array1<f64>, Error> {
        if self.is_empty() {
            return Err(Error::EmptyTrain);
        }
        self.elements
            .iter()
            .try_fold(
                Array1::ones(grid.len()),
                |product, element| -> Result<Array1<f64>, Error> {
                    Ok(product * &element.response(grid, self.gap)?.transfer)
                },
            )
    }

    /// Propagates `input` through every element, starting from zero
    /// background.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyTrain`] if the train has no elements, or the
    /// first element error encountered.
    pub fn propagate(&self, input: &Spectrum) -> Result<Propagation, Error> {
        self.propagate_observed(input, None, ())
    }

    /// Propagates `input` through every element, starting from an incoming
    /// background radiance such as the sky or ambient enclosure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpectrum`] if `incoming` is not a radiance on
    /// the same grid as `input`, plus the errors of
    /// [`OpticalTrain::propagate`].
    pub fn propagate_with_background(
        &self,
        input: &Spectrum,
        incoming: &Spectrum,
    ) -> Result<Propagation, Error> {
        self.propagate_observed(input, Some(incoming), ())
    }

    /// Propagates `input` and reports each stage to `observer`.
    ///
    /// At every element the running signal and the running background are
    /// first attenuated by the element's transfer curve, then the element's
    /// own emission is added to the background. Background emitted at stage
    /// `k` therefore reaches the end attenuated by the transfer of every
    /// later stage.
    ///
    /// # Errors
    ///
    /// See [`OpticalTrain::propagate_with_background`].
    pub fn propagate_observed<O>(
        &self,
        input: &Spectrum,
        incoming: Option<&Spectrum>,
        mut observer: O,
    ) -> Result<Propagation, Error>
    where
        O: for<'a> Observer<StageEvent<'a>>,
    {
        if self.is_empty() {
            return Err(Error::EmptyTrain);
        }

        let grid = input.grid();
        let mut signal = input.clone();
        let mut background = match incoming {
            Some(incoming) => incoming_background(input, incoming)?,
            None => Spectrum::zeros(Arc::clone(grid), FluxUnit::SpectralRadiance),
        };
        let mut throughput: Array1<f64> = Array1::ones(grid.len());

        for (index, element) in self.elements.iter().enumerate() {
            let response = element.response(grid, self.gap)?;

            signal = signal.attenuated(&response.transfer)?;
            background = background.attenuated(&response.transfer)?;
            if let Some(emission) = response.emission {
                let emitted =
                    Spectrum::new(Arc::clone(grid), emission, FluxUnit::SpectralRadiance)?;
                background = background.plus(&emitted)?;
            }
            throughput *= &response.transfer;

            log::trace!(
                "stage {index} `{}`: signal {:e}, background {:e}",
                element.label(),
                signal.integrated(),
                background.integrated(),
            );
            observer.observe(&StageEvent {
                index,
                label: element.label(),
                kind: element.kind(),
                transfer: &response.transfer,
                signal: &signal,
                background: &background,
            });
        }

        Ok(Propagation {
            signal,
            background,
            throughput,
        })
    }
}

fn incoming_background(input: &Spectrum, incoming: &Spectrum) -> Result<Spectrum, Error> {
    if !incoming.unit().is_radiance() {
        return Err(SpectrumError::UnitMismatch {
            expected: FluxUnit::SpectralRadiance,
            found: incoming.unit(),
        }
        .into());
    }
    if !input.shares_grid(incoming) {
        return Err(SpectrumError::GridMismatch.into());
    }
    Ok(incoming.to_energy())
}

impl FromIterator<OpticalElement> for OpticalTrain {
    fn from_iter<I: IntoIterator<Item = OpticalElement>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
            gap: Extrapolate::default(),
        }
    }
}
