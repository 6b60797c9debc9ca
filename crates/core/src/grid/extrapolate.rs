/// Gap policy for points outside the domain of a sampled curve.
///
/// Every call site that resamples data picks one of these explicitly. None of
/// the policies extrapolate the data itself.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Extrapolate {
    /// If the point is beyond the source limits, return this value instead.
    Fill(f64),
    /// Hold the value at the nearest edge of the source domain.
    Clamp,
    /// Return an error when the point is beyond the source limits.
    Error,
}

impl Extrapolate {
    /// Zero fill, the default for transmission, emission and QE curves.
    pub const ZERO: Self = Self::Fill(0.0);
}

impl Default for Extrapolate {
    fn default() -> Self {
        Self::ZERO
    }
}
