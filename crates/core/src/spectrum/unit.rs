/// Physical unit of the values carried by a [`Spectrum`](super::Spectrum).
///
/// All units are densities per metre of wavelength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FluxUnit {
    /// W·m⁻²·sr⁻¹·m⁻¹
    SpectralRadiance,
    /// W·m⁻²·m⁻¹
    SpectralIrradiance,
    /// s⁻¹·m⁻²·sr⁻¹·m⁻¹
    PhotonRadiance,
    /// s⁻¹·m⁻²·m⁻¹
    PhotonIrradiance,
}

impl FluxUnit {
    /// Whether values count photons rather than energy.
    #[must_use]
    pub fn is_photon(self) -> bool {
        matches!(self, Self::PhotonRadiance | Self::PhotonIrradiance)
    }

    /// Whether values are per unit solid angle.
    #[must_use]
    pub fn is_radiance(self) -> bool {
        matches!(self, Self::SpectralRadiance | Self::PhotonRadiance)
    }

    /// The photon-counting counterpart of this unit.
    #[must_use]
    pub fn photon(self) -> Self {
        if self.is_radiance() {
            Self::PhotonRadiance
        } else {
            Self::PhotonIrradiance
        }
    }

    /// The energy counterpart of this unit.
    #[must_use]
    pub fn energy(self) -> Self {
        if self.is_radiance() {
            Self::SpectralRadiance
        } else {
            Self::SpectralIrradiance
        }
    }
}
