//! Named precinct resolution tiers.

use serde::{Deserialize, Serialize};

/// One strategy for choosing a precinct for a point.
///
/// A resolver evaluates its configured tiers in order and stops at the
/// first that yields a precinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecinctTier {
    /// First precinct, in load order, whose boundary contains the point.
    Boundary,
    /// Owner of the first sector whose boundary contains the point.
    SectorOwner,
    /// Precinct number extracted from the nearest external place-search
    /// result. Provider errors and timeouts count as "no hint".
    ExternalHint,
    /// Precinct whose centroid is nearest by great-circle distance.
    /// Always succeeds while at least one precinct is loaded.
    NearestCentroid,
}

impl PrecinctTier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boundary => "boundary",
            Self::SectorOwner => "sector_owner",
            Self::ExternalHint => "external_hint",
            Self::NearestCentroid => "nearest_centroid",
        }
    }

    /// Whether the tier calls out to an external provider.
    #[must_use]
    pub const fn is_external(self) -> bool {
        matches!(self, Self::ExternalHint)
    }
}

impl std::fmt::Display for PrecinctTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
