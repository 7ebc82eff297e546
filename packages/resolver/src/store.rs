//! The immutable in-memory jurisdiction store.
//!
//! Built once from [`ReferenceData`] and then shared read-only (usually
//! behind an `Arc`). Lookups never mutate, so concurrent callers need
//! no coordination.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use precinct_map_jurisdiction_models::{GeoPoint, Precinct, Sector};
use precinct_map_schedule_models::{RdoSchedule, Squad};
use precinct_map_spatial::{RingIndex, nearest_index};

use crate::{LoadError, reference::ReferenceData};

/// Precincts, sectors, and duty schedules with spatial indexes.
pub struct JurisdictionStore {
    precincts: Vec<Precinct>,
    precinct_by_num: BTreeMap<u32, usize>,
    /// Indices of the first record for each precinct number, in load order.
    canonical: Vec<usize>,
    precinct_rings: RingIndex,
    sectors: Vec<Sector>,
    sector_rings: RingIndex,
    squads: Vec<Squad>,
    schedules: Vec<RdoSchedule>,
}

impl std::fmt::Debug for JurisdictionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JurisdictionStore")
            .field("precincts", &self.precincts.len())
            .field("precinct_rings", &self.precinct_rings.len())
            .field("sectors", &self.sectors.len())
            .field("squads", &self.squads.len())
            .field("schedules", &self.schedules.len())
            .finish()
    }
}

impl JurisdictionStore {
    /// Indexes already-normalized reference data.
    ///
    /// Precinct order is preserved and decides which precinct wins when
    /// boundaries overlap. A repeated precinct number keeps its first
    /// record. Squads are ordered by display order.
    #[must_use]
    pub fn new(data: ReferenceData) -> Self {
        let ReferenceData {
            precincts,
            sectors,
            mut squads,
            schedules,
        } = data;

        let mut precinct_by_num = BTreeMap::new();
        for (idx, precinct) in precincts.iter().enumerate() {
            if precinct_by_num.contains_key(&precinct.precinct_num) {
                log::warn!(
                    "Precinct {} appears more than once; keeping the first",
                    precinct.precinct_num
                );
                continue;
            }
            precinct_by_num.insert(precinct.precinct_num, idx);
        }

        let mut canonical: Vec<usize> = precinct_by_num.values().copied().collect();
        canonical.sort_unstable();

        let precinct_rings = RingIndex::build(canonical.iter().flat_map(|&idx| {
            precincts[idx]
                .boundary
                .iter()
                .cloned()
                .map(move |ring| (idx, ring))
        }));
        let sector_rings = RingIndex::build(
            sectors
                .iter()
                .enumerate()
                .map(|(idx, s)| (idx, s.boundary.clone())),
        );

        squads.sort_by_key(|squad| squad.display_order);

        log::debug!(
            "Indexed {} precinct rings and {} sector rings",
            precinct_rings.len(),
            sector_rings.len()
        );

        Self {
            precincts,
            precinct_by_num,
            canonical,
            precinct_rings,
            sectors,
            sector_rings,
            squads,
            schedules,
        }
    }

    /// Loads and indexes the reference tables in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the tables cannot be read.
    pub fn load_dir(dir: &Path) -> Result<Self, LoadError> {
        ReferenceData::load_dir(dir).map(Self::new)
    }

    /// All precincts in load order.
    #[must_use]
    pub fn precincts(&self) -> &[Precinct] {
        &self.precincts
    }

    #[must_use]
    pub fn precinct(&self, precinct_num: u32) -> Option<&Precinct> {
        self.precinct_by_num
            .get(&precinct_num)
            .map(|&idx| &self.precincts[idx])
    }

    /// All sector rings in load order.
    #[must_use]
    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// One entry per distinct sector id in `precinct_num`, first ring
    /// first.
    #[must_use]
    pub fn sectors_for_precinct(&self, precinct_num: u32) -> Vec<&Sector> {
        let mut seen = BTreeSet::new();
        self.sectors
            .iter()
            .filter(|s| s.precinct_num == precinct_num)
            .filter(|s| seen.insert(s.sector_id.as_str()))
            .collect()
    }

    #[must_use]
    pub fn sector(&self, precinct_num: u32, sector_id: &str) -> Option<&Sector> {
        self.sectors
            .iter()
            .find(|s| s.precinct_num == precinct_num && s.sector_id == sector_id)
    }

    /// Squads ordered by display order.
    #[must_use]
    pub fn squads(&self) -> &[Squad] {
        &self.squads
    }

    #[must_use]
    pub fn squad(&self, squad_id: u32) -> Option<&Squad> {
        self.squads.iter().find(|s| s.squad_id == squad_id)
    }

    /// The first schedule belonging to `squad_id`.
    #[must_use]
    pub fn schedule_for_squad(&self, squad_id: u32) -> Option<&RdoSchedule> {
        self.schedules.iter().find(|s| s.squad_id == squad_id)
    }

    /// First precinct, in load order, with a boundary part containing
    /// `point`.
    #[must_use]
    pub fn precinct_containing(&self, point: GeoPoint) -> Option<&Precinct> {
        self.precinct_rings
            .first_containing(point)
            .map(|idx| &self.precincts[idx])
    }

    /// First sector ring, in load order, containing `point`.
    #[must_use]
    pub fn sector_containing(&self, point: GeoPoint) -> Option<&Sector> {
        self.sector_rings
            .first_containing(point)
            .map(|idx| &self.sectors[idx])
    }

    /// Precinct whose centroid is nearest to `point`. Ties keep the
    /// earlier precinct. Repeated precinct numbers are not candidates.
    #[must_use]
    pub fn nearest_precinct(&self, point: GeoPoint) -> Option<&Precinct> {
        nearest_index(
            point,
            self.canonical.iter().map(|&idx| self.precincts[idx].centroid),
        )
        .map(|pos| &self.precincts[self.canonical[pos]])
    }
}
