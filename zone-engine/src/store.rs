//! Zone Store
//!
//! Insertion-ordered, in-memory zone collection for the current session.
//! Every method is synchronous and touches nothing but the collection;
//! network calls are issued by callers (the engine) outside of any lock.

use std::collections::{BTreeMap, BTreeSet};

use shared::{Zone, ZonePatch};

/// Group label for company zones without a sector
pub const UNCLASSIFIED_SECTOR: &str = "NON CLASSE";
/// Group label for templates without a sector
pub const GLOBAL_SECTOR: &str = "GLOBAL";

/// Zones grouped for the side panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectorGroups {
    pub company: BTreeMap<String, Vec<Zone>>,
    pub templates: BTreeMap<String, Vec<Zone>>,
}

#[derive(Debug, Clone, Default)]
pub struct ZoneStore {
    zones: Vec<Zone>,
}

impl ZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_zones(zones: Vec<Zone>) -> Self {
        let mut store = Self::new();
        store.resync_all(zones);
        store
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.zones.iter().position(|z| z.id == id)
    }

    // ========== Mutations ==========

    /// Insert, or replace in place when the id already exists
    pub fn upsert(&mut self, zone: Zone) {
        match self.position(&zone.id) {
            Some(i) => self.zones[i] = zone,
            None => self.zones.push(zone),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Zone> {
        self.position(id).map(|i| self.zones.remove(i))
    }

    /// Apply a partial update locally. Returns false if the zone is unknown.
    pub fn patch(&mut self, id: &str, patch: &ZonePatch) -> bool {
        match self.get_mut(id) {
            Some(zone) => {
                patch.apply_to(zone);
                true
            }
            None => false,
        }
    }

    /// Replace the local record with the server's canonical version
    pub fn reconcile(&mut self, mut server: Zone) {
        server.normalize_assignments();
        self.upsert(server);
    }

    /// Swap an optimistic record for the server's, keeping its position.
    ///
    /// Any other record already carrying the server id is dropped, so the
    /// collection never holds the same zone twice.
    pub fn replace(&mut self, temp_id: &str, mut server: Zone) {
        server.normalize_assignments();
        if temp_id != server.id {
            self.zones.retain(|z| z.id != server.id);
        }
        match self.position(temp_id) {
            Some(i) => self.zones[i] = server,
            None => self.zones.push(server),
        }
    }

    /// Write back a pre-mutation snapshot. Zones deleted in the meantime stay deleted.
    pub fn restore(&mut self, snapshot: Zone) -> bool {
        match self.get_mut(&snapshot.id) {
            Some(zone) => {
                *zone = snapshot;
                true
            }
            None => false,
        }
    }

    /// Full replacement of the collection
    pub fn resync_all(&mut self, zones: Vec<Zone>) {
        self.zones = zones;
        for zone in self.zones.iter_mut() {
            zone.normalize_assignments();
        }
    }

    // ========== Queries ==========

    pub fn get(&self, id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|z| z.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    pub fn snapshot(&self) -> Vec<Zone> {
        self.zones.clone()
    }

    /// Number of locally drawn zones still carrying a client id
    pub fn client_scoped_count(&self) -> usize {
        self.zones.iter().filter(|z| z.is_client_scoped()).count()
    }

    pub fn company_zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(|z| !z.is_template())
    }

    pub fn templates(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(|z| z.is_template())
    }

    pub fn grouped_by_sector(&self) -> SectorGroups {
        SectorGroups {
            company: group_by_sector(self.company_zones(), UNCLASSIFIED_SECTOR),
            templates: group_by_sector(self.templates(), GLOBAL_SECTOR),
        }
    }

    /// Distinct company sectors, sorted
    pub fn existing_sectors(&self) -> Vec<String> {
        self.company_zones()
            .filter_map(|z| z.sector.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Zone whose assignment list contains the driver
    pub fn zone_for_driver(&self, driver_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.has_driver(driver_id))
    }

    /// Zones drawn on the map, in store order.
    ///
    /// The selected zone is always drawn; any other zone only when
    /// `show_zones` is on and the zone is active.
    pub fn visible<'a>(
        &'a self,
        selected: Option<&'a str>,
        show_zones: bool,
    ) -> impl Iterator<Item = &'a Zone> + 'a {
        self.zones
            .iter()
            .filter(move |z| is_visible(z, selected, show_zones))
    }
}

pub fn is_visible(zone: &Zone, selected: Option<&str>, show_zones: bool) -> bool {
    selected == Some(zone.id.as_str()) || (show_zones && zone.is_active)
}

/// Blank sectors fall under `fallback`
fn group_by_sector<'a>(
    zones: impl Iterator<Item = &'a Zone>,
    fallback: &str,
) -> BTreeMap<String, Vec<Zone>> {
    let mut groups: BTreeMap<String, Vec<Zone>> = BTreeMap::new();
    for zone in zones {
        let key = zone
            .sector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback);
        groups.entry(key.to_string()).or_default().push(zone.clone());
    }
    groups
}
