//! Console view state (camera, open detail panels, collapsed groups)
//!
//! Kept out of the engine's zone state and persisted through a small
//! key-value [`ViewStateStore`]. Each field lives under its own key so a
//! malformed value only resets that field.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use shared::LatLng;

use crate::EngineResult;

pub const KEY_MAP_CENTER: &str = "map_center";
pub const KEY_MAP_ZOOM: &str = "map_zoom";
pub const KEY_ZONE_DETAIL: &str = "map_zone_detail";
pub const KEY_DRIVER_DETAIL: &str = "map_driver_detail";
pub const KEY_VEHICLE_DETAIL: &str = "map_vehicle_detail";
pub const KEY_COLLAPSED_SECTORS: &str = "map_collapsed_sectors";
pub const KEY_SIDE_PANEL: &str = "map_side_panel_open";

/// Key-value persistence for [`ViewState`]
pub trait ViewStateStore: Send + Sync {
    fn get(&self, key: &str) -> EngineResult<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> EngineResult<()>;
    fn remove(&self, key: &str) -> EngineResult<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub map_center: Option<LatLng>,
    pub map_zoom: Option<u8>,
    pub zone_detail: Option<String>,
    pub driver_detail: Option<String>,
    pub vehicle_detail: Option<String>,
    pub collapsed_sectors: BTreeSet<String>,
    pub side_panel_open: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            map_center: None,
            map_zoom: None,
            zone_detail: None,
            driver_detail: None,
            vehicle_detail: None,
            collapsed_sectors: BTreeSet::new(),
            side_panel_open: true,
        }
    }
}

fn read<T: DeserializeOwned>(store: &dyn ViewStateStore, key: &str) -> EngineResult<Option<T>> {
    let Some(value) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Ignoring malformed view state value");
            Ok(None)
        }
    }
}

fn write<T: Serialize>(store: &dyn ViewStateStore, key: &str, value: Option<&T>) -> EngineResult<()> {
    match value {
        Some(v) => store.set(key, serde_json::to_value(v)?),
        None => store.remove(key),
    }
}

impl ViewState {
    pub fn load(store: &dyn ViewStateStore) -> EngineResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            map_center: read(store, KEY_MAP_CENTER)?,
            map_zoom: read(store, KEY_MAP_ZOOM)?,
            zone_detail: read(store, KEY_ZONE_DETAIL)?,
            driver_detail: read(store, KEY_DRIVER_DETAIL)?,
            vehicle_detail: read(store, KEY_VEHICLE_DETAIL)?,
            collapsed_sectors: read(store, KEY_COLLAPSED_SECTORS)?.unwrap_or_default(),
            side_panel_open: read(store, KEY_SIDE_PANEL)?.unwrap_or(defaults.side_panel_open),
        })
    }

    pub fn save(&self, store: &dyn ViewStateStore) -> EngineResult<()> {
        write(store, KEY_MAP_CENTER, self.map_center.as_ref())?;
        write(store, KEY_MAP_ZOOM, self.map_zoom.as_ref())?;
        write(store, KEY_ZONE_DETAIL, self.zone_detail.as_ref())?;
        write(store, KEY_DRIVER_DETAIL, self.driver_detail.as_ref())?;
        write(store, KEY_VEHICLE_DETAIL, self.vehicle_detail.as_ref())?;
        write(store, KEY_COLLAPSED_SECTORS, Some(&self.collapsed_sectors))?;
        write(store, KEY_SIDE_PANEL, Some(&self.side_panel_open))
    }

    /// Returns the new collapsed state
    pub fn toggle_sector(&mut self, sector: &str) -> bool {
        if self.collapsed_sectors.remove(sector) {
            false
        } else {
            self.collapsed_sectors.insert(sector.to_string());
            true
        }
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryViewStateStore {
    values: Mutex<BTreeMap<String, Value>>,
}

impl ViewStateStore for InMemoryViewStateStore {
    fn get(&self, key: &str) -> EngineResult<Option<Value>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> EngineResult<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// Single JSON object on disk, rewritten on every change
#[derive(Debug)]
pub struct JsonFileViewStateStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, Value>>,
}

impl JsonFileViewStateStore {
    /// Open (or lazily create) the file at `path`
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                BTreeMap::new()
            } else {
                serde_json::from_slice(&bytes)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &BTreeMap<String, Value>) -> EngineResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(values)?)?;
        Ok(())
    }
}

impl ViewStateStore for JsonFileViewStateStore {
    fn get(&self, key: &str) -> EngineResult<Option<Value>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        let mut values = self.values.lock();
        if values.get(key) == Some(&value) {
            return Ok(());
        }
        values.insert(key.to_string(), value);
        self.flush(&values)
    }

    fn remove(&self, key: &str) -> EngineResult<()> {
        let mut values = self.values.lock();
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ViewState {
        let mut state = ViewState {
            map_center: Some(LatLng::new(5.35, -4.0)),
            map_zoom: Some(13),
            zone_detail: Some("Z1".into()),
            ..Default::default()
        };
        state.toggle_sector("NORD");
        state
    }

    #[test]
    fn test_defaults_from_empty_store() {
        let store = InMemoryViewStateStore::default();
        let state = ViewState::load(&store).unwrap();
        assert_eq!(state, ViewState::default());
        assert!(state.side_panel_open);
    }

    #[test]
    fn test_save_then_load_in_memory() {
        let store = InMemoryViewStateStore::default();
        sample().save(&store).unwrap();
        assert_eq!(store.get(KEY_ZONE_DETAIL).unwrap(), Some(json!("Z1")));
        assert_eq!(ViewState::load(&store).unwrap(), sample());
    }

    #[test]
    fn test_cleared_field_removes_key() {
        let store = InMemoryViewStateStore::default();
        let mut state = sample();
        state.save(&store).unwrap();
        state.zone_detail = None;
        state.save(&store).unwrap();
        assert_eq!(store.get(KEY_ZONE_DETAIL).unwrap(), None);
    }

    #[test]
    fn test_malformed_value_resets_field() {
        let store = InMemoryViewStateStore::default();
        store.set(KEY_MAP_ZOOM, json!("very close")).unwrap();
        store.set(KEY_DRIVER_DETAIL, json!("d4")).unwrap();
        let state = ViewState::load(&store).unwrap();
        assert_eq!(state.map_zoom, None);
        assert_eq!(state.driver_detail.as_deref(), Some("d4"));
    }

    #[test]
    fn test_toggle_sector() {
        let mut state = ViewState::default();
        assert!(state.toggle_sector("SUD"));
        assert!(!state.toggle_sector("SUD"));
        assert!(state.collapsed_sectors.is_empty());
    }

    #[test]
    fn test_json_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console").join("view.json");

        {
            let store = JsonFileViewStateStore::open(&path).unwrap();
            sample().save(&store).unwrap();
        }
        assert!(path.exists());

        let store = JsonFileViewStateStore::open(&path).unwrap();
        assert_eq!(ViewState::load(&store).unwrap(), sample());
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_json_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.json");
        fs::write(&path, b"not json").unwrap();
        assert!(JsonFileViewStateStore::open(&path).is_err());

        fs::write(&path, b"  \n").unwrap();
        assert!(JsonFileViewStateStore::open(&path).is_ok());
    }
}
