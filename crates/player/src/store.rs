//! Durable storage for key bindings.
//!
//! One JSON file maps each control name to its physical key and controller
//! coordinates. Loading never fails: a missing or malformed file falls back
//! to the default layout so startup is never blocked on bad data.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bindings::{BindingSet, KeyBinding, LogicalControl};
use crate::PlayerError;

/// Well-known file name the bindings live under.
pub const BINDINGS_FILE: &str = "keybindings.json";

/// Persisted shape of one binding; the control name is the map key.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredBinding {
    physical_key: String,
    port: u32,
    index: u32,
    button_id: u32,
}

pub struct BindingStore {
    path: PathBuf,
}

impl BindingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: next to the executable, like the rest of the
    /// player's local state.
    pub fn default_path() -> PathBuf {
        let mut path = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        path.push(BINDINGS_FILE);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted bindings. Absent or malformed data yields the
    /// default set; corruption is logged, never surfaced.
    pub fn load(&self) -> BindingSet {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return BindingSet::defaults(),
        };
        match serde_json::from_str::<BTreeMap<LogicalControl, StoredBinding>>(&contents) {
            Ok(stored) => BindingSet::from_stored(stored.into_iter().map(|(control, b)| {
                KeyBinding {
                    control,
                    physical_key: b.physical_key,
                    port: b.port,
                    index: b.index,
                    button_id: b.button_id,
                }
            })),
            Err(e) => {
                warn!(
                    "malformed bindings in {}: {}; using defaults",
                    self.path.display(),
                    e
                );
                BindingSet::defaults()
            }
        }
    }

    /// Serialize all entries. Idempotent; overwrites the previous record.
    pub fn save(&self, set: &BindingSet) -> Result<(), PlayerError> {
        let stored: BTreeMap<LogicalControl, StoredBinding> = set
            .iter()
            .map(|b| {
                (
                    b.control,
                    StoredBinding {
                        physical_key: b.physical_key.clone(),
                        port: b.port,
                        index: b.index,
                        button_id: b.button_id,
                    },
                )
            })
            .collect();
        let contents = serde_json::to_string_pretty(&stored)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Update one entry by control name. The caller persists afterward with
    /// [`save`](Self::save). Unknown names fail without mutating the set.
    pub fn rebind(
        &self,
        set: &mut BindingSet,
        name: &str,
        new_key: &str,
    ) -> Result<(), PlayerError> {
        set.rebind_named(name, new_key)
    }

    /// Restore the default layout and persist it immediately.
    pub fn reset(&self) -> Result<BindingSet, PlayerError> {
        let set = BindingSet::defaults();
        self.save(&set)?;
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> BindingStore {
        let dir = std::env::temp_dir().join("shelf_player_test_bindings");
        fs::create_dir_all(&dir).unwrap();
        BindingStore::new(dir.join(name))
    }

    #[test]
    fn load_on_empty_storage_yields_defaults() {
        let store = temp_store("absent.json");
        let _ = fs::remove_file(store.path());

        let set = store.load();
        assert_eq!(set.len(), 12);
        for control in LogicalControl::ALL {
            assert_eq!(set.get(control).physical_key, control.default_key());
        }
    }

    #[test]
    fn rebind_save_load_roundtrip() {
        let store = temp_store("roundtrip.json");
        let mut set = store.load();

        store.rebind(&mut set, "Start", "p").unwrap();
        store.save(&set).unwrap();

        let reloaded = store.load();
        assert_eq!(reloaded.get(LogicalControl::Start).physical_key, "p");
        // The other eleven entries are untouched.
        for control in LogicalControl::ALL {
            if control != LogicalControl::Start {
                assert_eq!(reloaded.get(control).physical_key, control.default_key());
            }
        }

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn rebind_unknown_name_leaves_set_unmodified() {
        let store = temp_store("unchanged.json");
        let mut set = store.load();
        let before = set.clone();

        let err = store.rebind(&mut set, "NotAControl", "z").unwrap_err();
        assert!(matches!(err, PlayerError::InvalidControlName(_)));
        assert_eq!(set, before);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let store = temp_store("corrupt.json");
        fs::write(store.path(), "{ not json at all").unwrap();

        let set = store.load();
        assert_eq!(set.get(LogicalControl::A).physical_key, "x");

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn unknown_control_key_in_file_counts_as_corrupt() {
        let store = temp_store("unknown_key.json");
        fs::write(
            store.path(),
            r#"{"Warp Button": {"physical_key": "z", "port": 0, "index": 0, "button_id": 99}}"#,
        )
        .unwrap();

        // The control set is closed, so the record fails to parse and the
        // defaults win.
        let set = store.load();
        assert_eq!(set.len(), 12);
        assert_eq!(set.get(LogicalControl::B).physical_key, "z");

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn reset_restores_defaults_and_persists() {
        let store = temp_store("reset.json");
        let mut set = store.load();
        set.rebind(LogicalControl::Start, "p");
        store.save(&set).unwrap();

        let fresh = store.reset().unwrap();
        assert_eq!(fresh.get(LogicalControl::Start).physical_key, "Enter");

        let reloaded = store.load();
        assert_eq!(reloaded.get(LogicalControl::Start).physical_key, "Enter");

        let _ = fs::remove_file(store.path());
    }
}
