//! Durable single-slot save states.
//!
//! One record per game, keyed by a SHA-256 digest of the ROM reference so
//! arbitrary URLs and paths become safe file names. The blob is stored
//! base64-encoded inside a small JSON record with the save time. A missing
//! or malformed record simply means "no saved state".

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use log::warn;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use shelf_core::types::{RomRef, StateBlob};

use crate::PlayerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateRecord {
    /// Base64-encoded runtime state blob.
    data: String,
    /// UNIX seconds at save time.
    timestamp: u64,
}

pub struct SaveStateStore {
    dir: PathBuf,
}

impl SaveStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default location: a `states` directory next to the executable.
    pub fn default_dir() -> PathBuf {
        let mut path = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("states");
        path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stable storage key for a ROM reference.
    pub fn rom_key(rom: &RomRef) -> String {
        let mut hasher = Sha256::new();
        hasher.update(rom.as_str().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn slot_path(&self, rom: &RomRef) -> PathBuf {
        self.dir.join(format!("{}.json", Self::rom_key(rom)))
    }

    /// Read the slot for `rom`. Absent or malformed records yield `None`;
    /// corruption is logged and treated as an empty slot.
    pub fn load(&self, rom: &RomRef) -> Option<StateBlob> {
        let path = self.slot_path(rom);
        let contents = fs::read_to_string(&path).ok()?;
        let record: StateRecord = match serde_json::from_str(&contents) {
            Ok(record) => record,
            Err(e) => {
                warn!("malformed save state {}: {}", path.display(), e);
                return None;
            }
        };
        match BASE64.decode(&record.data) {
            Ok(bytes) => Some(StateBlob(bytes)),
            Err(e) => {
                warn!("undecodable save state {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write `blob` into the slot for `rom`, replacing any previous state.
    pub fn save(&self, rom: &RomRef, blob: &StateBlob) -> Result<(), PlayerError> {
        fs::create_dir_all(&self.dir)?;
        let record = StateRecord {
            data: BASE64.encode(blob.as_bytes()),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };
        let contents = serde_json::to_string_pretty(&record)?;
        fs::write(self.slot_path(rom), contents)?;
        Ok(())
    }

    /// Drop the slot for `rom`, if any.
    pub fn clear(&self, rom: &RomRef) -> Result<(), PlayerError> {
        match fs::remove_file(self.slot_path(rom)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> SaveStateStore {
        SaveStateStore::new(std::env::temp_dir().join("shelf_player_test_states").join(name))
    }

    #[test]
    fn rom_key_is_stable_and_filename_safe() {
        let rom = RomRef::new("/roms/web/12/Super Game (USA).sfc");
        let key = SaveStateStore::rom_key(&rom);
        assert_eq!(key.len(), 64);
        assert_eq!(key, SaveStateStore::rom_key(&rom));
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn save_load_roundtrip_preserves_binary_data() {
        let store = temp_store("roundtrip");
        let rom = RomRef::new("game.nes");
        let blob = StateBlob(vec![0x00, 0x01, 0xFF, 0xFE]);

        store.save(&rom, &blob).expect("save");
        assert_eq!(store.load(&rom), Some(blob));

        store.clear(&rom).expect("clear");
        assert_eq!(store.load(&rom), None);
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn second_save_overwrites_the_slot() {
        let store = temp_store("overwrite");
        let rom = RomRef::new("game.nes");

        store.save(&rom, &StateBlob(vec![1])).expect("first");
        store.save(&rom, &StateBlob(vec![2, 3])).expect("second");
        assert_eq!(store.load(&rom), Some(StateBlob(vec![2, 3])));
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn malformed_record_reads_as_empty_slot() {
        let store = temp_store("corrupt");
        let rom = RomRef::new("game.nes");

        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.dir().join(format!("{}.json", SaveStateStore::rom_key(&rom))), "]{")
            .unwrap();
        assert_eq!(store.load(&rom), None);
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn clear_on_empty_slot_is_fine() {
        let store = temp_store("clear_empty");
        let rom = RomRef::new("never-saved.nes");
        store.clear(&rom).expect("clear");
    }
}
