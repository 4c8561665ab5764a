/// Save/load of player state snapshots.
///
/// The engine defines what is persisted (a versioned `SaveFile` in RON);
/// stores decide where it lives. A store never mutates a live state: it
/// receives a snapshot on write and hands back a fresh value on read.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schema::state::PlayerState;

pub const DEFAULT_SAVE_SLOT: &str = "consequence_save_v1";
pub const SAVE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON serialization error: {0}")]
    Encode(#[from] ron::Error),
    #[error("RON deserialization error: {0}")]
    Decode(#[from] ron::error::SpannedError),
    #[error("save slot '{0}' is empty")]
    EmptySlot(String),
    #[error("invalid save slot name '{0}'")]
    InvalidSlot(String),
    #[error("unsupported save version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// On-disk envelope around a player state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    pub state: PlayerState,
}

/// Serialize a snapshot.
pub fn encode(state: &PlayerState) -> Result<String, PersistenceError> {
    let file = SaveFile {
        version: SAVE_FORMAT_VERSION,
        state: state.clone(),
    };
    Ok(ron::ser::to_string_pretty(
        &file,
        ron::ser::PrettyConfig::default(),
    )?)
}

/// Deserialize a snapshot, rejecting unknown format versions.
pub fn decode(input: &str) -> Result<PlayerState, PersistenceError> {
    let file: SaveFile = ron::from_str(input)?;
    if file.version != SAVE_FORMAT_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: file.version,
            expected: SAVE_FORMAT_VERSION,
        });
    }
    Ok(file.state)
}

/// Storage medium for save slots.
pub trait SaveStore {
    fn write(&mut self, slot: &str, state: &PlayerState) -> Result<(), PersistenceError>;
    fn read(&self, slot: &str) -> Result<PlayerState, PersistenceError>;
}

/// Keeps encoded saves in memory. Useful for tests and embedders.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

impl MemoryStore {
    pub fn contains(&self, slot: &str) -> bool {
        self.slots.contains_key(slot)
    }
}

impl SaveStore for MemoryStore {
    fn write(&mut self, slot: &str, state: &PlayerState) -> Result<(), PersistenceError> {
        let encoded = encode(state)?;
        self.slots.insert(slot.to_string(), encoded);
        Ok(())
    }

    fn read(&self, slot: &str) -> Result<PlayerState, PersistenceError> {
        let encoded = self
            .slots
            .get(slot)
            .ok_or_else(|| PersistenceError::EmptySlot(slot.to_string()))?;
        decode(encoded)
    }
}

/// One `<slot>.ron` file per slot inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing `slot`. Slot names must be plain file stems.
    pub fn path_for(&self, slot: &str) -> Result<PathBuf, PersistenceError> {
        let plain = !slot.is_empty()
            && slot != "."
            && slot != ".."
            && !slot.contains(['/', '\\'])
            && !Path::new(slot).is_absolute();
        if !plain {
            return Err(PersistenceError::InvalidSlot(slot.to_string()));
        }
        Ok(self.dir.join(format!("{}.ron", slot)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveStore for FileStore {
    fn write(&mut self, slot: &str, state: &PlayerState) -> Result<(), PersistenceError> {
        let path = self.path_for(slot)?;
        let encoded = encode(state)?;
        std::fs::create_dir_all(&self.dir)?;
        // Write a sibling file and rename it so an existing save is never left half-written.
        let tmp = path.with_extension("ron.tmp");
        std::fs::write(&tmp, encoded)?;
        std::fs::rename(&tmp, &path)?;
        tracing::info!(slot, path = %path.display(), "game saved");
        Ok(())
    }

    fn read(&self, slot: &str) -> Result<PlayerState, PersistenceError> {
        let path = self.path_for(slot)?;
        if !path.exists() {
            return Err(PersistenceError::EmptySlot(slot.to_string()));
        }
        let contents = std::fs::read_to_string(&path)?;
        let state = decode(&contents)?;
        tracing::info!(slot, path = %path.display(), "game loaded");
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::persona::PersonaTrait;
    use crate::schema::state::{GameClock, HistoryEntry};

    fn played_state() -> PlayerState {
        let mut state = PlayerState::new("solo_apartment_hub");
        state.character_name = "Sam".to_string();
        state.stats.insert("stamina".to_string(), -2);
        state.morality = -3;
        state.trauma = 4;
        state.stress = 7;
        state.persona_scores.insert(PersonaTrait::Fixer, 2);
        state.inventory = vec![
            "water_jugs".to_string(),
            "bathtub_water".to_string(),
            "water_jugs".to_string(),
        ];
        state.relationships.insert("Alex".to_string(), -5);
        state.flags.insert("d1_water_cached".to_string());
        state.flags.insert("d1_bath_filled".to_string());
        state.history.push(HistoryEntry {
            scene: "solo_water_management".to_string(),
            choice: "swm_bathtub".to_string(),
            at: GameClock { day: 0, hour: 12 },
        });
        state.clock = GameClock { day: 0, hour: 14 };
        state
    }

    #[test]
    fn encode_decode_round_trip() {
        let state = played_state();
        let decoded = decode(&encode(&state).unwrap()).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(decoded.inventory, state.inventory);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let text = encode(&played_state())
            .unwrap()
            .replacen("version: 1", "version: 99", 1);
        let err = decode(&text).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::UnsupportedVersion { found: 99, expected: 1 }
        ));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            decode("not a save").unwrap_err(),
            PersistenceError::Decode(_)
        ));
    }

    #[test]
    fn memory_store_slots() {
        let mut store = MemoryStore::default();
        assert!(matches!(
            store.read(DEFAULT_SAVE_SLOT),
            Err(PersistenceError::EmptySlot(_))
        ));
        store.write(DEFAULT_SAVE_SLOT, &played_state()).unwrap();
        assert!(store.contains(DEFAULT_SAVE_SLOT));
        assert_eq!(store.read(DEFAULT_SAVE_SLOT).unwrap(), played_state());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("saves"));
        assert!(matches!(
            store.read("slot1"),
            Err(PersistenceError::EmptySlot(_))
        ));

        store.write("slot1", &played_state()).unwrap();
        assert!(store.path_for("slot1").unwrap().exists());
        assert_eq!(store.read("slot1").unwrap(), played_state());

        let mut fresh = PlayerState::default();
        fresh.character_name = "Overwritten".to_string();
        store.write("slot1", &fresh).unwrap();
        assert_eq!(store.read("slot1").unwrap(), fresh);
    }

    #[test]
    fn file_store_rejects_slots_outside_its_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("saves"));
        for slot in ["../escape", "nested/slot", "..\\escape", "..", ".", ""] {
            assert!(
                matches!(
                    store.write(slot, &played_state()),
                    Err(PersistenceError::InvalidSlot(_))
                ),
                "slot {:?} was accepted",
                slot
            );
            assert!(matches!(
                store.read(slot),
                Err(PersistenceError::InvalidSlot(_))
            ));
        }
        assert!(!dir.path().join("escape.ron").exists());
        assert!(!dir.path().join("saves").exists());
    }
}
