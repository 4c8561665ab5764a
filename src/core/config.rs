/// Game configuration: which shards to compose and how a new game starts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::composer::{Composer, ScenePatch};
use crate::core::persistence::{FileStore, DEFAULT_SAVE_SLOT};
use crate::schema::state::{
    GameClock, PlayerState, BASE_STATS, DEFAULT_CHARACTER_NAME, DEFAULT_START_SCENE,
    DEFAULT_STAT_VALUE,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Top-level game configuration, usually read from a `game.ron` file.
///
/// Shard paths are resolved against `base_dir`, which `load_from_ron` sets
/// to the config file's directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub start_scene: String,
    pub character_name: String,
    pub stats: BTreeMap<String, i64>,
    pub inventory: Vec<String>,
    pub clock: GameClock,
    pub save_slot: String,
    pub save_dir: PathBuf,
    /// Shard files in merge order; later files override earlier ones.
    pub shards: Vec<PathBuf>,
    pub patches: Vec<ScenePatch>,
    pub known_flags: Vec<String>,
    pub known_items: Vec<String>,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_scene: DEFAULT_START_SCENE.to_string(),
            character_name: DEFAULT_CHARACTER_NAME.to_string(),
            stats: BASE_STATS
                .iter()
                .map(|s| (s.to_string(), DEFAULT_STAT_VALUE))
                .collect(),
            inventory: Vec::new(),
            clock: GameClock::default(),
            save_slot: DEFAULT_SAVE_SLOT.to_string(),
            save_dir: PathBuf::from("saves"),
            shards: Vec::new(),
            patches: Vec::new(),
            known_flags: Vec::new(),
            known_items: Vec::new(),
            base_dir: PathBuf::new(),
        }
    }
}

impl GameConfig {
    pub fn load_from_ron(path: &Path) -> Result<GameConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse_ron(&contents)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn parse_ron(input: &str) -> Result<GameConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// A composer preloaded with this config's shards, patches and vocabulary.
    ///
    /// The starting inventory counts as obtainable for item requirements.
    pub fn composer(&self) -> Composer {
        let mut composer = Composer::new().start(&self.start_scene);
        for shard in &self.shards {
            composer = composer.shard_file(self.resolve(shard));
        }
        for patch in &self.patches {
            composer = composer.patch(patch.clone());
        }
        composer
            .known_flags(self.known_flags.iter().cloned())
            .known_items(self.known_items.iter().chain(self.inventory.iter()).cloned())
    }

    /// Fresh player state for a new game.
    pub fn new_game(&self) -> PlayerState {
        let mut state = PlayerState::new(&self.start_scene);
        state.character_name = self.character_name.clone();
        state.stats = self.stats.clone();
        state.inventory = self.inventory.clone();
        state.clock = self.clock;
        state
    }

    pub fn save_store(&self) -> FileStore {
        FileStore::new(self.resolve(&self.save_dir))
    }
}
