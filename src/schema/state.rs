use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::persona::{Persona, PersonaTrait};

pub const DEFAULT_START_SCENE: &str = "intro";
pub const DEFAULT_CHARACTER_NAME: &str = "Player";
pub const DEFAULT_STAT_VALUE: i64 = 5;
pub const BASE_STATS: [&str; 4] = ["strength", "agility", "willpower", "charisma"];

/// In-game day/hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameClock {
    pub day: u32,
    pub hour: u32,
}

impl Default for GameClock {
    fn default() -> Self {
        Self { day: 0, hour: 12 }
    }
}

impl GameClock {
    /// Move the clock forward by `hours`, rolling over into days at 24.
    ///
    /// The day count saturates at `u32::MAX` rather than wrapping.
    pub fn advanced(self, hours: u32) -> GameClock {
        let total = u64::from(self.hour) + u64::from(hours);
        let day = u64::from(self.day) + total / 24;
        GameClock {
            day: u32::try_from(day).unwrap_or(u32::MAX),
            hour: (total % 24) as u32,
        }
    }

    /// Hours elapsed since day 0, hour 0.
    pub fn total_hours(&self) -> u64 {
        self.day as u64 * 24 + self.hour as u64
    }
}

impl fmt::Display for GameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {} · {:02}:00", self.day, self.hour)
    }
}

/// One committed decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub scene: String,
    pub choice: String,
    /// Clock reading when the choice was taken.
    pub at: GameClock,
}

/// The persistent record of one playthrough.
///
/// Only the reducer and the controller mutate it. Flags only ever grow and
/// history is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub scene: String,
    pub character_name: String,
    pub stats: BTreeMap<String, i64>,
    pub morality: i64,
    pub trauma: i64,
    pub stress: i64,
    /// Accumulated trait scores. The persona label is derived from these.
    #[serde(default)]
    pub persona_scores: BTreeMap<PersonaTrait, i64>,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub relationships: BTreeMap<String, i64>,
    #[serde(default)]
    pub flags: FxHashSet<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub clock: GameClock,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(DEFAULT_START_SCENE)
    }
}

impl PlayerState {
    /// Fresh state at `scene` with the fixed new-game defaults.
    pub fn new(scene: &str) -> Self {
        Self {
            scene: scene.to_string(),
            character_name: DEFAULT_CHARACTER_NAME.to_string(),
            stats: BASE_STATS
                .iter()
                .map(|s| (s.to_string(), DEFAULT_STAT_VALUE))
                .collect(),
            morality: 0,
            trauma: 0,
            stress: 0,
            persona_scores: BTreeMap::new(),
            inventory: Vec::new(),
            relationships: BTreeMap::new(),
            flags: FxHashSet::default(),
            history: Vec::new(),
            clock: GameClock::default(),
        }
    }

    /// The active persona, recomputed from the current scores on every call.
    pub fn persona(&self) -> Persona {
        Persona::classify(&self.persona_scores)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.iter().any(|i| i == item)
    }

    pub fn stat(&self, name: &str) -> i64 {
        self.stats.get(name).copied().unwrap_or(0)
    }

    pub fn relationship(&self, name: &str) -> i64 {
        self.relationships.get(name).copied().unwrap_or(0)
    }
}
