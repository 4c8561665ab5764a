use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::persona::PersonaTrait;

/// A declarative diff attached to a choice.
///
/// Every field merges into a disjoint part of the player state, so the
/// order in which fields are applied is not observable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectBundle {
    /// Additive stat deltas. Keys need not exist on the state yet.
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    #[serde(default)]
    pub morality: i64,
    #[serde(default)]
    pub trauma: i64,
    #[serde(default)]
    pub stress: i64,
    #[serde(default)]
    pub persona: BTreeMap<PersonaTrait, i64>,
    /// Appended to inventory; duplicates are kept.
    #[serde(default)]
    pub inventory_add: Vec<String>,
    /// Unioned into the flag set.
    #[serde(default)]
    pub flags_set: Vec<String>,
    #[serde(default)]
    pub relationships: BTreeMap<String, i64>,
    /// Narrative log line for the event feed.
    #[serde(default)]
    pub push_event: Option<String>,
}

impl EffectBundle {
    /// Returns true if every delta is zero and nothing is added.
    pub fn is_noop(&self) -> bool {
        self.stats.values().all(|d| *d == 0)
            && self.morality == 0
            && self.trauma == 0
            && self.stress == 0
            && self.persona.values().all(|d| *d == 0)
            && self.inventory_add.is_empty()
            && self.flags_set.is_empty()
            && self.relationships.values().all(|d| *d == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_noop() {
        assert!(EffectBundle::default().is_noop());
    }

    #[test]
    fn push_event_alone_is_noop() {
        let fx = EffectBundle {
            push_event: Some("Water is life.".to_string()),
            ..Default::default()
        };
        assert!(fx.is_noop());
    }

    #[test]
    fn any_delta_is_not_noop() {
        let fx = EffectBundle {
            flags_set: vec!["d1_water_cached".to_string()],
            ..Default::default()
        };
        assert!(!fx.is_noop());

        let fx = EffectBundle {
            stats: BTreeMap::from([("stamina".to_string(), -2)]),
            ..Default::default()
        };
        assert!(!fx.is_noop());
    }
}
