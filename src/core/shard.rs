/// Content shards: the authored, serialized form of a batch of scenes.
///
/// Shards are plain data. They keep the loose, string-keyed shape content
/// is written in; the composer validates them and converts them into the
/// typed scene model.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported shard format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementDef {
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default, alias = "flagsNone")]
    pub not_flags: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectDef {
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    #[serde(default)]
    pub morality: i64,
    #[serde(default)]
    pub trauma: i64,
    #[serde(default)]
    pub stress: i64,
    /// Trait name to score delta. Names are checked at composition.
    #[serde(default)]
    pub persona: BTreeMap<String, i64>,
    #[serde(default)]
    pub inventory_add: Vec<String>,
    #[serde(default)]
    pub flags_set: Vec<String>,
    #[serde(default)]
    pub relationships: BTreeMap<String, i64>,
    #[serde(default)]
    pub push_event: Option<String>,
    /// Extra hours this choice takes, added to the scene's time cost.
    #[serde(default)]
    pub time: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceDef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "next")]
    pub go_to: Option<String>,
    #[serde(default)]
    pub effects: Option<EffectDef>,
    #[serde(default)]
    pub req: Option<RequirementDef>,
    #[serde(default)]
    pub blocked_reason: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub choices: Vec<ChoiceDef>,
    #[serde(default)]
    pub time_delta: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_ending: bool,
    #[serde(default)]
    pub ending_type: Option<String>,
}

/// One independently authored batch of scenes.
#[derive(Debug, Clone, Default)]
pub struct ContentShard {
    /// Where the shard came from, for diagnostics.
    pub name: String,
    pub scenes: HashMap<String, SceneDef>,
}

impl ContentShard {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            scenes: HashMap::new(),
        }
    }

    /// Add or replace a scene, keyed by its own id (or the empty key if it has none).
    pub fn with_scene(mut self, scene: SceneDef) -> Self {
        let key = scene.id.clone().unwrap_or_default();
        self.scenes.insert(key, scene);
        self
    }

    /// Parse a shard from a RON map of scene id to scene.
    pub fn parse_ron(name: &str, input: &str) -> Result<ContentShard, ShardError> {
        let scenes: HashMap<String, SceneDef> = ron::from_str(input)?;
        Ok(ContentShard {
            name: name.to_string(),
            scenes,
        })
    }

    /// Parse a shard from a JSON object of scene id to scene.
    pub fn parse_json(name: &str, input: &str) -> Result<ContentShard, ShardError> {
        let scenes: HashMap<String, SceneDef> = serde_json::from_str(input)?;
        Ok(ContentShard {
            name: name.to_string(),
            scenes,
        })
    }

    /// Load a shard from a `.ron` or `.json` file.
    pub fn load(path: &Path) -> Result<ContentShard, ShardError> {
        let name = path.display().to_string();
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        match extension {
            "ron" => {
                let contents = std::fs::read_to_string(path)?;
                Self::parse_ron(&name, &contents)
            }
            "json" => {
                let contents = std::fs::read_to_string(path)?;
                Self::parse_json(&name, &contents)
            }
            _ => Err(ShardError::UnsupportedFormat(name)),
        }
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_json_with_authored_field_names() {
        let json = r#"{
            "solo_water_management": {
                "id": "solo_water_management",
                "text": "The taps sputter.",
                "choices": [
                    {
                        "id": "swm_bathtub",
                        "text": "Fill bathtub and every container",
                        "goTo": "solo_apartment_hub",
                        "effects": {
                            "stats": { "stress": -1, "stamina": -2 },
                            "inventoryAdd": ["water_jugs", "bathtub_water"],
                            "flagsSet": ["d1_water_cached", "d1_bath_filled"],
                            "pushEvent": "Water slaps porcelain."
                        },
                        "tags": ["fixer"]
                    }
                ],
                "timeDelta": 2
            }
        }"#;
        let shard = ContentShard::parse_json("day1", json).unwrap();
        assert_eq!(shard.len(), 1);
        let scene = &shard.scenes["solo_water_management"];
        assert_eq!(scene.time_delta, 2);
        let choice = &scene.choices[0];
        assert_eq!(choice.go_to.as_deref(), Some("solo_apartment_hub"));
        let fx = choice.effects.as_ref().unwrap();
        assert_eq!(fx.stats["stamina"], -2);
        assert_eq!(fx.inventory_add, vec!["water_jugs", "bathtub_water"]);
        assert_eq!(fx.push_event.as_deref(), Some("Water slaps porcelain."));
    }

    #[test]
    fn parse_json_requirement_aliases() {
        let json = r#"{
            "router": {
                "id": "router",
                "text": "Night holds its breath.",
                "choices": [
                    { "id": "a", "text": "A", "goTo": "x", "req": { "notFlags": ["d1_hall_dark"] } },
                    { "id": "b", "text": "B", "next": "y", "req": { "flagsNone": ["d1_hall_dark"], "items": ["flare"] } }
                ]
            }
        }"#;
        let shard = ContentShard::parse_json("router", json).unwrap();
        let choices = &shard.scenes["router"].choices;
        assert_eq!(choices[0].req.as_ref().unwrap().not_flags, vec!["d1_hall_dark"]);
        assert_eq!(choices[1].go_to.as_deref(), Some("y"));
        let req = choices[1].req.as_ref().unwrap();
        assert_eq!(req.not_flags, vec!["d1_hall_dark"]);
        assert_eq!(req.items, vec!["flare"]);
    }

    #[test]
    fn parse_ron_shard() {
        let ron = r#"#![enable(implicit_some)]
        {
            "intro": (
                id: "intro",
                text: "The sirens start at noon.",
                choices: [
                    (id: "go", text: "Run", goTo: "ending_run", effects: (stress: 2)),
                ],
                timeDelta: 1,
            ),
            "ending_run": (
                id: "ending_run",
                text: "You run.",
                isEnding: true,
                endingType: "escape",
            ),
        }"#;
        let shard = ContentShard::parse_ron("base", ron).unwrap();
        assert_eq!(shard.len(), 2);
        assert_eq!(shard.scenes["intro"].choices[0].effects.as_ref().unwrap().stress, 2);
        assert!(shard.scenes["ending_run"].is_ending);
        assert_eq!(shard.scenes["ending_run"].ending_type.as_deref(), Some("escape"));
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(ContentShard::parse_json("bad", "{ \"intro\": 7 }").is_err());
        assert!(ContentShard::parse_ron("bad", "{ \"intro\": ( text: 3 ) }").is_err());
    }

    #[test]
    fn unsupported_extension() {
        let err = ContentShard::load(Path::new("content/day1.js")).unwrap_err();
        assert!(matches!(err, ShardError::UnsupportedFormat(_)));
    }

    #[test]
    fn load_fixture_shard() {
        let shard = ContentShard::load(Path::new("tests/fixtures/solo_day1.ron")).unwrap();
        assert!(shard.scenes.contains_key("solo_apartment_hub"));
        assert!(shard.scenes.contains_key("solo_water_management"));
    }
}
