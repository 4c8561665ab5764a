/// Content composition: merging ordered shards into one scene graph.
///
/// Shards are applied in caller order and a later shard's scene replaces
/// an earlier one with the same id. Patches run after the merge, then the
/// whole graph is validated before a database is handed out.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::database::ContentDatabase;
use crate::core::shard::{ChoiceDef, ContentShard, EffectDef, SceneDef, ShardError};
use crate::schema::effect::EffectBundle;
use crate::schema::persona::PersonaTrait;
use crate::schema::requirement::Requirement;
use crate::schema::scene::{Choice, Scene};
use crate::schema::state::DEFAULT_START_SCENE;

#[derive(Debug, Error)]
pub enum ContentIntegrityError {
    #[error("shard error: {0}")]
    Shard(#[from] ShardError),
    #[error("scene under key '{key}' in shard '{shard}' has no id")]
    MissingSceneId { shard: String, key: String },
    #[error("scene '{id}' is stored under mismatched key '{key}' in shard '{shard}'")]
    SceneIdMismatch {
        shard: String,
        key: String,
        id: String,
    },
    #[error("scene '{scene}' has a choice with no id")]
    MissingChoiceId { scene: String },
    #[error("scene '{scene}' declares choice '{choice}' more than once")]
    DuplicateChoice { scene: String, choice: String },
    #[error("scene '{scene}': choice '{choice}' has no goTo")]
    MissingTarget { scene: String, choice: String },
    #[error("scene '{scene}': choice '{choice}' points at missing scene '{target}'")]
    DanglingTarget {
        scene: String,
        choice: String,
        target: String,
    },
    #[error("scene '{scene}' is marked as an ending but declares choices")]
    EndingWithChoices { scene: String },
    #[error("scene '{scene}': choice '{choice}' scores unknown persona trait '{name}'")]
    UnknownTrait {
        scene: String,
        choice: String,
        name: String,
    },
    #[error("scene '{scene}': choice '{choice}' gates on flag '{flag}' that nothing sets")]
    UnknownFlag {
        scene: String,
        choice: String,
        flag: String,
    },
    #[error("scene '{scene}': choice '{choice}' requires item '{item}' that nothing grants")]
    UnknownItem {
        scene: String,
        choice: String,
        item: String,
    },
    #[error("patch targets missing scene '{scene}'")]
    PatchMissingScene { scene: String },
    #[error("patch targets missing choice '{choice}' in scene '{scene}'")]
    PatchMissingChoice { scene: String, choice: String },
    #[error("start scene '{0}' is not defined")]
    MissingStartScene(String),
}

/// A field-level override applied after all shards are merged.
///
/// Lets a later shard graft itself onto an earlier one without redefining
/// the anchor scene wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScenePatch {
    /// Point one existing choice at a new target.
    Retarget {
        scene: String,
        choice: String,
        go_to: String,
    },
    /// Add an outbound choice to an existing scene.
    AppendChoice { scene: String, choice: ChoiceDef },
}

enum ShardSource {
    Loaded(ContentShard),
    File(PathBuf),
}

/// Builder for a `ContentDatabase`.
pub struct Composer {
    sources: Vec<ShardSource>,
    patches: Vec<ScenePatch>,
    start: String,
    known_flags: FxHashSet<String>,
    known_items: FxHashSet<String>,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            patches: Vec::new(),
            start: DEFAULT_START_SCENE.to_string(),
            known_flags: FxHashSet::default(),
            known_items: FxHashSet::default(),
        }
    }

    /// Designate the start scene. Defaults to "intro".
    pub fn start(mut self, id: &str) -> Self {
        self.start = id.to_string();
        self
    }

    /// Append an in-memory shard. Later shards override earlier ones.
    pub fn shard(mut self, shard: ContentShard) -> Self {
        self.sources.push(ShardSource::Loaded(shard));
        self
    }

    /// Append a shard file (`.ron` or `.json`), read during `build`.
    pub fn shard_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(ShardSource::File(path.into()));
        self
    }

    pub fn patch(mut self, patch: ScenePatch) -> Self {
        self.patches.push(patch);
        self
    }

    /// Declare flags that are set outside of content effects.
    pub fn known_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_flags.extend(flags.into_iter().map(Into::into));
        self
    }

    /// Declare items available outside of content effects, such as a starting kit.
    pub fn known_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_items.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<ContentDatabase, ContentIntegrityError> {
        let mut merged: HashMap<String, SceneDef> = HashMap::new();

        for source in self.sources {
            let shard = match source {
                ShardSource::Loaded(shard) => shard,
                ShardSource::File(path) => ContentShard::load(&path)?,
            };
            merge_shard(&mut merged, shard)?;
        }

        for patch in self.patches {
            apply_patch(&mut merged, patch)?;
        }

        let mut keys: Vec<String> = merged.keys().cloned().collect();
        keys.sort_unstable();

        let mut scenes = HashMap::with_capacity(merged.len());
        for key in keys {
            if let Some(def) = merged.remove(&key) {
                let scene = convert_scene(key.clone(), def)?;
                scenes.insert(key, scene);
            }
        }

        validate_graph(&scenes, &self.start, &self.known_flags, &self.known_items)?;

        tracing::info!(scenes = scenes.len(), start = %self.start, "content database built");
        Ok(ContentDatabase::new(scenes, self.start))
    }
}

fn merge_shard(
    merged: &mut HashMap<String, SceneDef>,
    shard: ContentShard,
) -> Result<(), ContentIntegrityError> {
    tracing::debug!(shard = %shard.name, scenes = shard.scenes.len(), "merging shard");
    for (key, scene) in shard.scenes {
        match scene.id.as_deref() {
            None | Some("") => {
                return Err(ContentIntegrityError::MissingSceneId {
                    shard: shard.name.clone(),
                    key,
                });
            }
            Some(id) if id != key => {
                return Err(ContentIntegrityError::SceneIdMismatch {
                    shard: shard.name.clone(),
                    key,
                    id: id.to_string(),
                });
            }
            Some(_) => {}
        }
        if merged.insert(key.clone(), scene).is_some() {
            tracing::debug!(shard = %shard.name, scene = %key, "scene replaced by later shard");
        }
    }
    Ok(())
}

fn apply_patch(
    merged: &mut HashMap<String, SceneDef>,
    patch: ScenePatch,
) -> Result<(), ContentIntegrityError> {
    match patch {
        ScenePatch::Retarget {
            scene,
            choice,
            go_to,
        } => {
            let def = merged
                .get_mut(&scene)
                .ok_or_else(|| ContentIntegrityError::PatchMissingScene {
                    scene: scene.clone(),
                })?;
            let choice_def = def
                .choices
                .iter_mut()
                .find(|c| c.id == choice)
                .ok_or_else(|| ContentIntegrityError::PatchMissingChoice {
                    scene: scene.clone(),
                    choice: choice.clone(),
                })?;
            tracing::debug!(%scene, %choice, %go_to, "retargeting choice");
            choice_def.go_to = Some(go_to);
        }
        ScenePatch::AppendChoice { scene, choice } => {
            let def = merged
                .get_mut(&scene)
                .ok_or_else(|| ContentIntegrityError::PatchMissingScene {
                    scene: scene.clone(),
                })?;
            tracing::debug!(%scene, choice = %choice.id, "appending choice");
            def.choices.push(choice);
        }
    }
    Ok(())
}

fn convert_scene(id: String, def: SceneDef) -> Result<Scene, ContentIntegrityError> {
    if (def.is_ending || def.ending_type.is_some()) && !def.choices.is_empty() {
        return Err(ContentIntegrityError::EndingWithChoices { scene: id });
    }

    let mut seen = FxHashSet::default();
    let mut choices = Vec::with_capacity(def.choices.len());
    for choice in def.choices {
        if choice.id.is_empty() {
            return Err(ContentIntegrityError::MissingChoiceId { scene: id });
        }
        if !seen.insert(choice.id.clone()) {
            return Err(ContentIntegrityError::DuplicateChoice {
                scene: id,
                choice: choice.id,
            });
        }
        choices.push(convert_choice(&id, choice)?);
    }

    let ending = if def.is_ending || def.ending_type.is_some() {
        Some(def.ending_type.unwrap_or_else(|| "ending".to_string()))
    } else {
        None
    };

    Ok(Scene {
        id,
        text: def.text,
        choices,
        time_delta: def.time_delta,
        tags: def.tags,
        ending,
    })
}

fn convert_choice(scene: &str, def: ChoiceDef) -> Result<Choice, ContentIntegrityError> {
    let go_to = match def.go_to {
        Some(target) if !target.is_empty() => target,
        _ => {
            return Err(ContentIntegrityError::MissingTarget {
                scene: scene.to_string(),
                choice: def.id,
            });
        }
    };

    let fx = def.effects.unwrap_or_default();
    let time_delta = fx.time;
    let effects = convert_effects(scene, &def.id, fx)?;

    let requirement = def
        .req
        .map(|req| Requirement {
            required_flags: req.flags,
            excluded_flags: req.not_flags,
            required_items: req.items,
        })
        .filter(|req| !req.is_empty());

    Ok(Choice {
        id: def.id,
        text: def.text,
        go_to,
        effects,
        requirement,
        blocked_reason: def.blocked_reason,
        tags: def.tags,
        time_delta,
    })
}

fn convert_effects(
    scene: &str,
    choice: &str,
    fx: EffectDef,
) -> Result<EffectBundle, ContentIntegrityError> {
    let mut persona = std::collections::BTreeMap::new();
    for (name, delta) in fx.persona {
        let trait_id =
            PersonaTrait::from_name(&name).ok_or_else(|| ContentIntegrityError::UnknownTrait {
                scene: scene.to_string(),
                choice: choice.to_string(),
                name: name.clone(),
            })?;
        *persona.entry(trait_id).or_insert(0) += delta;
    }

    Ok(EffectBundle {
        stats: fx.stats,
        morality: fx.morality,
        trauma: fx.trauma,
        stress: fx.stress,
        persona,
        inventory_add: fx.inventory_add,
        flags_set: fx.flags_set,
        relationships: fx.relationships,
        push_event: fx.push_event,
    })
}

fn validate_graph(
    scenes: &HashMap<String, Scene>,
    start: &str,
    known_flags: &FxHashSet<String>,
    known_items: &FxHashSet<String>,
) -> Result<(), ContentIntegrityError> {
    if !scenes.contains_key(start) {
        return Err(ContentIntegrityError::MissingStartScene(start.to_string()));
    }

    let mut flag_vocab: FxHashSet<&str> = known_flags.iter().map(String::as_str).collect();
    let mut item_vocab: FxHashSet<&str> = known_items.iter().map(String::as_str).collect();
    for scene in scenes.values() {
        for choice in &scene.choices {
            flag_vocab.extend(choice.effects.flags_set.iter().map(String::as_str));
            item_vocab.extend(choice.effects.inventory_add.iter().map(String::as_str));
        }
    }

    let mut ids: Vec<&String> = scenes.keys().collect();
    ids.sort_unstable();

    for id in ids {
        let scene = &scenes[id];
        for choice in &scene.choices {
            if !scenes.contains_key(&choice.go_to) {
                return Err(ContentIntegrityError::DanglingTarget {
                    scene: id.clone(),
                    choice: choice.id.clone(),
                    target: choice.go_to.clone(),
                });
            }
            let Some(req) = &choice.requirement else {
                continue;
            };
            if let Some(flag) = req.flags().find(|f| !flag_vocab.contains(f)) {
                return Err(ContentIntegrityError::UnknownFlag {
                    scene: id.clone(),
                    choice: choice.id.clone(),
                    flag: flag.to_string(),
                });
            }
            if let Some(item) = req
                .required_items
                .iter()
                .find(|i| !item_vocab.contains(i.as_str()))
            {
                return Err(ContentIntegrityError::UnknownItem {
                    scene: id.clone(),
                    choice: choice.id.clone(),
                    item: item.clone(),
                });
            }
        }
    }

    Ok(())
}
