use serde::{Deserialize, Serialize};

use super::effect::EffectBundle;
use super::requirement::Requirement;

/// An edge from one scene to another, carrying optional effects and gating.
///
/// Choice ids are unique within their owning scene only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
    pub go_to: String,
    #[serde(default)]
    pub effects: EffectBundle,
    #[serde(default)]
    pub requirement: Option<Requirement>,
    /// Shown only when the requirement fails.
    #[serde(default)]
    pub blocked_reason: Option<String>,
    /// Classification tags for branching statistics; never used for gating.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Extra hours this choice takes, on top of the owning scene's time cost.
    #[serde(default)]
    pub time_delta: Option<u32>,
}

/// A node in the narrative graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub text: String,
    pub choices: Vec<Choice>,
    /// Hours spent in this scene before moving on.
    #[serde(default)]
    pub time_delta: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Authored ending label (e.g. "death", "escape"). Ending scenes have no choices.
    #[serde(default)]
    pub ending: Option<String>,
}

impl Scene {
    /// Find a declared choice by id.
    pub fn choice(&self, id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }

    /// Returns true if the scene declares no choices at all.
    pub fn is_ending(&self) -> bool {
        self.choices.is_empty()
    }

    /// Outbound targets, in declaration order.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(|c| c.go_to.as_str())
    }
}
