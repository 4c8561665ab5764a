use serde::{Deserialize, Serialize};

/// A conjunction of set-membership checks over flags and inventory.
///
/// An empty clause is vacuously true. There are no OR-groups and no
/// numeric thresholds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(default)]
    pub required_flags: Vec<String>,
    #[serde(default)]
    pub excluded_flags: Vec<String>,
    #[serde(default)]
    pub required_items: Vec<String>,
}

impl Requirement {
    /// Returns true if no clause constrains anything.
    pub fn is_empty(&self) -> bool {
        self.required_flags.is_empty()
            && self.excluded_flags.is_empty()
            && self.required_items.is_empty()
    }

    /// Every flag token this requirement mentions, required or excluded.
    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.required_flags
            .iter()
            .chain(self.excluded_flags.iter())
            .map(String::as_str)
    }

    /// Human-readable summary, used when content gives no blocked reason.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.required_items.is_empty() {
            parts.push(format!("Need: {}", self.required_items.join(", ")));
        }
        if !self.required_flags.is_empty() {
            parts.push(format!("Flags: {}", self.required_flags.join(", ")));
        }
        if !self.excluded_flags.is_empty() {
            parts.push(format!("Not after: {}", self.excluded_flags.join(", ")));
        }
        parts.join(" · ")
    }
}
