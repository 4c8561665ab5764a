use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of persona traits that effects may score.
///
/// Variant order is the declaration order used to break ties when two
/// traits share the highest score: the earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaTrait {
    Fixer,
    Protector,
    Warlord,
    Psycho,
    Nice,
    Chill,
    Killer,
    Sociopath,
}

impl PersonaTrait {
    /// Every trait, in declaration order.
    pub const ALL: [PersonaTrait; 8] = [
        Self::Fixer,
        Self::Protector,
        Self::Warlord,
        Self::Psycho,
        Self::Nice,
        Self::Chill,
        Self::Killer,
        Self::Sociopath,
    ];

    /// The authored name of this trait (e.g., "fixer").
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixer => "fixer",
            Self::Protector => "protector",
            Self::Warlord => "warlord",
            Self::Psycho => "psycho",
            Self::Nice => "nice",
            Self::Chill => "chill",
            Self::Killer => "killer",
            Self::Sociopath => "sociopath",
        }
    }

    /// Look up a trait by its authored name. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<PersonaTrait> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }
}

impl fmt::Display for PersonaTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The active persona label, projected from accumulated trait scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persona {
    /// No trait has a positive score yet.
    Neutral,
    Trait(PersonaTrait),
}

impl Persona {
    /// Derive the persona from a score table.
    ///
    /// The highest-scoring trait wins; ties go to the earlier-declared trait.
    /// A table whose best score is zero or below is `Neutral`.
    pub fn classify(scores: &BTreeMap<PersonaTrait, i64>) -> Persona {
        let mut best: Option<(PersonaTrait, i64)> = None;
        for t in PersonaTrait::ALL {
            let score = scores.get(&t).copied().unwrap_or(0);
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((t, score)),
            }
        }
        match best {
            Some((t, score)) if score > 0 => Persona::Trait(t),
            _ => Persona::Neutral,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Trait(t) => t.name(),
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
