/// Requirement evaluation: pure set-membership gating of choices.

use crate::schema::requirement::Requirement;
use crate::schema::scene::Choice;
use crate::schema::state::PlayerState;

/// Gating status of one choice against a player state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Open,
    Blocked { reason: String },
}

impl Gate {
    pub fn is_open(&self) -> bool {
        matches!(self, Gate::Open)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Gate::Open => None,
            Gate::Blocked { reason } => Some(reason),
        }
    }
}

/// Returns true if `state` satisfies every clause of `requirement`.
///
/// Required flags must all be set, excluded flags must all be unset, and
/// each required item must appear at least once in the inventory.
pub fn allowed(requirement: &Requirement, state: &PlayerState) -> bool {
    requirement
        .required_flags
        .iter()
        .all(|f| state.has_flag(f))
        && !requirement
            .excluded_flags
            .iter()
            .any(|f| state.has_flag(f))
        && requirement
            .required_items
            .iter()
            .all(|i| state.has_item(i))
}

/// Evaluate a choice's requirement. A choice without one is always open.
///
/// A blocked choice carries its authored reason, or a generated summary
/// of the requirement when content gives none.
pub fn evaluate(choice: &Choice, state: &PlayerState) -> Gate {
    match &choice.requirement {
        None => Gate::Open,
        Some(req) if allowed(req, state) => Gate::Open,
        Some(req) => Gate::Blocked {
            reason: choice
                .blocked_reason
                .clone()
                .unwrap_or_else(|| req.describe()),
        },
    }
}
