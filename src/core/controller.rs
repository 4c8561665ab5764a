/// The narrative controller: one player's state machine over a scene graph.
///
/// The only state shape is "at scene X". A step looks the scene up,
/// filters its choices through the gate, validates the selection, applies
/// the choice's effects, records history, advances the clock and moves to
/// the choice's target. The next state is built off to the side and only
/// swapped in once every part of the step has succeeded.

use std::collections::VecDeque;
use thiserror::Error;

use crate::core::database::ContentDatabase;
use crate::core::gate::{self, Gate};
use crate::core::persistence::{PersistenceError, SaveStore};
use crate::core::reducer;
use crate::schema::persona::Persona;
use crate::schema::scene::{Choice, Scene};
use crate::schema::state::{GameClock, HistoryEntry, PlayerState};

/// Maximum number of lines kept in the event feed.
pub const EVENT_FEED_CAPACITY: usize = 20;

/// Why a selection was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The scene declares no choice with that id (or the index is out of range).
    Unknown,
    /// The choice exists but its requirement is not met.
    Gated(String),
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error("scene not found: {0}")]
    SceneNotFound(String),
    #[error("invalid choice '{choice}' in scene '{scene}': {reason:?}")]
    InvalidChoice {
        scene: String,
        choice: String,
        reason: RejectReason,
    },
    #[error("replay diverged at step {step}: expected scene '{expected}', found '{found}'")]
    ReplayDiverged {
        step: usize,
        expected: String,
        found: String,
    },
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Whether the current scene can be left, and if not, why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneStatus {
    /// At least one declared choice is open.
    Open { available: usize },
    /// The scene declares no choices: a legitimate ending.
    Ending,
    /// The scene declares choices but every one is gated out.
    Blocked,
}

impl SceneStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SceneStatus::Open { .. })
    }
}

/// One declared choice as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceView<'a> {
    pub id: &'a str,
    pub text: &'a str,
    pub tags: &'a [String],
    pub gate: Gate,
}

/// Read-only snapshot of the current scene for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneView<'a> {
    pub id: &'a str,
    pub text: &'a str,
    pub ending: Option<&'a str>,
    pub choices: Vec<ChoiceView<'a>>,
    pub status: SceneStatus,
}

impl<'a> SceneView<'a> {
    /// The resolved choice list: open choices only, in declaration order.
    pub fn available(&self) -> impl Iterator<Item = &ChoiceView<'a>> {
        self.choices.iter().filter(|c| c.gate.is_open())
    }
}

/// Outcome of a committed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: String,
    pub choice: String,
    pub to: String,
    pub event: Option<String>,
}

/// A line in the transient event feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub text: String,
    pub at: GameClock,
}

/// A recorded decision, as stored in history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub scene: String,
    pub choice: String,
}

impl From<&HistoryEntry> for Decision {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            scene: entry.scene.clone(),
            choice: entry.choice.clone(),
        }
    }
}

/// Drives one player's state over a shared, read-only database.
pub struct NarrativeController<'a> {
    db: &'a ContentDatabase,
    state: PlayerState,
    feed: VecDeque<FeedEntry>,
}

impl<'a> NarrativeController<'a> {
    /// Take ownership of `state`. Fails if its current scene is not in the database.
    pub fn new(db: &'a ContentDatabase, state: PlayerState) -> Result<Self, StepError> {
        if !db.contains(&state.scene) {
            return Err(StepError::SceneNotFound(state.scene));
        }
        Ok(Self {
            db,
            state,
            feed: VecDeque::new(),
        })
    }

    /// Start a new game at the database's start scene with default state.
    pub fn new_game(db: &'a ContentDatabase) -> Result<Self, StepError> {
        Self::new(db, PlayerState::new(db.start()))
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn into_state(self) -> PlayerState {
        self.state
    }

    pub fn persona(&self) -> Persona {
        self.state.persona()
    }

    /// Event feed, newest first.
    pub fn events(&self) -> impl Iterator<Item = &FeedEntry> {
        self.feed.iter()
    }

    pub fn scene(&self) -> Result<&'a Scene, StepError> {
        self.db
            .get(&self.state.scene)
            .ok_or_else(|| StepError::SceneNotFound(self.state.scene.clone()))
    }

    /// Open choices of the current scene, in declaration order.
    pub fn resolved_choices(&self) -> Result<Vec<&'a Choice>, StepError> {
        let scene = self.scene()?;
        Ok(scene
            .choices
            .iter()
            .filter(|c| gate::evaluate(c, &self.state).is_open())
            .collect())
    }

    pub fn status(&self) -> Result<SceneStatus, StepError> {
        let scene = self.scene()?;
        Ok(classify(scene, self.resolved_choices()?.len()))
    }

    /// Snapshot the current scene with every declared choice and its gate.
    pub fn view(&self) -> Result<SceneView<'a>, StepError> {
        let scene = self.scene()?;
        let choices: Vec<ChoiceView<'a>> = scene
            .choices
            .iter()
            .map(|c| ChoiceView {
                id: &c.id,
                text: &c.text,
                tags: &c.tags,
                gate: gate::evaluate(c, &self.state),
            })
            .collect();
        let available = choices.iter().filter(|c| c.gate.is_open()).count();
        Ok(SceneView {
            id: &scene.id,
            text: &scene.text,
            ending: scene.ending.as_deref(),
            status: classify(scene, available),
            choices,
        })
    }

    /// Take the choice with `choice_id`, if it is open.
    pub fn select(&mut self, choice_id: &str) -> Result<Transition, StepError> {
        let scene = self.scene()?;
        let choice = scene
            .choice(choice_id)
            .ok_or_else(|| StepError::InvalidChoice {
                scene: scene.id.clone(),
                choice: choice_id.to_string(),
                reason: RejectReason::Unknown,
            })?;
        if let Gate::Blocked { reason } = gate::evaluate(choice, &self.state) {
            return Err(StepError::InvalidChoice {
                scene: scene.id.clone(),
                choice: choice_id.to_string(),
                reason: RejectReason::Gated(reason),
            });
        }
        Ok(self.commit(scene, choice))
    }

    /// Take the `index`-th open choice (zero-based).
    pub fn select_index(&mut self, index: usize) -> Result<Transition, StepError> {
        let scene = self.scene()?;
        let resolved = self.resolved_choices()?;
        let choice = resolved
            .get(index)
            .copied()
            .ok_or_else(|| StepError::InvalidChoice {
                scene: scene.id.clone(),
                choice: format!("#{}", index),
                reason: RejectReason::Unknown,
            })?;
        Ok(self.commit(scene, choice))
    }

    fn commit(&mut self, scene: &'a Scene, choice: &'a Choice) -> Transition {
        let mut next = reducer::apply(&self.state, &choice.effects);

        next.history.push(HistoryEntry {
            scene: scene.id.clone(),
            choice: choice.id.clone(),
            at: next.clock,
        });
        let hours = scene
            .time_delta
            .saturating_add(choice.time_delta.unwrap_or(0));
        next.clock = next.clock.advanced(hours);
        next.scene = choice.go_to.clone();

        tracing::debug!(
            from = %scene.id,
            choice = %choice.id,
            to = %choice.go_to,
            hours,
            "transition"
        );

        self.state = next;
        if let Some(text) = &choice.effects.push_event {
            self.feed.push_front(FeedEntry {
                text: text.clone(),
                at: self.state.clock,
            });
            self.feed.truncate(EVENT_FEED_CAPACITY);
        }

        Transition {
            from: scene.id.clone(),
            choice: choice.id.clone(),
            to: choice.go_to.clone(),
            event: choice.effects.push_event.clone(),
        }
    }

    /// Persist a snapshot of the current state. In-memory state is unaffected on failure.
    pub fn save(&self, store: &mut dyn SaveStore, slot: &str) -> Result<(), StepError> {
        store.write(slot, &self.state)?;
        Ok(())
    }

    /// Resume a saved game. The loaded state's scene must exist.
    pub fn load(
        db: &'a ContentDatabase,
        store: &dyn SaveStore,
        slot: &str,
    ) -> Result<Self, StepError> {
        let state = store.read(slot)?;
        Self::new(db, state)
    }

    /// Re-run a decision trace from `initial`, checking each recorded scene.
    pub fn replay(
        db: &'a ContentDatabase,
        initial: PlayerState,
        decisions: &[Decision],
    ) -> Result<Self, StepError> {
        let mut controller = Self::new(db, initial)?;
        for (step, decision) in decisions.iter().enumerate() {
            if controller.state.scene != decision.scene {
                return Err(StepError::ReplayDiverged {
                    step,
                    expected: decision.scene.clone(),
                    found: controller.state.scene.clone(),
                });
            }
            controller.select(&decision.choice)?;
        }
        Ok(controller)
    }
}

fn classify(scene: &Scene, available: usize) -> SceneStatus {
    if scene.choices.is_empty() {
        SceneStatus::Ending
    } else if available == 0 {
        SceneStatus::Blocked
    } else {
        SceneStatus::Open { available }
    }
}
