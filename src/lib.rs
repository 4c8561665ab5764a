//! Story Engine: a deterministic state machine for branching narratives.
//!
//! Content is authored as independent shards of scenes. A composer merges
//! them into one immutable database, a requirement gate decides which
//! choices are open, a pure reducer applies each choice's effects, and a
//! controller drives one player's state from scene to scene.

pub mod core;
pub mod schema;
