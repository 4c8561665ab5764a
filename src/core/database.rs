/// The composed, immutable scene graph.

use rustc_hash::FxHashSet;
use std::collections::HashMap;

use crate::schema::scene::Scene;

/// Mapping from scene id to scene plus the designated start scene.
///
/// Only the composer constructs one. Once built it is read-only, so a
/// single database may back any number of independent sessions.
#[derive(Debug, Clone)]
pub struct ContentDatabase {
    scenes: HashMap<String, Scene>,
    start: String,
}

impl ContentDatabase {
    pub(crate) fn new(scenes: HashMap<String, Scene>, start: String) -> Self {
        Self { scenes, start }
    }

    pub fn get(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scenes.contains_key(id)
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene ids in sorted order.
    pub fn scene_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.scenes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    /// Every scene id reachable from the start scene, ignoring gating.
    pub fn reachable(&self) -> FxHashSet<&str> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![self.start.as_str()];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(scene) = self.scenes.get(id) {
                for target in scene.targets() {
                    if !seen.contains(target) {
                        stack.push(target);
                    }
                }
            }
        }
        seen
    }

    /// Sorted ids of scenes that no path from the start scene reaches.
    pub fn unreachable(&self) -> Vec<&str> {
        let reachable = self.reachable();
        let mut orphans: Vec<&str> = self
            .scenes
            .keys()
            .map(String::as_str)
            .filter(|id| !reachable.contains(id))
            .collect();
        orphans.sort_unstable();
        orphans
    }
}
