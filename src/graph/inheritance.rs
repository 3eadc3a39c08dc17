//! Inheritance Closures
//!
//! Transitive queries over the Generalization relation: ancestors,
//! descendants, inherited features and inherited contents. Traversals are
//! depth-first with two marks per element: on the current path (re-entering
//! one fails with `CyclicGraph`) and finished (never descended into again).
//! A diamond lattice therefore costs one visit per element, not one per
//! route.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;

use super::{ElementId, ModelGraph, RelationKind};
use crate::error::{ModelError, Result};

/// Depth-first marks shared by one traversal
#[derive(Default)]
struct Walk {
    path: Vec<ElementId>,
    on_path: HashSet<ElementId>,
    finished: HashSet<ElementId>,
}

impl Walk {
    /// Push `id` on the path. `Ok(false)` when it is already finished.
    fn enter(&mut self, id: ElementId) -> Result<bool> {
        if self.on_path.contains(&id) {
            return Err(cycle(&self.path, id));
        }
        if self.finished.contains(&id) {
            return Ok(false);
        }
        self.path.push(id);
        self.on_path.insert(id);
        Ok(true)
    }

    fn leave(&mut self, id: ElementId) {
        self.path.pop();
        self.on_path.remove(&id);
        self.finished.insert(id);
    }
}

impl ModelGraph {
    /// Direct parents
    pub fn parents(&self, id: ElementId) -> Vec<ElementId> {
        self.related(id, RelationKind::Generalization)
    }

    /// Direct specializations
    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.inverse_related(id, RelationKind::Generalization)
    }

    /// All ancestors, nearest first, each once
    pub fn all_parents(&self, id: ElementId) -> Result<Vec<ElementId>> {
        self.generalization_closure(id, Direction::Outgoing)
    }

    /// All descendants, nearest first, each once
    pub fn all_children(&self, id: ElementId) -> Result<Vec<ElementId>> {
        self.generalization_closure(id, Direction::Incoming)
    }

    /// Own features followed by those of every ancestor, each once
    pub fn all_features(&self, id: ElementId) -> Result<Vec<ElementId>> {
        self.element(id)?;

        let mut features = Vec::new();
        let mut seen = HashSet::new();
        self.collect_features(id, &mut Walk::default(), &mut seen, &mut features)?;
        Ok(features)
    }

    /// Own owned elements plus the public or protected contents of every
    /// parent. The visibility filter applies at each level, so a private
    /// element never crosses a generalization link.
    pub fn all_contents(&self, id: ElementId) -> Result<Vec<ElementId>> {
        self.element(id)?;

        let mut memo = HashMap::new();
        self.collect_contents(id, &mut Walk::default(), &mut memo)
    }

    fn generalization_closure(&self, id: ElementId, direction: Direction) -> Result<Vec<ElementId>> {
        self.element(id)?;

        let mut result = Vec::new();
        let mut seen = HashSet::new();
        let mut walk = Walk::default();
        walk.enter(id)?;
        self.walk_generalization(id, direction, &mut walk, &mut seen, &mut result)?;
        Ok(result)
    }

    fn walk_generalization(
        &self,
        id: ElementId,
        direction: Direction,
        walk: &mut Walk,
        seen: &mut HashSet<ElementId>,
        result: &mut Vec<ElementId>,
    ) -> Result<()> {
        let next = match direction {
            Direction::Outgoing => self.parents(id),
            Direction::Incoming => self.children(id),
        };

        for other in &next {
            if walk.on_path.contains(other) {
                return Err(cycle(&walk.path, *other));
            }
            if seen.insert(*other) {
                result.push(*other);
            }
        }

        for other in next {
            if walk.enter(other)? {
                self.walk_generalization(other, direction, walk, seen, result)?;
                walk.leave(other);
            }
        }

        Ok(())
    }

    fn collect_features(
        &self,
        id: ElementId,
        walk: &mut Walk,
        seen: &mut HashSet<ElementId>,
        features: &mut Vec<ElementId>,
    ) -> Result<()> {
        if !walk.enter(id)? {
            return Ok(());
        }

        for feature in self.related(id, RelationKind::ClassifierFeature) {
            if seen.insert(feature) {
                features.push(feature);
            }
        }
        for parent in self.parents(id) {
            self.collect_features(parent, walk, seen, features)?;
        }

        walk.leave(id);
        Ok(())
    }

    /// Contents of `id` as seen from inside it; memoized per element since
    /// the result does not depend on the route taken to reach it
    fn collect_contents(
        &self,
        id: ElementId,
        walk: &mut Walk,
        memo: &mut HashMap<ElementId, Vec<ElementId>>,
    ) -> Result<Vec<ElementId>> {
        if !walk.enter(id)? {
            return Ok(memo.get(&id).cloned().unwrap_or_default());
        }

        let mut contents = self.related(id, RelationKind::ElementOwnership);
        let mut seen: HashSet<ElementId> = contents.iter().copied().collect();

        for parent in self.parents(id) {
            for inherited in self.collect_contents(parent, walk, memo)? {
                let visible = self
                    .get(inherited)
                    .map(|data| data.visibility.is_inherited())
                    .unwrap_or(false);
                if visible && seen.insert(inherited) {
                    contents.push(inherited);
                }
            }
        }

        memo.insert(id, contents.clone());
        walk.leave(id);
        Ok(contents)
    }
}

/// Cycle error for a path that re-enters `again`
fn cycle(path: &[ElementId], again: ElementId) -> ModelError {
    let start = path.iter().position(|&id| id == again).unwrap_or(0);
    let mut looped = path[start..].to_vec();
    looped.push(again);
    ModelError::CyclicGraph {
        relation: RelationKind::Generalization,
        path: looped,
    }
}
