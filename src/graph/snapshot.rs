//! Model Snapshots
//!
//! Serializable form of a whole model: elements plus links in insertion
//! order. Restoring replays every link through the regular mutators, so a
//! snapshot edited by hand is checked like any other input.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::{ElementData, ElementId, GraphOptions, ModelGraph, RelationKind};
use crate::error::{ModelError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotElement {
    pub id: ElementId,
    #[serde(flatten)]
    pub data: ElementData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub source: ElementId,
    pub relation: RelationKind,
    pub target: ElementId,
}

/// A complete model, ready for JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub elements: Vec<SnapshotElement>,
    pub edges: Vec<SnapshotEdge>,
}

impl ModelSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

impl ModelGraph {
    /// Capture every element and link
    pub fn snapshot(&self) -> ModelSnapshot {
        let elements = self
            .elements()
            .map(|(id, data)| SnapshotElement {
                id,
                data: data.clone(),
            })
            .collect();
        let edges = self
            .links()
            .into_iter()
            .map(|(source, relation, target)| SnapshotEdge {
                source,
                relation,
                target,
            })
            .collect();

        ModelSnapshot { elements, edges }
    }

    /// Rebuild a graph from a snapshot.
    ///
    /// Element ids are reassigned; link order per source is preserved. An
    /// edge naming an id the snapshot does not contain is an
    /// `UnresolvedReference`.
    pub fn from_snapshot(snapshot: &ModelSnapshot, options: GraphOptions) -> Result<Self> {
        let mut graph = ModelGraph::with_options(options);
        let mut ids: HashMap<ElementId, ElementId> = HashMap::with_capacity(snapshot.elements.len());

        for element in &snapshot.elements {
            let id = graph.add_element(element.data.clone());
            if ids.insert(element.id, id).is_some() {
                return Err(ModelError::invalid(format!(
                    "duplicate element id {} in snapshot",
                    element.id
                )));
            }
        }

        let lookup = |id: ElementId| {
            ids.get(&id)
                .copied()
                .ok_or_else(|| ModelError::UnresolvedReference(id.to_string()))
        };
        for edge in &snapshot.edges {
            let source = lookup(edge.source)?;
            let target = lookup(edge.target)?;
            graph.add_related(source, edge.relation, target)?;
        }

        Ok(graph)
    }
}
