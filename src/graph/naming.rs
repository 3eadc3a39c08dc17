//! Qualified Names
//!
//! Path names built by walking an element's owner chain up to its root.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{ElementId, ModelGraph, RelationKind};
use crate::error::{ModelError, Result};

/// Default separator and segment wrapper for path names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingOptions {
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Wrapped around every segment, e.g. `"` for quoted SQL identifiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surround: Option<String>,
}

fn default_separator() -> String {
    ".".to_string()
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            surround: None,
        }
    }
}

impl ModelGraph {
    /// Owner chain of `id`, root first, ending with `id` itself.
    ///
    /// Fails with `CyclicGraph` when the chain loops back on itself.
    pub fn owner_chain(&self, id: ElementId) -> Result<Vec<ElementId>> {
        self.element(id)?;

        let mut chain = vec![id];
        let mut seen = HashSet::from([id]);
        let mut current = id;
        while let Some((owner, relation)) = self.owner(current) {
            if !seen.insert(owner) {
                chain.push(owner);
                chain.reverse();
                return Err(ModelError::CyclicGraph {
                    relation,
                    path: chain,
                });
            }
            chain.push(owner);
            current = owner;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Qualified name of `id`: the non-empty simple names of its owner chain,
    /// root first, each wrapped in `surround` and joined by `separator`.
    pub fn qualified_name(
        &self,
        id: ElementId,
        separator: &str,
        surround: Option<&str>,
    ) -> Result<String> {
        let segments: Vec<String> = self
            .owner_chain(id)?
            .into_iter()
            .map(|element| self.name(element))
            .filter(|name| !name.is_empty())
            .map(|name| match surround {
                Some(wrap) => format!("{wrap}{name}{wrap}"),
                None => name.to_string(),
            })
            .collect();

        Ok(segments.join(separator))
    }

    /// Qualified name using the graph's [`NamingOptions`]
    pub fn path_name(&self, id: ElementId) -> Result<String> {
        let naming = &self.options().naming;
        self.qualified_name(id, &naming.separator, naming.surround.as_deref())
    }

    /// Resolve a separator-joined path against the ownership tree.
    ///
    /// The first segment names a root (an element without owner); every
    /// further segment names an element owned by the previous one.
    pub fn resolve_path(&self, path: &str, separator: &str) -> Option<ElementId> {
        let mut segments = path.split(separator).filter(|s| !s.is_empty());
        let first = segments.next()?;

        let mut current = self
            .find_by_name(first)
            .into_iter()
            .find(|&id| self.owner(id).is_none())?;

        for segment in segments {
            current = self
                .owned(current)
                .into_iter()
                .find(|&child| self.name(child) == segment)?;
        }

        Some(current)
    }

    /// Namespace an element sits in directly (ElementOwnership only)
    pub fn namespace_of(&self, id: ElementId) -> Option<ElementId> {
        self.inverse_related(id, RelationKind::ElementOwnership)
            .into_iter()
            .next()
    }
}
