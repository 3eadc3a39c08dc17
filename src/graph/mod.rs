//! Model Graph
//!
//! Primary data structure: a petgraph arena of model elements in which every
//! association link is a single directed edge tagged with its relation. The
//! forward role of a relation is the outgoing view of an element, the inverse
//! role is the incoming view, so the two ends of a link cannot diverge.
//!
//! This module holds the generic relation mutators. Typed entry points live
//! in [`crate::model`]; naming, inheritance closures, analysis, snapshots and
//! loading are in the submodules below.

pub mod element;
pub mod relation;
pub mod naming;
pub mod inheritance;
pub mod analysis;
pub mod diagnostics;
pub mod snapshot;
pub mod loader;

pub use element::{
    Capability, ColumnDetail, Detail, ElementData, ElementId, ElementKind, TableDetail,
    Visibility,
};
pub use relation::{Multiplicity, RelationEnd, RelationKind, RelationSpec, Side};
pub use naming::NamingOptions;
pub use analysis::{CycleAnalysis, CycleGroup, compute_cycle_analysis, validate};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use snapshot::{ModelSnapshot, SnapshotEdge, SnapshotElement};
pub use loader::{LoadedModel, ModelDocument, load_from_directory, load_from_file, load_from_str};

use std::collections::HashSet;

use petgraph::algo::has_path_connecting;
use petgraph::stable_graph::{EdgeIndex, EdgeReference, StableDiGraph};
use petgraph::visit::{EdgeFiltered, EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, Result};

/// Edge weight: which relation a link belongs to and its insertion rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub relation: RelationKind,
    /// Monotonic rank; orders the targets of a source
    pub(crate) seq: u64,
}

/// Behavioural options of a graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphOptions {
    /// Refuse links that would close a cycle over an acyclic relation
    #[serde(default)]
    pub reject_cycles: bool,
    /// Defaults for [`ModelGraph::path_name`]
    #[serde(default)]
    pub naming: NamingOptions,
}

/// Fuzzy search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: ElementId,
    pub name: String,
    pub kind: ElementKind,
    pub score: i64,
}

/// The model element graph
#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    pub(crate) graph: StableDiGraph<ElementData, Link>,
    options: GraphOptions,
    next_seq: u64,
}

impl ModelGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GraphOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut GraphOptions {
        &mut self.options
    }

    // ========== Elements ==========

    /// Insert a new element; it starts with no links
    pub fn add_element(&mut self, data: ElementData) -> ElementId {
        let id = ElementId::from(self.graph.add_node(data));
        debug!(element = %id, "element created");
        id
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.graph.contains_node(id.node())
    }

    pub fn get(&self, id: ElementId) -> Option<&ElementData> {
        self.graph.node_weight(id.node())
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementData> {
        self.graph.node_weight_mut(id.node())
    }

    /// Element data, or `ElementNotFound`
    pub fn element(&self, id: ElementId) -> Result<&ElementData> {
        self.get(id).ok_or(ModelError::ElementNotFound(id))
    }

    pub fn kind(&self, id: ElementId) -> Option<ElementKind> {
        self.get(id).map(|d| d.kind)
    }

    /// Simple name, empty for unknown elements
    pub fn name(&self, id: ElementId) -> &str {
        self.get(id).map(|d| d.name.as_str()).unwrap_or("")
    }

    pub fn element_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of links across all relations
    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All elements in index order
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &ElementData)> + '_ {
        self.graph
            .node_indices()
            .map(move |idx| (ElementId::from(idx), &self.graph[idx]))
    }

    /// All elements of one kind in index order
    pub fn elements_of_kind(&self, kind: ElementKind) -> Vec<ElementId> {
        self.elements()
            .filter(|(_, data)| data.kind == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// Elements whose simple name matches exactly
    pub fn find_by_name(&self, name: &str) -> Vec<ElementId> {
        self.elements()
            .filter(|(_, data)| data.name == name)
            .map(|(id, _)| id)
            .collect()
    }

    /// All links as `(source, relation, target)`, in insertion order
    pub fn links(&self) -> Vec<(ElementId, RelationKind, ElementId)> {
        let mut links: Vec<_> = self
            .graph
            .edge_references()
            .map(|e| (e.weight().seq, e.source(), e.weight().relation, e.target()))
            .collect();
        links.sort_by_key(|l| l.0);
        links
            .into_iter()
            .map(|(_, s, r, t)| (ElementId::from(s), r, ElementId::from(t)))
            .collect()
    }

    // ========== Relation Queries ==========

    /// Targets of `source` under `relation` (the forward role), in order
    pub fn related(&self, source: ElementId, relation: RelationKind) -> Vec<ElementId> {
        self.links_of(source, relation, Direction::Outgoing)
            .into_iter()
            .map(|(_, other)| other)
            .collect()
    }

    /// Sources holding `target` under `relation` (the inverse role), in order
    pub fn inverse_related(&self, target: ElementId, relation: RelationKind) -> Vec<ElementId> {
        self.links_of(target, relation, Direction::Incoming)
            .into_iter()
            .map(|(_, other)| other)
            .collect()
    }

    /// The element on the other end of a single-valued role
    pub fn related_one(&self, id: ElementId, relation: RelationKind, side: Side) -> Option<ElementId> {
        match side {
            Side::Source => self.related(id, relation).into_iter().next(),
            Side::Target => self.inverse_related(id, relation).into_iter().next(),
        }
    }

    pub fn is_related(&self, source: ElementId, relation: RelationKind, target: ElementId) -> bool {
        self.find_link(source, relation, target).is_some()
    }

    /// The owner of an element across all ownership relations
    pub fn owner(&self, id: ElementId) -> Option<(ElementId, RelationKind)> {
        RelationKind::OWNERSHIP.iter().find_map(|&relation| {
            self.inverse_related(id, relation)
                .into_iter()
                .next()
                .map(|owner| (owner, relation))
        })
    }

    /// Elements owned by `id` across all ownership relations
    pub fn owned(&self, id: ElementId) -> Vec<ElementId> {
        RelationKind::OWNERSHIP
            .iter()
            .flat_map(|&relation| self.related(id, relation))
            .collect()
    }

    // ========== Relation Mutators ==========

    /// Link `source` to `target` under `relation`.
    ///
    /// Returns `Ok(false)` when the link already exists. A missing target is
    /// an `InvalidArgument` error and nothing is mutated. Single-valued ends
    /// are replaced, and an element gaining an owner loses its previous one.
    pub fn add_related(
        &mut self,
        source: ElementId,
        relation: RelationKind,
        target: impl Into<Option<ElementId>>,
    ) -> Result<bool> {
        let Some(target) = target.into() else {
            return Err(ModelError::invalid(format!(
                "{} of {} must not be null",
                relation.spec().source.role,
                relation
            )));
        };

        self.check_role(source, relation, Side::Source)?;
        self.check_role(target, relation, Side::Target)?;

        if self.find_link(source, relation, target).is_some() {
            return Ok(false);
        }

        if self.options.reject_cycles && relation.is_acyclic() {
            self.ensure_acyclic(source, relation, target)?;
        }

        let spec = relation.spec();
        if spec.source.multiplicity.is_single() {
            for previous in self.related(source, relation) {
                self.unlink(source, relation, previous);
            }
        }
        if spec.ownership {
            self.detach_owner(target);
        } else if spec.target.multiplicity.is_single() {
            for previous in self.inverse_related(target, relation) {
                self.unlink(previous, relation, target);
            }
        }

        let seq = self.bump_seq();
        self.graph
            .add_edge(source.node(), target.node(), Link { relation, seq });
        debug!(%source, %relation, %target, "link added");

        Ok(true)
    }

    /// Remove the link `source -> target` under `relation`.
    ///
    /// A missing target is tolerated and reports `true`; an absent link
    /// reports `false`.
    pub fn remove_related(
        &mut self,
        source: ElementId,
        relation: RelationKind,
        target: impl Into<Option<ElementId>>,
    ) -> Result<bool> {
        let Some(target) = target.into() else {
            return Ok(true);
        };
        if !self.contains(source) {
            return Err(ModelError::ElementNotFound(source));
        }

        Ok(self.unlink(source, relation, target))
    }

    /// Place `target` at `index` among the targets of an ordered relation,
    /// linking it first if needed. Indices past the end append.
    pub fn insert_related_at(
        &mut self,
        source: ElementId,
        relation: RelationKind,
        target: ElementId,
        index: usize,
    ) -> Result<bool> {
        if !relation.is_ordered() {
            return Err(ModelError::invalid(format!("{} is not an ordered relation", relation)));
        }

        let added = self.add_related(source, relation, target)?;

        let mut order = self.links_of(source, relation, Direction::Outgoing);
        let Some(current) = order.iter().position(|(_, other)| *other == target) else {
            return Ok(added);
        };
        let index = index.min(order.len() - 1);
        if current == index {
            return Ok(added);
        }

        let moved = order.remove(current);
        order.insert(index, moved);
        for (edge, _) in order {
            let seq = self.bump_seq();
            if let Some(link) = self.graph.edge_weight_mut(edge) {
                link.seq = seq;
            }
        }
        debug!(%source, %relation, %target, index, "link reordered");

        Ok(true)
    }

    /// Assign the owner of `owned` under an ownership relation.
    ///
    /// Detaches the previous owner first (whichever ownership relation it was
    /// reached through) and returns it. Reassigning the current owner is a
    /// no-op; `None` just detaches.
    pub fn set_owner(
        &mut self,
        owned: ElementId,
        relation: RelationKind,
        new_owner: Option<ElementId>,
    ) -> Result<Option<ElementId>> {
        if !relation.is_ownership() {
            return Err(ModelError::invalid(format!("{} is not an ownership relation", relation)));
        }
        self.check_role(owned, relation, Side::Target)?;

        let previous = self.owner(owned);
        if let (Some((current, current_relation)), Some(new_owner)) = (previous, new_owner) {
            if current == new_owner && current_relation == relation {
                return Ok(Some(current));
            }
        }

        match new_owner {
            Some(new_owner) => {
                self.add_related(new_owner, relation, owned)?;
            }
            None => {
                self.detach_owner(owned);
            }
        }

        Ok(previous.map(|(owner, _)| owner))
    }

    /// Assign the target of a single-valued source role (a column's type, a
    /// foreign key's referenced key). Returns the previous target.
    pub fn set_target(
        &mut self,
        source: ElementId,
        relation: RelationKind,
        target: Option<ElementId>,
    ) -> Result<Option<ElementId>> {
        if !relation.spec().source.multiplicity.is_single() {
            return Err(ModelError::invalid(format!(
                "{} of {} is not single-valued",
                relation.spec().source.role,
                relation
            )));
        }
        self.check_role(source, relation, Side::Source)?;

        let previous = self.related(source, relation).into_iter().next();
        if previous.is_some() && previous == target {
            return Ok(previous);
        }

        match target {
            Some(target) => {
                self.add_related(source, relation, target)?;
            }
            None => {
                if let Some(previous) = previous {
                    self.unlink(source, relation, previous);
                }
            }
        }

        Ok(previous)
    }

    /// Delete an element, every link touching it, and everything it owns.
    ///
    /// Returns the deleted elements, the requested one first.
    pub fn delete_element(&mut self, id: ElementId) -> Result<Vec<ElementId>> {
        if !self.contains(id) {
            return Err(ModelError::ElementNotFound(id));
        }

        let mut doomed = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !visited.insert(next) {
                continue;
            }
            doomed.push(next);
            stack.extend(self.owned(next));
        }

        for element in &doomed {
            self.graph.remove_node(element.node());
        }
        debug!(element = %id, removed = doomed.len(), "element deleted");

        Ok(doomed)
    }

    // ========== Search / Export ==========

    /// Search elements by name (fuzzy)
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        let matcher = SkimMatcherV2::default();
        let mut results: Vec<(i64, ElementId, &ElementData)> = self
            .elements()
            .filter_map(|(id, data)| {
                matcher
                    .fuzzy_match(&data.name, query)
                    .map(|score| (score, id, data))
            })
            .collect();

        // Sort by score descending, ties by index
        results.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        results
            .into_iter()
            .take(limit)
            .map(|(score, id, data)| SearchResult {
                id,
                name: data.name.clone(),
                kind: data.kind,
                score,
            })
            .collect()
    }

    /// Export the element graph to GraphViz DOT format
    pub fn to_dot(&self) -> String {
        let mut output = String::new();

        output.push_str("digraph ModelGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10];\n");
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=8, fontcolor=\"#606060\"];\n");
        output.push('\n');

        let color_map = [
            (ElementKind::Catalog, "#795548"),
            (ElementKind::Schema, "#607D8B"),
            (ElementKind::Package, "#607D8B"),
            (ElementKind::Table, "#00BCD4"),
            (ElementKind::View, "#4CAF50"),
            (ElementKind::Class, "#00BCD4"),
            (ElementKind::Column, "#FF9800"),
            (ElementKind::Attribute, "#FF9800"),
            (ElementKind::PrimaryKey, "#F44336"),
            (ElementKind::UniqueConstraint, "#F44336"),
            (ElementKind::ForeignKey, "#9C27B0"),
            (ElementKind::SqlDataType, "#2196F3"),
        ];

        for (id, data) in self.elements() {
            let color = color_map
                .iter()
                .find(|(kind, _)| *kind == data.kind)
                .map(|(_, color)| *color)
                .unwrap_or("#9E9E9E");
            let label = if data.name.is_empty() {
                format!("<{}>", data.kind)
            } else {
                data.name.replace('"', "\\\"")
            };
            output.push_str(&format!(
                "  \"e{}\" [label=\"{}\\n{}\", fillcolor=\"{}\"];\n",
                id.index(),
                label,
                data.kind,
                color
            ));
        }

        output.push('\n');

        for (source, relation, target) in self.links() {
            let style = if relation.is_ownership() { ", style=bold" } else { "" };
            output.push_str(&format!(
                "  \"e{}\" -> \"e{}\" [label=\"{}\"{}];\n",
                source.index(),
                target.index(),
                relation.spec().source.role,
                style
            ));
        }

        output.push_str("}\n");
        output
    }

    // ========== Internals ==========

    /// Links of `id` under `relation` in one direction, ordered by rank
    fn links_of(
        &self,
        id: ElementId,
        relation: RelationKind,
        direction: Direction,
    ) -> Vec<(EdgeIndex, ElementId)> {
        if !self.contains(id) {
            return Vec::new();
        }
        let node = id.node();

        let mut links: Vec<(u64, EdgeIndex, ElementId)> = self
            .graph
            .edges_directed(node, direction)
            .filter(|e| e.weight().relation == relation)
            .map(|e| {
                let other = if e.source() == node { e.target() } else { e.source() };
                (e.weight().seq, e.id(), ElementId::from(other))
            })
            .collect();
        links.sort_by_key(|l| l.0);

        links.into_iter().map(|(_, edge, other)| (edge, other)).collect()
    }

    fn find_link(&self, source: ElementId, relation: RelationKind, target: ElementId) -> Option<EdgeIndex> {
        if !self.contains(source) || !self.contains(target) {
            return None;
        }
        self.graph
            .edges_directed(source.node(), Direction::Outgoing)
            .find(|e| e.target() == target.node() && e.weight().relation == relation)
            .map(|e| e.id())
    }

    /// Remove one link; reports whether it existed
    fn unlink(&mut self, source: ElementId, relation: RelationKind, target: ElementId) -> bool {
        match self.find_link(source, relation, target) {
            Some(edge) => {
                self.graph.remove_edge(edge);
                debug!(%source, %relation, %target, "link removed");
                true
            }
            None => false,
        }
    }

    /// Remove the ownership link of `owned`, whichever relation it uses
    fn detach_owner(&mut self, owned: ElementId) -> Option<(ElementId, RelationKind)> {
        let (owner, relation) = self.owner(owned)?;
        self.unlink(owner, relation, owned);
        Some((owner, relation))
    }

    fn check_role(&self, id: ElementId, relation: RelationKind, side: Side) -> Result<()> {
        let data = self.element(id)?;
        let end = relation.spec().end(side);
        if data.kind.has(end.capability) {
            Ok(())
        } else {
            Err(ModelError::RoleMismatch {
                relation,
                role: end.role,
                kind: data.kind,
            })
        }
    }

    /// Fail if `source -> target` would close a cycle. Ownership relations
    /// are checked together, since an owner chain may mix them.
    fn ensure_acyclic(&self, source: ElementId, relation: RelationKind, target: ElementId) -> Result<()> {
        let single = [relation];
        let group: &[RelationKind] = if relation.is_ownership() {
            &RelationKind::OWNERSHIP
        } else {
            &single
        };

        let filtered = EdgeFiltered::from_fn(&self.graph, |edge: EdgeReference<'_, Link>| {
            group.contains(&edge.weight().relation)
        });
        if has_path_connecting(&filtered, target.node(), source.node(), None) {
            return Err(ModelError::CyclicGraph {
                relation,
                path: vec![source, target, source],
            });
        }
        Ok(())
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}
