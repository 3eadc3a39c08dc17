//! Model Graph Analysis
//!
//! Strongly connected components over the acyclic relations, and the
//! validation pass that turns structural problems into diagnostics.

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
use super::{Capability, ElementId, ModelGraph, RelationKind};

// =============================================================================
// Cycle Groups
// =============================================================================

/// A strongly connected component (cycle group) over some relations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleGroup {
    pub id: usize,
    /// Members in index order
    pub members: Vec<ElementId>,
    /// Single element linked to itself
    pub is_self_referential: bool,
}

/// Complete cycle analysis for a set of relations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleAnalysis {
    /// Relations whose links were considered together
    pub relations: Vec<RelationKind>,
    /// Only real cycles: more than one member, or a self link
    pub groups: Vec<CycleGroup>,
    membership: HashMap<ElementId, usize>,
}

impl CycleAnalysis {
    pub fn is_acyclic(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn is_cyclic(&self, id: ElementId) -> bool {
        self.membership.contains_key(&id)
    }

    /// The cycle group an element belongs to
    pub fn group_of(&self, id: ElementId) -> Option<&CycleGroup> {
        let group = *self.membership.get(&id)?;
        self.groups.get(group)
    }
}

// =============================================================================
// Analysis Functions
// =============================================================================

/// Compute cycle groups over the union of `relations`
pub fn compute_cycle_analysis(graph: &ModelGraph, relations: &[RelationKind]) -> CycleAnalysis {
    // Project the selected links onto a plain digraph of element ids
    let mut projected: DiGraph<ElementId, ()> = DiGraph::new();
    let mut nodes: HashMap<ElementId, NodeIndex> = HashMap::new();
    for (id, _) in graph.elements() {
        nodes.insert(id, projected.add_node(id));
    }
    for edge in graph.graph.edge_references() {
        if !relations.contains(&edge.weight().relation) {
            continue;
        }
        let source = nodes[&ElementId::from(edge.source())];
        let target = nodes[&ElementId::from(edge.target())];
        projected.add_edge(source, target, ());
    }

    let mut groups = Vec::new();
    let mut membership = HashMap::new();

    for scc in kosaraju_scc(&projected) {
        let is_self_referential = scc.len() == 1 && projected.contains_edge(scc[0], scc[0]);
        if scc.len() == 1 && !is_self_referential {
            continue;
        }

        let id = groups.len();
        let mut members: Vec<ElementId> = scc.iter().map(|idx| projected[*idx]).collect();
        members.sort();
        for member in &members {
            membership.insert(*member, id);
        }
        groups.push(CycleGroup {
            id,
            members,
            is_self_referential,
        });
    }

    CycleAnalysis {
        relations: relations.to_vec(),
        groups,
        membership,
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Check a model for problems the mutators tolerate.
///
/// Reports empty required roles, cycles over ownership (both ownership
/// relations together) and generalization, self imports, unnamed
/// classifiers and structural features, sibling name clashes, and
/// features without an owner.
pub fn validate(graph: &ModelGraph) -> Diagnostics {
    let mut diags = Diagnostics::new();

    check_required_links(graph, &mut diags);
    check_cycles(graph, &RelationKind::OWNERSHIP, &mut diags);
    check_cycles(graph, &[RelationKind::Generalization], &mut diags);
    check_self_imports(graph, &mut diags);
    check_names(graph, &mut diags);

    debug!(
        errors = diags.error_count(),
        warnings = diags.warning_count(),
        "validation complete"
    );
    diags
}

fn display_path(graph: &ModelGraph, id: ElementId) -> String {
    graph.path_name(id).unwrap_or_else(|_| id.to_string())
}

fn check_required_links(graph: &ModelGraph, diags: &mut Diagnostics) {
    for (id, data) in graph.elements() {
        for relation in RelationKind::ALL {
            let end = &relation.spec().source;
            if !end.multiplicity.is_required() || !data.kind.has(end.capability) {
                continue;
            }
            if graph.related(id, relation).is_empty() {
                diags.missing_link(id, relation, &display_path(graph, id));
            }
        }
    }
}

fn check_cycles(graph: &ModelGraph, relations: &[RelationKind], diags: &mut Diagnostics) {
    let analysis = compute_cycle_analysis(graph, relations);
    let Some(&relation) = relations.first() else {
        return;
    };

    for group in &analysis.groups {
        if group.is_self_referential {
            let id = group.members[0];
            diags.report(
                id,
                DiagnosticCode::SelfRelation,
                format!("'{}' is linked to itself over {}", graph.name(id), relation),
            );
            continue;
        }
        let names: Vec<String> = group
            .members
            .iter()
            .map(|&id| graph.name(id).to_string())
            .collect();
        diags.cycle(relation, &group.members, &names);
    }
}

fn check_self_imports(graph: &ModelGraph, diags: &mut Diagnostics) {
    for (source, relation, target) in graph.links() {
        if relation == RelationKind::ImportedElement && source == target {
            diags.report(
                source,
                DiagnosticCode::SelfRelation,
                format!("Package '{}' imports itself", graph.name(source)),
            );
        }
    }
}

fn check_names(graph: &ModelGraph, diags: &mut Diagnostics) {
    for (id, data) in graph.elements() {
        let named_kind =
            data.kind.has(Capability::Classifier) || data.kind.has(Capability::StructuralFeature);
        if named_kind && data.name.is_empty() {
            diags.report(
                id,
                DiagnosticCode::UnnamedElement,
                format!("Unnamed {}", data.kind),
            );
        }

        if data.kind.has(Capability::Feature) && graph.owner(id).is_none() {
            diags.report(
                id,
                DiagnosticCode::OrphanFeature,
                format!("{} '{}' has no owning classifier", data.kind, data.name),
            );
        }

        let mut siblings: BTreeMap<&str, Vec<ElementId>> = BTreeMap::new();
        for child in graph.owned(id) {
            let name = graph.name(child);
            if !name.is_empty() {
                siblings.entry(name).or_default().push(child);
            }
        }
        for (name, clash) in siblings {
            if clash.len() > 1 {
                diags.push(
                    DiagnosticItem::new(
                        clash[1],
                        DiagnosticCode::DuplicateName,
                        format!("'{}' declares '{}' {} times", data.name, name, clash.len()),
                    )
                    .with_context(format!("Namespace: {}", display_path(graph, id))),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ElementData, ElementKind};

    fn named(graph: &mut ModelGraph, kind: ElementKind, name: &str) -> ElementId {
        graph.add_element(ElementData::new(kind, name))
    }

    #[test]
    fn test_acyclic_graph_has_no_groups() {
        let mut graph = ModelGraph::new();
        let a = named(&mut graph, ElementKind::Class, "A");
        let b = named(&mut graph, ElementKind::Class, "B");
        graph.add_related(a, RelationKind::Generalization, b).unwrap();

        let analysis = compute_cycle_analysis(&graph, &[RelationKind::Generalization]);
        assert!(analysis.is_acyclic());
        assert!(!analysis.is_cyclic(a));
    }

    #[test]
    fn test_mutual_generalization_forms_one_group() {
        let mut graph = ModelGraph::new();
        let a = named(&mut graph, ElementKind::Class, "A");
        let b = named(&mut graph, ElementKind::Class, "B");
        let c = named(&mut graph, ElementKind::Class, "C");
        graph.add_related(a, RelationKind::Generalization, b).unwrap();
        graph.add_related(b, RelationKind::Generalization, a).unwrap();
        graph.add_related(c, RelationKind::Generalization, a).unwrap();

        let analysis = compute_cycle_analysis(&graph, &[RelationKind::Generalization]);
        assert_eq!(analysis.groups.len(), 1);
        assert_eq!(analysis.group_of(a).unwrap().members, vec![a, b]);
        assert!(!analysis.is_cyclic(c));
    }

    #[test]
    fn test_self_generalization_is_self_referential() {
        let mut graph = ModelGraph::new();
        let a = named(&mut graph, ElementKind::Class, "A");
        graph.add_related(a, RelationKind::Generalization, a).unwrap();

        let analysis = compute_cycle_analysis(&graph, &[RelationKind::Generalization]);
        assert!(analysis.group_of(a).unwrap().is_self_referential);

        let diags = validate(&graph);
        assert_eq!(diags.with_code(DiagnosticCode::SelfRelation).count(), 1);
    }

    #[test]
    fn test_validate_reports_missing_column_type() {
        let mut graph = ModelGraph::new();
        let table = named(&mut graph, ElementKind::Table, "t");
        let column = named(&mut graph, ElementKind::Column, "c");
        graph.add_related(table, RelationKind::ClassifierFeature, column).unwrap();

        let diags = validate(&graph);
        let missing: Vec<_> = diags.with_code(DiagnosticCode::MissingRequiredLink).collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].element, column);

        let int = named(&mut graph, ElementKind::SqlDataType, "INTEGER");
        graph.add_related(column, RelationKind::StructuralFeatureType, int).unwrap();
        assert!(!validate(&graph).has_errors());
    }

    #[test]
    fn test_validate_reports_ownership_cycle() {
        let mut graph = ModelGraph::new();
        let a = named(&mut graph, ElementKind::Package, "a");
        let b = named(&mut graph, ElementKind::Package, "b");
        graph.add_related(a, RelationKind::ElementOwnership, b).unwrap();
        graph.add_related(b, RelationKind::ElementOwnership, a).unwrap();

        let diags = validate(&graph);
        assert_eq!(diags.with_code(DiagnosticCode::CycleDetected).count(), 1);
    }

    #[test]
    fn test_validate_warns_on_duplicates_and_orphans() {
        let mut graph = ModelGraph::new();
        let schema = named(&mut graph, ElementKind::Schema, "s");
        let t1 = named(&mut graph, ElementKind::Table, "orders");
        let t2 = named(&mut graph, ElementKind::Table, "orders");
        graph.add_related(schema, RelationKind::ElementOwnership, t1).unwrap();
        graph.add_related(schema, RelationKind::ElementOwnership, t2).unwrap();
        named(&mut graph, ElementKind::Operation, "run");

        let diags = validate(&graph);
        assert_eq!(diags.with_code(DiagnosticCode::DuplicateName).count(), 1);
        assert_eq!(diags.with_code(DiagnosticCode::OrphanFeature).count(), 1);
        assert!(!diags.has_errors());
    }
}
