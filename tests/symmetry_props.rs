//! Property tests: any sequence of adds and removes leaves both link ends in
//! agreement and every element with at most one owner.

use cwm_model::graph::{ElementData, ElementKind, RelationKind};
use cwm_model::{ElementId, ModelGraph};
use proptest::prelude::*;

const RELATIONS: [RelationKind; 4] = [
    RelationKind::ElementOwnership,
    RelationKind::ClassifierFeature,
    RelationKind::Generalization,
    RelationKind::ImportedElement,
];

fn populate(graph: &mut ModelGraph) -> Vec<ElementId> {
    let kinds = [
        ElementKind::Package,
        ElementKind::Package,
        ElementKind::Class,
        ElementKind::Class,
        ElementKind::Class,
        ElementKind::Attribute,
        ElementKind::Attribute,
        ElementKind::Operation,
    ];
    kinds
        .iter()
        .enumerate()
        .map(|(i, &kind)| graph.add_element(ElementData::new(kind, format!("e{}", i))))
        .collect()
}

fn check_symmetry(graph: &ModelGraph, elements: &[ElementId]) -> Result<(), TestCaseError> {
    for (source, relation, target) in graph.links() {
        prop_assert!(graph.related(source, relation).contains(&target));
        prop_assert!(graph.inverse_related(target, relation).contains(&source));
        prop_assert!(graph.is_related(source, relation, target));
    }

    for &a in elements {
        for relation in RELATIONS {
            for b in graph.related(a, relation) {
                prop_assert!(graph.inverse_related(b, relation).contains(&a));
            }
            for b in graph.inverse_related(a, relation) {
                prop_assert!(graph.related(b, relation).contains(&a));
            }
        }
    }
    Ok(())
}

fn check_single_owner(graph: &ModelGraph, elements: &[ElementId]) -> Result<(), TestCaseError> {
    for &element in elements {
        let owners: usize = RelationKind::OWNERSHIP
            .iter()
            .map(|&relation| graph.inverse_related(element, relation).len())
            .sum();
        prop_assert!(owners <= 1, "{} has {} owners", element, owners);

        if let Some((owner, relation)) = graph.owner(element) {
            prop_assert!(graph.related(owner, relation).contains(&element));
            prop_assert!(graph.owned(owner).contains(&element));
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn test_links_stay_symmetric(
        ops in prop::collection::vec((any::<bool>(), 0usize..8, 0..4usize, 0usize..8), 0..64)
    ) {
        let mut graph = ModelGraph::new();
        let elements = populate(&mut graph);

        for (add, a, r, b) in ops {
            let (source, relation, target) = (elements[a], RELATIONS[r], elements[b]);
            if add {
                // Role mismatches are expected for some picks
                if let Ok(true) = graph.add_related(source, relation, target) {
                    prop_assert!(graph.is_related(source, relation, target));
                    prop_assert_eq!(graph.add_related(source, relation, target).ok(), Some(false));
                }
            } else {
                let existed = graph.is_related(source, relation, target);
                prop_assert_eq!(graph.remove_related(source, relation, target).ok(), Some(existed));
                prop_assert!(!graph.is_related(source, relation, target));
                prop_assert!(!graph.inverse_related(target, relation).contains(&source));
            }
        }

        check_symmetry(&graph, &elements)?;
        check_single_owner(&graph, &elements)?;
    }

    #[test]
    fn test_failed_add_changes_nothing(a in 0usize..8, r in 0..4usize, b in 0usize..8) {
        let mut graph = ModelGraph::new();
        let elements = populate(&mut graph);
        let before = graph.links();

        if graph.add_related(elements[a], RELATIONS[r], elements[b]).is_err() {
            prop_assert_eq!(graph.links(), before);
        }
    }

    #[test]
    fn test_qualified_name_joins_owner_chain(names in prop::collection::vec("[a-z]{1,8}", 1..6)) {
        let mut graph = ModelGraph::new();
        let mut previous: Option<ElementId> = None;
        for name in &names {
            let package = graph.add_element(ElementData::new(ElementKind::Package, name.as_str()));
            if let Some(owner) = previous {
                graph.add_related(owner, RelationKind::ElementOwnership, package).unwrap();
            }
            previous = Some(package);
        }

        let leaf = previous.unwrap();
        prop_assert_eq!(graph.qualified_name(leaf, ".", None).unwrap(), names.join("."));
        prop_assert_eq!(graph.resolve_path(&names.join("."), "."), Some(leaf));
    }
}
