//! Relation Registry
//!
//! The closed set of associations between model elements. Every relation is
//! stored once as a directed edge `source -> target`; the source end and the
//! target end are the two roles of the association, so the inverse of a
//! relation is the same edge read from the other side.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::element::Capability;

use Capability as C;
use Multiplicity as M;

// =============================================================================
// Multiplicity
// =============================================================================

/// Multiplicity of one association end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Multiplicity {
    /// Exactly one
    One,
    /// Zero or one
    ZeroOrOne,
    /// Any number
    ZeroOrMore,
    /// At least one
    OneOrMore,
}

impl Multiplicity {
    /// Upper bound is one: installing a new link replaces the existing one
    pub fn is_single(self) -> bool {
        matches!(self, Self::One | Self::ZeroOrOne)
    }

    /// Lower bound is one: a complete model must have at least one link
    pub fn is_required(self) -> bool {
        matches!(self, Self::One | Self::OneOrMore)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::One => "1",
            Self::ZeroOrOne => "0..1",
            Self::ZeroOrMore => "0..*",
            Self::OneOrMore => "1..*",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Relation Ends
// =============================================================================

/// One end of an association.
///
/// `multiplicity` on the source end bounds how many targets one source may
/// hold; on the target end it bounds how many sources one target may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationEnd {
    pub role: &'static str,
    pub capability: Capability,
    pub multiplicity: Multiplicity,
}

/// Which end of a relation an element sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Source,
    Target,
}

/// Static description of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationSpec {
    pub name: &'static str,
    /// Role seen from the source: the collection of targets
    pub source: RelationEnd,
    /// Role seen from the target: the collection (or slot) of sources
    pub target: RelationEnd,
    /// Composite ownership: the target is owned by the source
    pub ownership: bool,
    /// Target order on the source end is significant
    pub ordered: bool,
    /// Cycles are meaningless (ownership chains, generalization)
    pub acyclic: bool,
}

impl RelationSpec {
    pub fn end(&self, side: Side) -> &RelationEnd {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }
}

const fn end(role: &'static str, capability: Capability, multiplicity: Multiplicity) -> RelationEnd {
    RelationEnd { role, capability, multiplicity }
}

// =============================================================================
// Relation Kinds
// =============================================================================

/// Every association known to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Namespace.ownedElement / ModelElement.namespace
    ElementOwnership,
    /// Classifier.feature / Feature.owner
    ClassifierFeature,
    /// Classifier.parent / Classifier.specialization (child -> parent)
    Generalization,
    /// Dependency.client / ModelElement.clientDependency
    DependencyClient,
    /// Dependency.supplier / ModelElement.supplierDependency
    DependencySupplier,
    /// Constraint.constrainedElement / ModelElement.constraint
    ElementConstraint,
    /// Description.modelElement / ModelElement.description
    DescribedElement,
    /// Package.importedElement / ModelElement.importer
    ImportedElement,
    /// StructuralFeature.type / Classifier.structuralFeature
    StructuralFeatureType,
    /// UniqueKey.feature / StructuralFeature.uniqueKey
    UniqueKeyFeature,
    /// ForeignKey.feature / StructuralFeature.keyRelationship
    ForeignKeyFeature,
    /// ForeignKey.uniqueKey / UniqueKey.keyRelationship
    ForeignKeyUniqueKey,
}

// =============================================================================
// Registry
// =============================================================================

static ELEMENT_OWNERSHIP: RelationSpec = RelationSpec {
    name: "ElementOwnership",
    source: end("ownedElement", C::Namespace, M::ZeroOrMore),
    target: end("namespace", C::ModelElement, M::ZeroOrOne),
    ownership: true,
    ordered: false,
    acyclic: true,
};

static CLASSIFIER_FEATURE: RelationSpec = RelationSpec {
    name: "ClassifierFeature",
    source: end("feature", C::Classifier, M::ZeroOrMore),
    target: end("owner", C::Feature, M::ZeroOrOne),
    ownership: true,
    ordered: true,
    acyclic: true,
};

static GENERALIZATION: RelationSpec = RelationSpec {
    name: "Generalization",
    source: end("parent", C::Classifier, M::ZeroOrMore),
    target: end("specialization", C::Classifier, M::ZeroOrMore),
    ownership: false,
    ordered: false,
    acyclic: true,
};

static DEPENDENCY_CLIENT: RelationSpec = RelationSpec {
    name: "DependencyClient",
    source: end("client", C::Dependency, M::OneOrMore),
    target: end("clientDependency", C::ModelElement, M::ZeroOrMore),
    ownership: false,
    ordered: false,
    acyclic: false,
};

static DEPENDENCY_SUPPLIER: RelationSpec = RelationSpec {
    name: "DependencySupplier",
    source: end("supplier", C::Dependency, M::OneOrMore),
    target: end("supplierDependency", C::ModelElement, M::ZeroOrMore),
    ownership: false,
    ordered: false,
    acyclic: false,
};

static ELEMENT_CONSTRAINT: RelationSpec = RelationSpec {
    name: "ElementConstraint",
    source: end("constrainedElement", C::Constraint, M::ZeroOrMore),
    target: end("constraint", C::ModelElement, M::ZeroOrMore),
    ownership: false,
    ordered: true,
    acyclic: false,
};

static DESCRIBED_ELEMENT: RelationSpec = RelationSpec {
    name: "DescribedElement",
    source: end("modelElement", C::Description, M::ZeroOrMore),
    target: end("description", C::ModelElement, M::ZeroOrMore),
    ownership: false,
    ordered: false,
    acyclic: false,
};

static IMPORTED_ELEMENT: RelationSpec = RelationSpec {
    name: "ImportedElement",
    source: end("importedElement", C::Package, M::ZeroOrMore),
    target: end("importer", C::ModelElement, M::ZeroOrMore),
    ownership: false,
    ordered: false,
    acyclic: false,
};

static STRUCTURAL_FEATURE_TYPE: RelationSpec = RelationSpec {
    name: "StructuralFeatureType",
    source: end("type", C::StructuralFeature, M::One),
    target: end("structuralFeature", C::Classifier, M::ZeroOrMore),
    ownership: false,
    ordered: false,
    acyclic: false,
};

static UNIQUE_KEY_FEATURE: RelationSpec = RelationSpec {
    name: "UniqueKeyFeature",
    source: end("feature", C::UniqueKey, M::OneOrMore),
    target: end("uniqueKey", C::StructuralFeature, M::ZeroOrMore),
    ownership: false,
    ordered: true,
    acyclic: false,
};

static FOREIGN_KEY_FEATURE: RelationSpec = RelationSpec {
    name: "ForeignKeyFeature",
    source: end("feature", C::ForeignKey, M::OneOrMore),
    target: end("keyRelationship", C::StructuralFeature, M::ZeroOrMore),
    ownership: false,
    ordered: true,
    acyclic: false,
};

static FOREIGN_KEY_UNIQUE_KEY: RelationSpec = RelationSpec {
    name: "ForeignKeyUniqueKey",
    source: end("uniqueKey", C::ForeignKey, M::One),
    target: end("keyRelationship", C::UniqueKey, M::ZeroOrMore),
    ownership: false,
    ordered: false,
    acyclic: false,
};

impl RelationKind {
    pub const ALL: [RelationKind; 12] = [
        Self::ElementOwnership,
        Self::ClassifierFeature,
        Self::Generalization,
        Self::DependencyClient,
        Self::DependencySupplier,
        Self::ElementConstraint,
        Self::DescribedElement,
        Self::ImportedElement,
        Self::StructuralFeatureType,
        Self::UniqueKeyFeature,
        Self::ForeignKeyFeature,
        Self::ForeignKeyUniqueKey,
    ];

    /// Ownership relations, in the order owners are searched
    pub const OWNERSHIP: [RelationKind; 2] = [Self::ElementOwnership, Self::ClassifierFeature];

    pub fn spec(self) -> &'static RelationSpec {
        match self {
            Self::ElementOwnership => &ELEMENT_OWNERSHIP,
            Self::ClassifierFeature => &CLASSIFIER_FEATURE,
            Self::Generalization => &GENERALIZATION,
            Self::DependencyClient => &DEPENDENCY_CLIENT,
            Self::DependencySupplier => &DEPENDENCY_SUPPLIER,
            Self::ElementConstraint => &ELEMENT_CONSTRAINT,
            Self::DescribedElement => &DESCRIBED_ELEMENT,
            Self::ImportedElement => &IMPORTED_ELEMENT,
            Self::StructuralFeatureType => &STRUCTURAL_FEATURE_TYPE,
            Self::UniqueKeyFeature => &UNIQUE_KEY_FEATURE,
            Self::ForeignKeyFeature => &FOREIGN_KEY_FEATURE,
            Self::ForeignKeyUniqueKey => &FOREIGN_KEY_UNIQUE_KEY,
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn is_ownership(self) -> bool {
        self.spec().ownership
    }

    pub fn is_ordered(self) -> bool {
        self.spec().ordered
    }

    pub fn is_acyclic(self) -> bool {
        self.spec().acyclic
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership_relations_have_single_owner_end() {
        for relation in RelationKind::ALL {
            let spec = relation.spec();
            if spec.ownership {
                assert!(spec.target.multiplicity.is_single(), "{}", relation);
                assert!(RelationKind::OWNERSHIP.contains(&relation));
            }
        }
    }

    #[test]
    fn test_all_lists_every_relation_once() {
        let mut names: Vec<_> = RelationKind::ALL.iter().map(|r| r.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), RelationKind::ALL.len());
    }

    #[test]
    fn test_multiplicity_bounds() {
        assert!(Multiplicity::One.is_single());
        assert!(Multiplicity::One.is_required());
        assert!(Multiplicity::ZeroOrOne.is_single());
        assert!(!Multiplicity::ZeroOrOne.is_required());
        assert!(!Multiplicity::OneOrMore.is_single());
        assert_eq!(Multiplicity::ZeroOrMore.to_string(), "0..*");
    }

    #[test]
    fn test_end_lookup() {
        let spec = RelationKind::ClassifierFeature.spec();
        assert_eq!(spec.end(Side::Source).role, "feature");
        assert_eq!(spec.end(Side::Target).role, "owner");
    }
}
