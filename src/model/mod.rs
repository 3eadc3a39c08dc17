//! Typed Model API
//!
//! Handle newtypes for each element kind and capability traits that say
//! which roles a handle may play. The typed methods in [`facade`] accept
//! only handles whose capabilities match the relation, so most role
//! mismatches are rejected at compile time. The generic
//! [`ModelGraph`](crate::graph::ModelGraph) API still checks every link at
//! runtime.

pub mod facade;
pub mod factory;

pub use factory::{CoreFactory, ElementDefaults, RelationalFactory, StandardFactory};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph::{ElementId, ElementKind, ModelGraph};

// =============================================================================
// Capability Traits
// =============================================================================

/// Anything that names an element
pub trait ModelElement: Copy {
    fn id(self) -> ElementId;
}

/// Owns other elements
pub trait Namespace: ModelElement {}

/// Namespace that can import elements
pub trait Package: Namespace {}

/// Namespace with features and generalizations
pub trait Classifier: Namespace {}

/// Owned by a classifier
pub trait Feature: ModelElement {}

/// Feature with a type
pub trait StructuralFeature: Feature {}

/// Primary key or unique constraint
pub trait UniqueKey: ModelElement {}

impl ModelElement for ElementId {
    fn id(self) -> ElementId {
        self
    }
}

// =============================================================================
// Handles
// =============================================================================

/// Handle of an element known to be of one kind
pub trait Handle: ModelElement {
    const KIND: ElementKind;

    /// Typed handle for `id`, if it exists and has the right kind
    fn cast(graph: &ModelGraph, id: ElementId) -> Option<Self>;
}

macro_rules! handle {
    ($($(#[$doc:meta])* $name:ident => $kind:ident;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(ElementId);

            impl ModelElement for $name {
                fn id(self) -> ElementId {
                    self.0
                }
            }

            impl Handle for $name {
                const KIND: ElementKind = ElementKind::$kind;

                fn cast(graph: &ModelGraph, id: ElementId) -> Option<Self> {
                    (graph.kind(id)? == Self::KIND).then_some(Self(id))
                }
            }

            impl From<$name> for ElementId {
                fn from(handle: $name) -> Self {
                    handle.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}{}", Self::KIND, self.0)
                }
            }
        )*
    };
}

handle! {
    PackageId => Package;
    ClassId => Class;
    DataTypeId => DataType;
    AttributeId => Attribute;
    OperationId => Operation;
    DependencyId => Dependency;
    ConstraintId => Constraint;
    DescriptionId => Description;
    CatalogId => Catalog;
    SchemaId => Schema;
    TableId => Table;
    /// Named query
    ViewId => View;
    ColumnId => Column;
    SqlDataTypeId => SqlDataType;
    PrimaryKeyId => PrimaryKey;
    UniqueConstraintId => UniqueConstraint;
    ForeignKeyId => ForeignKey;
}

macro_rules! capability {
    ($cap:ident: $($name:ident),*) => {
        $(impl $cap for $name {})*
    };
}

capability!(Namespace: PackageId, CatalogId, SchemaId, ClassId, DataTypeId, TableId, ViewId, SqlDataTypeId);
capability!(Package: PackageId, CatalogId, SchemaId);
capability!(Classifier: ClassId, DataTypeId, TableId, ViewId, SqlDataTypeId);
capability!(Feature: AttributeId, OperationId, ColumnId);
capability!(StructuralFeature: AttributeId, ColumnId);
capability!(UniqueKey: PrimaryKeyId, UniqueConstraintId);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Capability, ElementData};

    fn is_namespace<T: Namespace>() {}
    fn is_classifier<T: Classifier>() {}

    #[test]
    fn test_handle_capabilities_agree_with_kinds() {
        is_namespace::<TableId>();
        is_classifier::<ViewId>();

        assert!(TableId::KIND.has(Capability::Classifier));
        assert!(SchemaId::KIND.has(Capability::Package));
        assert!(ColumnId::KIND.has(Capability::StructuralFeature));
        assert!(PrimaryKeyId::KIND.has(Capability::UniqueKey));
        assert!(OperationId::KIND.has(Capability::Feature));
        assert!(!OperationId::KIND.has(Capability::StructuralFeature));
    }

    #[test]
    fn test_cast_checks_kind() {
        let mut graph = ModelGraph::new();
        let id = graph.add_element(ElementData::new(ElementKind::Table, "orders"));

        assert_eq!(TableId::cast(&graph, id).map(ModelElement::id), Some(id));
        assert!(ViewId::cast(&graph, id).is_none());
        assert!(TableId::cast(&graph, ElementId::new(42)).is_none());
    }

    #[test]
    fn test_handle_display() {
        let mut graph = ModelGraph::new();
        let id = graph.add_element(ElementData::new(ElementKind::Column, "id"));
        let handle = ColumnId::cast(&graph, id).unwrap();
        assert_eq!(handle.to_string(), format!("column#{}", id.index()));
    }
}
