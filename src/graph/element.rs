//! Model Elements
//!
//! Element identity, kinds, the capabilities each kind provides, and the
//! per-element data stored in the arena.

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Element Identity
// =============================================================================

/// Stable handle of an element in a [`ModelGraph`](super::ModelGraph).
///
/// Identity is positional: two handles are the same element iff their
/// indices are equal. Indices of deleted elements may be reused by later
/// insertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(u32);

impl ElementId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }

    pub(crate) fn node(self) -> NodeIndex {
        NodeIndex::new(self.0 as usize)
    }
}

impl From<NodeIndex> for ElementId {
    fn from(idx: NodeIndex) -> Self {
        Self(idx.index() as u32)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Capabilities
// =============================================================================

/// A role an element can play in a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Every element
    ModelElement,
    /// Owns other elements
    Namespace,
    /// Namespace that can import elements
    Package,
    /// Namespace with features and generalizations
    Classifier,
    /// Owned by a classifier
    Feature,
    /// Feature with a type (attribute, column)
    StructuralFeature,
    Dependency,
    Constraint,
    Description,
    /// Primary key or unique constraint
    UniqueKey,
    ForeignKey,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =============================================================================
// Element Kind
// =============================================================================

/// Concrete metaclass of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    // === Core ===
    Package,
    Class,
    DataType,
    Attribute,
    Operation,
    Dependency,
    Constraint,
    Description,

    // === Relational ===
    Catalog,
    Schema,
    Table,
    View,
    Column,
    SqlDataType,
    PrimaryKey,
    UniqueConstraint,
    ForeignKey,
}

impl ElementKind {
    /// Whether elements of this kind can play the given role
    pub fn has(self, capability: Capability) -> bool {
        use ElementKind::*;
        match capability {
            Capability::ModelElement => true,
            Capability::Namespace => {
                self.has(Capability::Package) || self.has(Capability::Classifier)
            }
            Capability::Package => matches!(self, Package | Catalog | Schema),
            Capability::Classifier => {
                matches!(self, Class | DataType | Table | View | SqlDataType)
            }
            Capability::Feature => matches!(self, Attribute | Operation | Column),
            Capability::StructuralFeature => matches!(self, Attribute | Column),
            Capability::Dependency => self == Dependency,
            Capability::Constraint => self == Constraint,
            Capability::Description => self == Description,
            Capability::UniqueKey => matches!(self, PrimaryKey | UniqueConstraint),
            Capability::ForeignKey => self == ForeignKey,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Class => "class",
            Self::DataType => "data_type",
            Self::Attribute => "attribute",
            Self::Operation => "operation",
            Self::Dependency => "dependency",
            Self::Constraint => "constraint",
            Self::Description => "description",
            Self::Catalog => "catalog",
            Self::Schema => "schema",
            Self::Table => "table",
            Self::View => "view",
            Self::Column => "column",
            Self::SqlDataType => "sql_data_type",
            Self::PrimaryKey => "primary_key",
            Self::UniqueConstraint => "unique_constraint",
            Self::ForeignKey => "foreign_key",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Visibility
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
    Package,
}

impl Visibility {
    /// Whether an element with this visibility is inherited by specializations
    pub fn is_inherited(self) -> bool {
        matches!(self, Self::Public | Self::Protected)
    }
}

// =============================================================================
// Element Data
// =============================================================================

/// Column attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    pub is_nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<String>,
}

/// Table/view attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDetail {
    #[serde(default)]
    pub is_temporary: bool,
    #[serde(default)]
    pub is_system: bool,
    /// Query text for views
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Kind-specific payload of an element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Detail {
    #[default]
    None,
    Column(ColumnDetail),
    Table(TableDetail),
    SqlType { type_number: i32 },
    /// Constraint expression or description text
    Body { language: Option<String>, body: String },
    Dependency { dependency_kind: Option<String> },
}

/// Data stored for each element in the arena
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementData {
    pub kind: ElementKind,
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tagged_values: BTreeMap<String, String>,
    #[serde(default)]
    pub detail: Detail,
}

impl ElementData {
    pub fn new(kind: ElementKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            visibility: Visibility::default(),
            is_abstract: false,
            tagged_values: BTreeMap::new(),
            detail: Detail::None,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>, value: impl Into<String>) -> Self {
        self.tagged_values.insert(tag.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relational_kinds_are_namespaces() {
        assert!(ElementKind::Table.has(Capability::Classifier));
        assert!(ElementKind::Table.has(Capability::Namespace));
        assert!(ElementKind::Schema.has(Capability::Package));
        assert!(ElementKind::Catalog.has(Capability::Namespace));
        assert!(!ElementKind::Column.has(Capability::Namespace));
    }

    #[test]
    fn test_key_capabilities() {
        assert!(ElementKind::PrimaryKey.has(Capability::UniqueKey));
        assert!(ElementKind::UniqueConstraint.has(Capability::UniqueKey));
        assert!(!ElementKind::ForeignKey.has(Capability::UniqueKey));
        assert!(ElementKind::Column.has(Capability::StructuralFeature));
        assert!(!ElementKind::Operation.has(Capability::StructuralFeature));
    }

    #[test]
    fn test_visibility_inheritance() {
        assert!(Visibility::Public.is_inherited());
        assert!(Visibility::Protected.is_inherited());
        assert!(!Visibility::Private.is_inherited());
        assert!(!Visibility::Package.is_inherited());
    }

    #[test]
    fn test_element_id_display() {
        assert_eq!(ElementId::new(7).to_string(), "#7");
    }
}
