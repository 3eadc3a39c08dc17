//! CWM Model Graph
//!
//! An in-memory object model for Common Warehouse Metamodel style metadata:
//! packages, classes and their features, and the relational layer of
//! catalogs, schemas, tables, views, columns and keys.
//!
//! ## Features
//!
//! - **Bidirectional Associations**: every link is stored once and read from
//!   either end, so forward and inverse roles never disagree
//! - **Ownership**: at most one owner per element across all ownership
//!   relations; deleting an owner deletes what it owns
//! - **Qualified Names**: owner-chain paths with configurable separator
//! - **Inheritance**: transitive parents, features and visible contents
//! - **Typed API**: handle types and capability traits over the generic graph
//! - **Loading**: JSON model documents, snapshots, DOT export
//!
//! ## Architecture
//!
//! ```text
//! graph/
//! ├── element     ElementId, ElementKind, Capability, ElementData
//! ├── relation    RelationKind registry (roles, multiplicities, ownership)
//! ├── mod         ModelGraph arena and generic mutators
//! ├── naming      owner chains and qualified names
//! ├── inheritance generalization closures
//! ├── analysis    cycle groups and validation
//! ├── snapshot    serializable model snapshots
//! └── loader      JSON model documents
//! model/
//! ├── mod         typed handles and capability traits
//! ├── facade      typed relation methods
//! └── factory     CoreFactory, RelationalFactory, StandardFactory
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod model;

pub use config::ModelConfig;
pub use error::{ModelError, Result};
pub use graph::{
    ElementData, ElementId, ElementKind, GraphOptions, ModelGraph, RelationKind, Visibility,
};
pub use model::{CoreFactory, ElementDefaults, RelationalFactory, StandardFactory};
