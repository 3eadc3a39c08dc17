//! Model Loading
//!
//! Loads relational model documents (JSON) from a string, a file, or a
//! directory tree. Every element is created through a caller-supplied
//! [`RelationalFactory`]. References that may point into another document
//! (column types, foreign key targets, view dependencies) are collected in
//! the first pass and resolved once every document is loaded.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{Capability, Detail, ElementId, ElementKind, GraphOptions, ModelGraph, RelationKind};
use crate::error::ModelError;
use crate::model::{
    CatalogId, ColumnId, ForeignKeyId, ModelElement, RelationalFactory, SchemaId, SqlDataTypeId,
    TableId, UniqueKey, ViewId,
};

// =============================================================================
// Document Format
// =============================================================================

/// One model document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default)]
    pub types: Vec<TypeDoc>,
    #[serde(default)]
    pub catalogs: Vec<CatalogDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDoc {
    pub name: String,
    /// JDBC type code
    #[serde(default)]
    pub type_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDoc {
    pub name: String,
    #[serde(default)]
    pub schemas: Vec<SchemaDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDoc {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<TableDoc>,
    #[serde(default)]
    pub views: Vec<ViewDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDoc {
    pub name: String,
    #[serde(default)]
    pub is_temporary: bool,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<KeyDoc>,
    #[serde(default)]
    pub unique_keys: Vec<KeyDoc>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewDoc {
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub columns: Vec<ColumnDoc>,
    /// Paths of the tables or views this view reads
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDoc {
    pub name: String,
    /// Name of a declared SQL type
    #[serde(rename = "type")]
    pub type_name: String,
    /// Falls back to the factory default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyDoc {
    #[serde(default)]
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyDoc {
    #[serde(default)]
    pub name: String,
    pub columns: Vec<String>,
    pub references: KeyReference,
}

/// Target of a foreign key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyReference {
    /// Table path: `table`, `schema.table` or `catalog.schema.table`
    pub table: String,
    /// Unique key name; the table's primary key when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

// =============================================================================
// Loaded Model
// =============================================================================

/// Result of loading one or more documents
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub graph: ModelGraph,
    /// SHA-256 over the document contents, in load order
    pub bundle_hash: String,
    pub catalogs: Vec<CatalogId>,
    pub types: BTreeMap<String, SqlDataTypeId>,
    pub document_count: usize,
}

/// Load a single JSON document
pub fn load_from_str(
    json: &str,
    factory: &impl RelationalFactory,
    options: GraphOptions,
) -> anyhow::Result<LoadedModel> {
    let document: ModelDocument =
        serde_json::from_str(json).context("Failed to parse model document")?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());

    build(vec![("<string>".to_string(), document)], hasher, factory, options)
}

/// Load a single JSON document from disk
pub fn load_from_file(
    path: &Path,
    factory: &impl RelationalFactory,
    options: GraphOptions,
) -> anyhow::Result<LoadedModel> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: ModelDocument = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse JSON in {}: {}", path.display(), e))?;

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());

    build(vec![(path.display().to_string(), document)], hasher, factory, options)
}

/// Load every `*.json` document under `dir`, in file name order.
///
/// References may cross documents: a column in one file can use a type
/// declared in another, a foreign key can target a table of another file.
pub fn load_from_directory(
    dir: &Path,
    factory: &impl RelationalFactory,
    options: GraphOptions,
) -> anyhow::Result<LoadedModel> {
    let mut documents = Vec::new();
    let mut hasher = Sha256::new();

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        hasher.update(content.as_bytes());

        let document: ModelDocument = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse JSON in {}: {}", path.display(), e))?;

        let relative = path.strip_prefix(dir).unwrap_or(path);
        debug!(document = %relative.display(), "document parsed");
        documents.push((relative.display().to_string(), document));
    }

    build(documents, hasher, factory, options)
}

// =============================================================================
// Builder
// =============================================================================

struct PendingForeignKey {
    key: ForeignKeyId,
    schema: SchemaId,
    reference: KeyReference,
    source: String,
}

struct PendingDependency {
    view: ViewId,
    schema: SchemaId,
    path: String,
    source: String,
}

struct Builder<'f, F: RelationalFactory> {
    factory: &'f F,
    graph: ModelGraph,
    catalogs: Vec<CatalogId>,
    types: BTreeMap<String, SqlDataTypeId>,
    pending_types: Vec<(ColumnId, String, String)>,
    pending_keys: Vec<PendingForeignKey>,
    pending_dependencies: Vec<PendingDependency>,
}

fn build(
    documents: Vec<(String, ModelDocument)>,
    hasher: Sha256,
    factory: &impl RelationalFactory,
    options: GraphOptions,
) -> anyhow::Result<LoadedModel> {
    let mut builder = Builder {
        factory,
        graph: ModelGraph::with_options(options),
        catalogs: Vec::new(),
        types: BTreeMap::new(),
        pending_types: Vec::new(),
        pending_keys: Vec::new(),
        pending_dependencies: Vec::new(),
    };

    let document_count = documents.len();

    // Types first, so every document sees every type
    for (source, document) in &documents {
        for ty in &document.types {
            builder.add_type(source, ty)?;
        }
    }
    for (source, document) in &documents {
        for catalog in &document.catalogs {
            builder
                .add_catalog(source, catalog)
                .with_context(|| format!("In {}", source))?;
        }
    }

    builder.resolve()?;

    let bundle_hash = format!("{:x}", hasher.finalize());
    info!(
        documents = document_count,
        elements = builder.graph.element_count(),
        links = builder.graph.link_count(),
        "model loaded"
    );

    Ok(LoadedModel {
        graph: builder.graph,
        bundle_hash,
        catalogs: builder.catalogs,
        types: builder.types,
        document_count,
    })
}

impl<F: RelationalFactory> Builder<'_, F> {
    fn add_type(&mut self, source: &str, ty: &TypeDoc) -> anyhow::Result<()> {
        if self.types.contains_key(&ty.name) {
            warn!(document = source, type_name = %ty.name, "duplicate type declaration ignored");
            return Ok(());
        }
        let id = self
            .factory
            .create_sql_data_type(&mut self.graph, &ty.name, ty.type_number)?;
        self.types.insert(ty.name.clone(), id);
        Ok(())
    }

    fn add_catalog(&mut self, source: &str, doc: &CatalogDoc) -> anyhow::Result<()> {
        let catalog = self.factory.create_catalog(&mut self.graph, &doc.name)?;
        self.catalogs.push(catalog);

        for schema_doc in &doc.schemas {
            let schema = self.factory.create_schema(&mut self.graph, &schema_doc.name)?;
            self.graph.add_owned_element(catalog, schema)?;

            for table in &schema_doc.tables {
                self.add_table(source, schema, table)
                    .with_context(|| format!("Table {}.{}", schema_doc.name, table.name))?;
            }
            for view in &schema_doc.views {
                self.add_view(source, schema, view)
                    .with_context(|| format!("View {}.{}", schema_doc.name, view.name))?;
            }
        }
        Ok(())
    }

    fn add_table(&mut self, source: &str, schema: SchemaId, doc: &TableDoc) -> anyhow::Result<()> {
        let table = self.factory.create_table(&mut self.graph, &doc.name)?;
        if let Some(data) = self.graph.get_mut(table.id()) {
            if let Detail::Table(detail) = &mut data.detail {
                detail.is_temporary = doc.is_temporary;
                detail.is_system = doc.is_system;
            }
        }
        self.graph.add_owned_element(schema, table)?;

        for column in &doc.columns {
            self.add_column(source, table, column)?;
        }

        if let Some(key) = &doc.primary_key {
            let pk = self.factory.create_primary_key(&mut self.graph, &key.name)?;
            self.graph.add_owned_element(table, pk)?;
            self.add_key_columns(table, pk, &key.columns)?;
        }
        for key in &doc.unique_keys {
            let unique = self.factory.create_unique_constraint(&mut self.graph, &key.name)?;
            self.graph.add_owned_element(table, unique)?;
            self.add_key_columns(table, unique, &key.columns)?;
        }
        for fk in &doc.foreign_keys {
            let key = self.factory.create_foreign_key(&mut self.graph, &fk.name)?;
            self.graph.add_owned_element(table, key)?;
            for name in &fk.columns {
                let column = self.local_column(table, name)?;
                self.graph.add_foreign_key_column(key, column)?;
            }
            self.pending_keys.push(PendingForeignKey {
                key,
                schema,
                reference: fk.references.clone(),
                source: source.to_string(),
            });
        }

        if let Some(text) = &doc.description {
            let description = self.factory.create_description(&mut self.graph, text)?;
            self.graph.add_owned_element(schema, description)?;
            self.graph.add_described_element(description, table)?;
        }
        Ok(())
    }

    fn add_view(&mut self, source: &str, schema: SchemaId, doc: &ViewDoc) -> anyhow::Result<()> {
        let view = self.factory.create_view(&mut self.graph, &doc.name, &doc.query)?;
        self.graph.add_owned_element(schema, view)?;

        for column in &doc.columns {
            let column = self.create_column(source, column)?;
            self.graph.add_feature(view, column)?;
        }
        for path in &doc.depends_on {
            self.pending_dependencies.push(PendingDependency {
                view,
                schema,
                path: path.clone(),
                source: source.to_string(),
            });
        }
        Ok(())
    }

    fn add_column(&mut self, source: &str, table: TableId, doc: &ColumnDoc) -> anyhow::Result<()> {
        let column = self.create_column(source, doc)?;
        self.graph.add_feature(table, column)?;
        Ok(())
    }

    fn create_column(&mut self, source: &str, doc: &ColumnDoc) -> anyhow::Result<ColumnId> {
        let column = self.factory.create_column(&mut self.graph, &doc.name)?;
        if let Some(data) = self.graph.get_mut(column.id()) {
            if let Detail::Column(detail) = &mut data.detail {
                if let Some(nullable) = doc.nullable {
                    detail.is_nullable = nullable;
                }
                detail.length = doc.length;
                detail.precision = doc.precision;
                detail.scale = doc.scale;
                detail.initial_value = doc.default.clone();
            }
        }
        self.pending_types
            .push((column, doc.type_name.clone(), source.to_string()));
        Ok(column)
    }

    fn add_key_columns(&mut self, table: TableId, key: impl UniqueKey, columns: &[String]) -> anyhow::Result<()> {
        for name in columns {
            let column = self.local_column(table, name)?;
            self.graph.add_unique_key_column(key, column)?;
        }
        Ok(())
    }

    fn local_column(&self, table: TableId, name: &str) -> Result<ColumnId, ModelError> {
        self.graph
            .features_of::<ColumnId>(table)
            .into_iter()
            .find(|&column| self.graph.name(column.id()) == name)
            .ok_or_else(|| {
                ModelError::UnresolvedReference(format!(
                    "column '{}' of table '{}'",
                    name,
                    self.graph.name(table.id())
                ))
            })
    }

    // ========== Second Pass ==========

    fn resolve(&mut self) -> anyhow::Result<()> {
        for (column, type_name, source) in std::mem::take(&mut self.pending_types) {
            let ty = self.types.get(&type_name).copied().ok_or_else(|| {
                ModelError::UnresolvedReference(format!(
                    "type '{}' of column '{}'",
                    type_name,
                    self.graph.name(column.id())
                ))
            });
            let ty = ty.with_context(|| format!("In {}", source))?;
            self.graph.set_column_type(column, ty)?;
        }

        for pending in std::mem::take(&mut self.pending_keys) {
            let table = self
                .resolve_table(pending.schema, &pending.reference.table)
                .ok_or_else(|| {
                    ModelError::UnresolvedReference(format!(
                        "table '{}' referenced by foreign key '{}'",
                        pending.reference.table,
                        self.graph.name(pending.key.id())
                    ))
                })
                .with_context(|| format!("In {}", pending.source))?;
            let key = self
                .resolve_key(table, pending.reference.key.as_deref())
                .ok_or_else(|| {
                    ModelError::UnresolvedReference(format!(
                        "key '{}' of table '{}'",
                        pending.reference.key.as_deref().unwrap_or("<primary>"),
                        pending.reference.table
                    ))
                })
                .with_context(|| format!("In {}", pending.source))?;
            self.graph
                .set_target(pending.key.id(), RelationKind::ForeignKeyUniqueKey, Some(key))?;
        }

        for pending in std::mem::take(&mut self.pending_dependencies) {
            let target = self
                .resolve_table(pending.schema, &pending.path)
                .ok_or_else(|| {
                    ModelError::UnresolvedReference(format!(
                        "'{}' read by view '{}'",
                        pending.path,
                        self.graph.name(pending.view.id())
                    ))
                })
                .with_context(|| format!("In {}", pending.source))?;
            self.factory
                .create_dependency(&mut self.graph, pending.view, target)?;
        }

        Ok(())
    }

    /// Find a table or view by path, trying the path as given, then
    /// relative to the schema, then relative to the schema's catalog
    fn resolve_table(&self, schema: SchemaId, path: &str) -> Option<ElementId> {
        let schema_path = self.graph.qualified_name(schema.id(), ".", None).ok()?;
        let catalog_path = self
            .graph
            .namespace_of(schema.id())
            .and_then(|catalog| self.graph.qualified_name(catalog, ".", None).ok());

        let mut candidates = vec![path.to_string(), format!("{}.{}", schema_path, path)];
        if let Some(catalog_path) = catalog_path {
            candidates.push(format!("{}.{}", catalog_path, path));
        }

        candidates
            .iter()
            .filter_map(|candidate| self.graph.resolve_path(candidate, "."))
            .find(|&id| matches!(self.graph.kind(id), Some(ElementKind::Table | ElementKind::View)))
    }

    fn resolve_key(&self, table: ElementId, name: Option<&str>) -> Option<ElementId> {
        self.graph.owned(table).into_iter().find(|&owned| {
            let Some(data) = self.graph.get(owned) else {
                return false;
            };
            match name {
                Some(name) => data.kind.has(Capability::UniqueKey) && data.name == name,
                None => data.kind == ElementKind::PrimaryKey,
            }
        })
    }
}
