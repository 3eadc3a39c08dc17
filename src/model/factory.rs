//! Element factories.
//!
//! Factories create unlinked elements with validated required fields and
//! configured defaults. They are plain values passed to whoever needs them;
//! a custom factory overrides individual `create_*` methods and keeps the
//! rest.

use serde::{Deserialize, Serialize};

use super::{
    AttributeId, CatalogId, ClassId, ColumnId, ConstraintId, DataTypeId, DependencyId,
    DescriptionId, ForeignKeyId, Handle, ModelElement, OperationId, PackageId, PrimaryKeyId,
    SchemaId, SqlDataTypeId, TableId, UniqueConstraintId, ViewId,
};
use crate::error::{ModelError, Result};
use crate::graph::{ColumnDetail, Detail, ElementData, ModelGraph, TableDetail, Visibility};

/// Values for optional fields a factory call does not set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDefaults {
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_abstract: bool,
    /// Nullability of new columns
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl Default for ElementDefaults {
    fn default() -> Self {
        Self {
            visibility: Visibility::Public,
            is_abstract: false,
            nullable: default_nullable(),
        }
    }
}

impl ElementDefaults {
    /// Element data of kind `H::KIND` with these defaults applied
    pub fn data<H: Handle>(&self, name: &str) -> ElementData {
        let mut data = ElementData::new(H::KIND, name).with_visibility(self.visibility);
        data.is_abstract = self.is_abstract;
        data
    }
}

fn required_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ModelError::invalid(format!("{} name must not be blank", kind)));
    }
    Ok(())
}

fn create<H: Handle>(graph: &mut ModelGraph, data: ElementData) -> Result<H> {
    let id = graph.add_element(data);
    H::cast(graph, id).ok_or(ModelError::ElementNotFound(id))
}

// =============================================================================
// Core Factory
// =============================================================================

/// Creates core (object model) elements
pub trait CoreFactory {
    fn defaults(&self) -> &ElementDefaults;

    fn create_package(&self, graph: &mut ModelGraph, name: &str) -> Result<PackageId> {
        required_name("package", name)?;
        create(graph, self.defaults().data::<PackageId>(name))
    }

    fn create_class(&self, graph: &mut ModelGraph, name: &str) -> Result<ClassId> {
        required_name("class", name)?;
        create(graph, self.defaults().data::<ClassId>(name))
    }

    fn create_data_type(&self, graph: &mut ModelGraph, name: &str) -> Result<DataTypeId> {
        required_name("data type", name)?;
        create(graph, self.defaults().data::<DataTypeId>(name))
    }

    fn create_attribute(&self, graph: &mut ModelGraph, name: &str) -> Result<AttributeId> {
        required_name("attribute", name)?;
        create(graph, self.defaults().data::<AttributeId>(name))
    }

    fn create_operation(&self, graph: &mut ModelGraph, name: &str) -> Result<OperationId> {
        required_name("operation", name)?;
        create(graph, self.defaults().data::<OperationId>(name))
    }

    /// A dependency needs at least one client and one supplier, so both are
    /// linked on creation
    fn create_dependency(
        &self,
        graph: &mut ModelGraph,
        client: impl ModelElement,
        supplier: impl ModelElement,
    ) -> Result<DependencyId> {
        graph.element(client.id())?;
        graph.element(supplier.id())?;

        let dependency: DependencyId = create(graph, self.defaults().data::<DependencyId>(""))?;
        graph.add_client(dependency, client)?;
        graph.add_supplier(dependency, supplier)?;
        Ok(dependency)
    }

    fn create_constraint(
        &self,
        graph: &mut ModelGraph,
        body: &str,
        language: Option<&str>,
    ) -> Result<ConstraintId> {
        required_name("constraint body", body)?;
        let data = self.defaults().data::<ConstraintId>("").with_detail(Detail::Body {
            language: language.map(str::to_string),
            body: body.to_string(),
        });
        create(graph, data)
    }

    fn create_description(&self, graph: &mut ModelGraph, body: &str) -> Result<DescriptionId> {
        required_name("description body", body)?;
        let data = self.defaults().data::<DescriptionId>("").with_detail(Detail::Body {
            language: None,
            body: body.to_string(),
        });
        create(graph, data)
    }
}

// =============================================================================
// Relational Factory
// =============================================================================

/// Creates relational (catalog/schema/table) elements
pub trait RelationalFactory: CoreFactory {
    fn create_catalog(&self, graph: &mut ModelGraph, name: &str) -> Result<CatalogId> {
        required_name("catalog", name)?;
        create(graph, self.defaults().data::<CatalogId>(name))
    }

    fn create_schema(&self, graph: &mut ModelGraph, name: &str) -> Result<SchemaId> {
        required_name("schema", name)?;
        create(graph, self.defaults().data::<SchemaId>(name))
    }

    fn create_table(&self, graph: &mut ModelGraph, name: &str) -> Result<TableId> {
        required_name("table", name)?;
        let data = self
            .defaults()
            .data::<TableId>(name)
            .with_detail(Detail::Table(TableDetail::default()));
        create(graph, data)
    }

    fn create_view(&self, graph: &mut ModelGraph, name: &str, query: &str) -> Result<ViewId> {
        required_name("view", name)?;
        let data = self.defaults().data::<ViewId>(name).with_detail(Detail::Table(TableDetail {
            query: Some(query.to_string()),
            ..TableDetail::default()
        }));
        create(graph, data)
    }

    fn create_column(&self, graph: &mut ModelGraph, name: &str) -> Result<ColumnId> {
        required_name("column", name)?;
        let data = self.defaults().data::<ColumnId>(name).with_detail(Detail::Column(ColumnDetail {
            length: None,
            precision: None,
            scale: None,
            is_nullable: self.defaults().nullable,
            initial_value: None,
        }));
        create(graph, data)
    }

    fn create_sql_data_type(
        &self,
        graph: &mut ModelGraph,
        name: &str,
        type_number: i32,
    ) -> Result<SqlDataTypeId> {
        required_name("SQL data type", name)?;
        let data = self
            .defaults()
            .data::<SqlDataTypeId>(name)
            .with_detail(Detail::SqlType { type_number });
        create(graph, data)
    }

    fn create_primary_key(&self, graph: &mut ModelGraph, name: &str) -> Result<PrimaryKeyId> {
        create(graph, self.defaults().data::<PrimaryKeyId>(name))
    }

    fn create_unique_constraint(&self, graph: &mut ModelGraph, name: &str) -> Result<UniqueConstraintId> {
        create(graph, self.defaults().data::<UniqueConstraintId>(name))
    }

    fn create_foreign_key(&self, graph: &mut ModelGraph, name: &str) -> Result<ForeignKeyId> {
        create(graph, self.defaults().data::<ForeignKeyId>(name))
    }
}

// =============================================================================
// Standard Factory
// =============================================================================

/// Factory with every `create_*` method at its default behaviour
#[derive(Debug, Clone, Default)]
pub struct StandardFactory {
    defaults: ElementDefaults,
}

impl StandardFactory {
    pub fn new(defaults: ElementDefaults) -> Self {
        Self { defaults }
    }
}

impl CoreFactory for StandardFactory {
    fn defaults(&self) -> &ElementDefaults {
        &self.defaults
    }
}

impl RelationalFactory for StandardFactory {}
