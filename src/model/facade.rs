//! Typed relation entry points.
//!
//! Thin wrappers over the generic mutators that pick the relation from the
//! method, take capability-typed handles, and enforce the domain rules the
//! generic layer leaves alone (no element describes, constrains, imports,
//! depends on or specializes itself).

use super::{
    Classifier, ConstraintId, DependencyId, DescriptionId, Feature, ForeignKeyId, Handle,
    ModelElement, Namespace, Package, StructuralFeature, UniqueKey,
};
use crate::error::{ModelError, Result};
use crate::graph::{ElementId, ElementKind, ModelGraph, RelationKind};

fn distinct(relation: RelationKind, a: ElementId, b: ElementId) -> Result<()> {
    if a == b {
        return Err(ModelError::constraint(
            relation,
            format!("{} cannot be related to itself", a),
        ));
    }
    Ok(())
}

impl ModelGraph {
    // ========== Namespace / ownedElement ==========

    pub fn add_owned_element(&mut self, namespace: impl Namespace, element: impl ModelElement) -> Result<bool> {
        self.add_related(namespace.id(), RelationKind::ElementOwnership, element.id())
    }

    pub fn remove_owned_element(&mut self, namespace: impl Namespace, element: impl ModelElement) -> Result<bool> {
        self.remove_related(namespace.id(), RelationKind::ElementOwnership, element.id())
    }

    /// Move `element` into `namespace`; returns the previous owner
    pub fn set_namespace(&mut self, element: impl ModelElement, namespace: impl Namespace) -> Result<Option<ElementId>> {
        self.set_owner(element.id(), RelationKind::ElementOwnership, Some(namespace.id()))
    }

    /// Detach `element` from its owner; returns the previous owner
    pub fn clear_namespace(&mut self, element: impl ModelElement) -> Result<Option<ElementId>> {
        self.set_owner(element.id(), RelationKind::ElementOwnership, None)
    }

    pub fn owned_elements(&self, namespace: impl Namespace) -> Vec<ElementId> {
        self.related(namespace.id(), RelationKind::ElementOwnership)
    }

    // ========== Classifier / feature ==========

    pub fn add_feature(&mut self, classifier: impl Classifier, feature: impl Feature) -> Result<bool> {
        self.add_related(classifier.id(), RelationKind::ClassifierFeature, feature.id())
    }

    pub fn insert_feature_at(
        &mut self,
        classifier: impl Classifier,
        feature: impl Feature,
        index: usize,
    ) -> Result<bool> {
        self.insert_related_at(classifier.id(), RelationKind::ClassifierFeature, feature.id(), index)
    }

    pub fn remove_feature(&mut self, classifier: impl Classifier, feature: impl Feature) -> Result<bool> {
        self.remove_related(classifier.id(), RelationKind::ClassifierFeature, feature.id())
    }

    /// Assign the owning classifier of `feature`; returns the previous owner
    pub fn set_feature_owner(&mut self, feature: impl Feature, classifier: impl Classifier) -> Result<Option<ElementId>> {
        self.set_owner(feature.id(), RelationKind::ClassifierFeature, Some(classifier.id()))
    }

    /// Own features of a classifier, in order
    pub fn features(&self, classifier: impl Classifier) -> Vec<ElementId> {
        self.related(classifier.id(), RelationKind::ClassifierFeature)
    }

    /// Own features of one handle type, in order (e.g. a table's columns)
    pub fn features_of<H: Handle>(&self, classifier: impl Classifier) -> Vec<H> {
        self.features(classifier)
            .into_iter()
            .filter_map(|id| H::cast(self, id))
            .collect()
    }

    // ========== Generalization ==========

    pub fn add_parent(&mut self, child: impl Classifier, parent: impl Classifier) -> Result<bool> {
        distinct(RelationKind::Generalization, child.id(), parent.id())?;
        self.add_related(child.id(), RelationKind::Generalization, parent.id())
    }

    pub fn remove_parent(&mut self, child: impl Classifier, parent: impl Classifier) -> Result<bool> {
        self.remove_related(child.id(), RelationKind::Generalization, parent.id())
    }

    // ========== Dependency ==========

    pub fn add_client(&mut self, dependency: DependencyId, client: impl ModelElement) -> Result<bool> {
        distinct(RelationKind::DependencyClient, dependency.id(), client.id())?;
        self.add_related(dependency.id(), RelationKind::DependencyClient, client.id())
    }

    pub fn remove_client(&mut self, dependency: DependencyId, client: impl ModelElement) -> Result<bool> {
        self.remove_related(dependency.id(), RelationKind::DependencyClient, client.id())
    }

    pub fn add_supplier(&mut self, dependency: DependencyId, supplier: impl ModelElement) -> Result<bool> {
        distinct(RelationKind::DependencySupplier, dependency.id(), supplier.id())?;
        self.add_related(dependency.id(), RelationKind::DependencySupplier, supplier.id())
    }

    pub fn remove_supplier(&mut self, dependency: DependencyId, supplier: impl ModelElement) -> Result<bool> {
        self.remove_related(dependency.id(), RelationKind::DependencySupplier, supplier.id())
    }

    // ========== Constraint / Description / Import ==========

    pub fn add_constrained_element(&mut self, constraint: ConstraintId, element: impl ModelElement) -> Result<bool> {
        distinct(RelationKind::ElementConstraint, constraint.id(), element.id())?;
        self.add_related(constraint.id(), RelationKind::ElementConstraint, element.id())
    }

    pub fn remove_constrained_element(&mut self, constraint: ConstraintId, element: impl ModelElement) -> Result<bool> {
        self.remove_related(constraint.id(), RelationKind::ElementConstraint, element.id())
    }

    pub fn add_described_element(&mut self, description: DescriptionId, element: impl ModelElement) -> Result<bool> {
        distinct(RelationKind::DescribedElement, description.id(), element.id())?;
        self.add_related(description.id(), RelationKind::DescribedElement, element.id())
    }

    pub fn remove_described_element(&mut self, description: DescriptionId, element: impl ModelElement) -> Result<bool> {
        self.remove_related(description.id(), RelationKind::DescribedElement, element.id())
    }

    pub fn add_imported_element(&mut self, package: impl Package, element: impl ModelElement) -> Result<bool> {
        distinct(RelationKind::ImportedElement, package.id(), element.id())?;
        self.add_related(package.id(), RelationKind::ImportedElement, element.id())
    }

    pub fn remove_imported_element(&mut self, package: impl Package, element: impl ModelElement) -> Result<bool> {
        self.remove_related(package.id(), RelationKind::ImportedElement, element.id())
    }

    // ========== Keys ==========

    pub fn add_unique_key_column(&mut self, key: impl UniqueKey, column: impl StructuralFeature) -> Result<bool> {
        self.add_related(key.id(), RelationKind::UniqueKeyFeature, column.id())
    }

    pub fn remove_unique_key_column(&mut self, key: impl UniqueKey, column: impl StructuralFeature) -> Result<bool> {
        self.remove_related(key.id(), RelationKind::UniqueKeyFeature, column.id())
    }

    pub fn add_foreign_key_column(&mut self, key: ForeignKeyId, column: impl StructuralFeature) -> Result<bool> {
        self.add_related(key.id(), RelationKind::ForeignKeyFeature, column.id())
    }

    pub fn remove_foreign_key_column(&mut self, key: ForeignKeyId, column: impl StructuralFeature) -> Result<bool> {
        self.remove_related(key.id(), RelationKind::ForeignKeyFeature, column.id())
    }

    /// Point a foreign key at the unique key it references; returns the
    /// previously referenced key
    pub fn set_referenced_key(&mut self, key: ForeignKeyId, referenced: impl UniqueKey) -> Result<Option<ElementId>> {
        self.set_target(key.id(), RelationKind::ForeignKeyUniqueKey, Some(referenced.id()))
    }

    pub fn referenced_key(&self, key: ForeignKeyId) -> Option<ElementId> {
        self.related(key.id(), RelationKind::ForeignKeyUniqueKey).into_iter().next()
    }

    /// Columns of a unique or foreign key, in key order
    pub fn key_columns(&self, key: impl ModelElement) -> Vec<ElementId> {
        match self.kind(key.id()) {
            Some(ElementKind::ForeignKey) => {
                self.related(key.id(), RelationKind::ForeignKeyFeature)
            }
            Some(_) => self.related(key.id(), RelationKind::UniqueKeyFeature),
            None => Vec::new(),
        }
    }

    // ========== Types ==========

    /// Set the type of a column or attribute; returns the previous type
    pub fn set_column_type(&mut self, feature: impl StructuralFeature, ty: impl Classifier) -> Result<Option<ElementId>> {
        self.set_target(feature.id(), RelationKind::StructuralFeatureType, Some(ty.id()))
    }

    pub fn column_type(&self, feature: impl StructuralFeature) -> Option<ElementId> {
        self.related(feature.id(), RelationKind::StructuralFeatureType).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ClassId, ColumnId, CoreFactory, RelationalFactory, StandardFactory, TableId,
    };

    #[test]
    fn test_self_parent_is_a_constraint_violation() {
        let factory = StandardFactory::default();
        let mut graph = ModelGraph::new();
        let class = factory.create_class(&mut graph, "Order").unwrap();

        let err = graph.add_parent(class, class).unwrap_err();
        assert!(matches!(
            err,
            ModelError::ConstraintViolation { relation: RelationKind::Generalization, .. }
        ));
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn test_self_description_is_a_constraint_violation() {
        let factory = StandardFactory::default();
        let mut graph = ModelGraph::new();
        let description = factory.create_description(&mut graph, "about itself").unwrap();

        let err = graph.add_described_element(description, description).unwrap_err();
        assert!(matches!(err, ModelError::ConstraintViolation { .. }));
    }

    #[test]
    fn test_self_import_is_a_constraint_violation() {
        let factory = StandardFactory::default();
        let mut graph = ModelGraph::new();
        let package = factory.create_package(&mut graph, "core").unwrap();

        let err = graph.add_imported_element(package, package).unwrap_err();
        assert!(matches!(err, ModelError::ConstraintViolation { .. }));
    }

    #[test]
    fn test_table_columns_and_types() {
        let factory = StandardFactory::default();
        let mut graph = ModelGraph::new();
        let schema = factory.create_schema(&mut graph, "sales").unwrap();
        let table = factory.create_table(&mut graph, "orders").unwrap();
        let id = factory.create_column(&mut graph, "id").unwrap();
        let total = factory.create_column(&mut graph, "total").unwrap();
        let int = factory.create_sql_data_type(&mut graph, "INTEGER", 4).unwrap();
        let decimal = factory.create_sql_data_type(&mut graph, "DECIMAL", 3).unwrap();

        graph.add_owned_element(schema, table).unwrap();
        graph.add_feature(table, total).unwrap();
        graph.insert_feature_at(table, id, 0).unwrap();
        assert_eq!(graph.set_column_type(id, int).unwrap(), None);
        graph.set_column_type(total, int).unwrap();
        assert_eq!(graph.set_column_type(total, decimal).unwrap(), Some(int.id()));

        let columns: Vec<ColumnId> = graph.features_of(table);
        assert_eq!(columns, vec![id, total]);
        assert_eq!(graph.column_type(total), Some(decimal.id()));
        assert_eq!(graph.path_name(total.id()).unwrap(), "sales.orders.total");
    }

    #[test]
    fn test_foreign_key_references_primary_key() {
        let factory = StandardFactory::default();
        let mut graph = ModelGraph::new();
        let customers = factory.create_table(&mut graph, "customers").unwrap();
        let orders = factory.create_table(&mut graph, "orders").unwrap();
        let customer_id = factory.create_column(&mut graph, "id").unwrap();
        let order_customer = factory.create_column(&mut graph, "customer_id").unwrap();
        graph.add_feature(customers, customer_id).unwrap();
        graph.add_feature(orders, order_customer).unwrap();

        let pk = factory.create_primary_key(&mut graph, "customers_pk").unwrap();
        graph.add_owned_element(customers, pk).unwrap();
        graph.add_unique_key_column(pk, customer_id).unwrap();

        let fk = factory.create_foreign_key(&mut graph, "orders_customer_fk").unwrap();
        graph.add_owned_element(orders, fk).unwrap();
        graph.add_foreign_key_column(fk, order_customer).unwrap();
        assert_eq!(graph.set_referenced_key(fk, pk).unwrap(), None);

        assert_eq!(graph.referenced_key(fk), Some(pk.id()));
        assert_eq!(graph.key_columns(fk), vec![order_customer.id()]);
        assert_eq!(graph.key_columns(pk), vec![customer_id.id()]);
        assert_eq!(
            graph.inverse_related(pk.id(), RelationKind::ForeignKeyUniqueKey),
            vec![fk.id()]
        );
    }

    #[test]
    fn test_set_namespace_moves_element() {
        let factory = StandardFactory::default();
        let mut graph = ModelGraph::new();
        let a = factory.create_package(&mut graph, "a").unwrap();
        let b = factory.create_package(&mut graph, "b").unwrap();
        let class: ClassId = factory.create_class(&mut graph, "C").unwrap();

        assert_eq!(graph.set_namespace(class, a).unwrap(), None);
        assert_eq!(graph.set_namespace(class, b).unwrap(), Some(a.id()));
        assert!(graph.owned_elements(a).is_empty());
        assert_eq!(graph.clear_namespace(class).unwrap(), Some(b.id()));
        assert!(graph.namespace_of(class.id()).is_none());
    }

    #[test]
    fn test_feature_owner_replaces_namespace_owner() {
        let factory = StandardFactory::default();
        let mut graph = ModelGraph::new();
        let schema = factory.create_schema(&mut graph, "s").unwrap();
        let table: TableId = factory.create_table(&mut graph, "t").unwrap();
        let column = factory.create_column(&mut graph, "c").unwrap();

        graph.add_owned_element(schema, column).unwrap();
        assert_eq!(graph.set_feature_owner(column, table).unwrap(), Some(schema.id()));
        assert_eq!(graph.owner(column.id()), Some((table.id(), RelationKind::ClassifierFeature)));
    }

    #[test]
    fn test_dependency_links_both_ends() {
        let factory = StandardFactory::default();
        let mut graph = ModelGraph::new();
        let view = factory.create_view(&mut graph, "recent_orders", "SELECT * FROM orders").unwrap();
        let table = factory.create_table(&mut graph, "orders").unwrap();
        let dependency = factory.create_dependency(&mut graph, view, table).unwrap();

        assert_eq!(graph.related(dependency.id(), RelationKind::DependencyClient), vec![view.id()]);
        assert_eq!(
            graph.inverse_related(table.id(), RelationKind::DependencySupplier),
            vec![dependency.id()]
        );
        assert!(matches!(
            graph.add_client(dependency, dependency),
            Err(ModelError::ConstraintViolation { .. })
        ));
    }
}
