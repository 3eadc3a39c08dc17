//! Loading model documents from disk.

use std::fs;
use std::path::PathBuf;

use cwm_model::graph::{self, Detail, DiagnosticCode, GraphOptions, ModelSnapshot, NamingOptions};
use cwm_model::model::ModelElement;
use cwm_model::{ElementKind, ModelGraph, RelationKind, StandardFactory};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/warehouse.json")
}

fn load_warehouse() -> graph::LoadedModel {
    let factory = StandardFactory::default();
    graph::load_from_file(&fixture(), &factory, GraphOptions::default()).unwrap()
}

#[test]
fn test_warehouse_fixture_loads_cleanly() {
    let loaded = load_warehouse();
    let model = &loaded.graph;

    assert_eq!(loaded.document_count, 1);
    assert_eq!(loaded.types.len(), 4);
    assert_eq!(model.elements_of_kind(ElementKind::Table).len(), 3);
    assert_eq!(model.elements_of_kind(ElementKind::View).len(), 1);

    let diagnostics = graph::validate(model);
    assert!(!diagnostics.has_errors(), "{}", diagnostics.format_all());
}

#[test]
fn test_qualified_names_follow_catalog_schema_table() {
    let loaded = load_warehouse();
    let model = &loaded.graph;

    let placed_on = model.resolve_path("dw.sales.orders.placed_on", ".").unwrap();
    assert_eq!(model.path_name(placed_on).unwrap(), "dw.sales.orders.placed_on");

    let date = loaded.types["DATE"];
    assert_eq!(
        model.related(placed_on, RelationKind::StructuralFeatureType),
        vec![date.id()]
    );
}

#[test]
fn test_foreign_keys_resolve_primary_and_named_keys() {
    let loaded = load_warehouse();
    let model = &loaded.graph;

    let orders_fk = model.find_by_name("orders_customer_fk")[0];
    let customers_pk = model.find_by_name("customers_pk")[0];
    assert_eq!(
        model.related(orders_fk, RelationKind::ForeignKeyUniqueKey),
        vec![customers_pk]
    );

    let contacts_fk = model.find_by_name("contacts_email_fk")[0];
    let email_uq = model.find_by_name("customers_email_uq")[0];
    assert_eq!(
        model.related(contacts_fk, RelationKind::ForeignKeyUniqueKey),
        vec![email_uq]
    );
    assert_eq!(model.inverse_related(email_uq, RelationKind::ForeignKeyUniqueKey), vec![contacts_fk]);
}

#[test]
fn test_column_details_and_descriptions() {
    let loaded = load_warehouse();
    let model = &loaded.graph;

    let total = model.resolve_path("dw.sales.orders.total", ".").unwrap();
    let Detail::Column(detail) = &model.get(total).unwrap().detail else {
        panic!("column detail expected");
    };
    assert_eq!(detail.precision, Some(12));
    assert_eq!(detail.scale, Some(2));
    assert_eq!(detail.initial_value.as_deref(), Some("0"));
    assert!(detail.is_nullable);

    let customers = model.resolve_path("dw.sales.customers", ".").unwrap();
    let descriptions = model.inverse_related(customers, RelationKind::DescribedElement);
    assert_eq!(descriptions.len(), 1);

    let contacts = model.resolve_path("dw.sales.contacts", ".").unwrap();
    let Detail::Table(table) = &model.get(contacts).unwrap().detail else {
        panic!("table detail expected");
    };
    assert!(table.is_temporary);
}

#[test]
fn test_view_depends_on_table() {
    let loaded = load_warehouse();
    let model = &loaded.graph;

    let view = model.resolve_path("dw.reporting.recent_orders", ".").unwrap();
    let orders = model.resolve_path("dw.sales.orders", ".").unwrap();

    let dependency = model.inverse_related(view, RelationKind::DependencyClient)[0];
    assert_eq!(model.related(dependency, RelationKind::DependencySupplier), vec![orders]);
}

#[test]
fn test_directory_load_resolves_across_documents() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("01_types.json"),
        r#"{ "types": [{ "name": "INTEGER", "type_number": 4 }] }"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("02_sales.json"),
        r#"{
            "catalogs": [{
                "name": "dw",
                "schemas": [{
                    "name": "sales",
                    "tables": [{
                        "name": "orders",
                        "columns": [{ "name": "customer_id", "type": "INTEGER" }],
                        "foreign_keys": [{
                            "name": "orders_customer_fk",
                            "columns": ["customer_id"],
                            "references": { "table": "master.crm.customers" }
                        }]
                    }]
                }]
            }]
        }"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("03_crm.json"),
        r#"{
            "catalogs": [{
                "name": "master",
                "schemas": [{
                    "name": "crm",
                    "tables": [{
                        "name": "customers",
                        "columns": [{ "name": "id", "type": "INTEGER", "nullable": false }],
                        "primary_key": { "name": "customers_pk", "columns": ["id"] }
                    }]
                }]
            }]
        }"#,
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let factory = StandardFactory::default();
    let loaded = graph::load_from_directory(dir.path(), &factory, GraphOptions::default()).unwrap();
    let model = &loaded.graph;

    assert_eq!(loaded.document_count, 3);
    assert_eq!(loaded.catalogs.len(), 2);

    let fk = model.find_by_name("orders_customer_fk")[0];
    let pk = model.resolve_path("master.crm.customers.customers_pk", ".").unwrap();
    assert_eq!(model.related(fk, RelationKind::ForeignKeyUniqueKey), vec![pk]);

    let again = graph::load_from_directory(dir.path(), &factory, GraphOptions::default()).unwrap();
    assert_eq!(again.bundle_hash, loaded.bundle_hash);

    fs::write(
        dir.path().join("01_types.json"),
        r#"{ "types": [{ "name": "INTEGER", "type_number": 5 }] }"#,
    )
    .unwrap();
    let changed = graph::load_from_directory(dir.path(), &factory, GraphOptions::default()).unwrap();
    assert_ne!(changed.bundle_hash, loaded.bundle_hash);
}

#[test]
fn test_unresolved_table_names_the_reference() {
    let doc = r#"{
        "catalogs": [{
            "name": "dw",
            "schemas": [{
                "name": "sales",
                "views": [{ "name": "v", "query": "SELECT 1", "depends_on": ["missing"] }]
            }]
        }]
    }"#;
    let factory = StandardFactory::default();

    let err = graph::load_from_str(doc, &factory, GraphOptions::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("missing"));
}

#[test]
fn test_configured_separator_applies_to_loaded_names() {
    let options = GraphOptions {
        naming: NamingOptions {
            separator: "/".to_string(),
            surround: None,
        },
        ..GraphOptions::default()
    };
    let factory = StandardFactory::default();
    let loaded = graph::load_from_file(&fixture(), &factory, options).unwrap();
    let model = &loaded.graph;

    let orders = model.find_by_name("orders")[0];
    assert_eq!(model.path_name(orders).unwrap(), "dw/sales/orders");
}

#[test]
fn test_snapshot_round_trip_keeps_links() {
    let loaded = load_warehouse();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");

    loaded.graph.snapshot().save(&path).unwrap();
    let restored =
        ModelGraph::from_snapshot(&ModelSnapshot::load(&path).unwrap(), GraphOptions::default())
            .unwrap();

    assert_eq!(restored.element_count(), loaded.graph.element_count());
    assert_eq!(restored.link_count(), loaded.graph.link_count());

    let fk = restored.find_by_name("orders_customer_fk")[0];
    let pk = restored.find_by_name("customers_pk")[0];
    assert_eq!(restored.related(fk, RelationKind::ForeignKeyUniqueKey), vec![pk]);
    let diagnostics = graph::validate(&restored);
    assert_eq!(diagnostics.with_code(DiagnosticCode::MissingRequiredLink).count(), 0);
}
