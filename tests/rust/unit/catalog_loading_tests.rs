//! Host catalog loading from YAML files

use std::io::Write;

use modelgraph::model_catalog::{
    DeclaredType, HostCatalogConfig, ModelCatalogError, PrimitiveKind, StructuralKind, Visibility,
};
use modelgraph::query_pipeline::{HostValue, QueryExpr};
use tempfile::NamedTempFile;

const TRIPPIN: &str = include_str!("../../../demos/trippin.yaml");

fn write_catalog(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_demo_catalog_from_file() {
    let file = write_catalog(TRIPPIN);
    let catalog = HostCatalogConfig::from_yaml_file(file.path()).unwrap();

    assert_eq!(catalog.name.as_deref(), Some("trippin"));
    assert_eq!(catalog.host_types.len(), 1);

    let host = &catalog.host_types[0];
    assert_eq!(host.namespace, "Trippin");
    let secrets = host.properties.iter().find(|p| p.name == "Secrets").unwrap();
    assert_eq!(secrets.visibility, Visibility::NonPublic);
    let flagship = host.properties.iter().find(|p| p.name == "Flagship").unwrap();
    assert!(flagship.is_static);

    let location = catalog
        .structural_types
        .iter()
        .find(|t| t.name == "Location")
        .unwrap();
    assert_eq!(location.kind, StructuralKind::Complex);

    let store = catalog.document_store.as_ref().unwrap();
    assert_eq!(store.database, "trippin");
    assert_eq!(store.collections["People"].len(), 3);
}

#[test]
fn test_host_values_deserialize_by_variant() {
    let catalog = HostCatalogConfig::from_yaml_str(TRIPPIN).unwrap();
    assert_eq!(
        catalog.host_values["People"],
        HostValue::Queryable(QueryExpr::stub("People"))
    );
    assert!(matches!(catalog.host_values["Me"], HostValue::Object(_)));
}

#[test]
fn test_host_values_survive_yaml_round_trip() {
    let catalog = HostCatalogConfig::from_yaml_str(TRIPPIN).unwrap();
    let yaml = serde_yaml::to_string(&catalog).unwrap();
    let reloaded = HostCatalogConfig::from_yaml_str(&yaml).unwrap();
    assert_eq!(reloaded.host_values, catalog.host_values);
}

#[test]
fn test_nested_host_query_in_map_form() {
    let yaml = r#"
host_types:
  - name: Api
    properties:
      - { name: People, type: "Queryable<Person>" }
structural_types:
  - name: Person
    properties:
      - { name: Id, type: Int32 }
host_values:
  People:
    queryable:
      project:
        input:
          source_stub: { name: People }
        fields: [Id]
"#;
    let catalog = HostCatalogConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(
        catalog.host_values["People"],
        HostValue::Queryable(QueryExpr::stub("People").project(["Id"]))
    );
}

#[test]
fn test_method_defaults() {
    let catalog = HostCatalogConfig::from_yaml_str(TRIPPIN).unwrap();
    let host = &catalog.host_types[0];

    let audit = host.methods.iter().find(|m| m.name == "Audit").unwrap();
    assert!(audit.operation.is_none());
    assert_eq!(audit.returns, DeclaredType::Primitive(PrimitiveKind::Int32));

    let reset = host.methods.iter().find(|m| m.name == "ResetDataSource").unwrap();
    assert!(reset.returns.is_void());
    assert!(reset.operation.as_ref().unwrap().has_side_effects);
}

#[test]
fn test_missing_file_is_read_error() {
    let err = HostCatalogConfig::from_yaml_file("/nonexistent/catalog.yaml").unwrap_err();
    assert!(matches!(err, ModelCatalogError::ConfigReadError { .. }));
    assert!(!err.is_fatal_reflection_error());
}

#[test]
fn test_duplicate_host_property_rejected() {
    let file = write_catalog(
        r#"
host_types:
  - name: Api
    properties:
      - { name: People, type: "Queryable<Person>" }
      - { name: People, type: "Queryable<Person>" }
"#,
    );
    assert_eq!(
        HostCatalogConfig::from_yaml_file(file.path()).unwrap_err(),
        ModelCatalogError::DuplicateDeclaration {
            name: "Api.People".to_string()
        }
    );
}

#[test]
fn test_invalid_type_name_rejected() {
    let yaml = r#"
host_types:
  - name: "Bad Name"
"#;
    assert!(matches!(
        HostCatalogConfig::from_yaml_str(yaml),
        Err(ModelCatalogError::InvalidConfig { .. })
    ));
}

#[test]
fn test_registry_from_catalog() {
    let catalog = HostCatalogConfig::from_yaml_str(TRIPPIN).unwrap();
    let registry = catalog.to_registry().unwrap();
    assert!(registry.host_type("TrippinApi").is_some());
    assert!(registry.structural_type("Trip").is_some());
    assert!(registry.enum_type("Feeling").is_some());
    assert_eq!(
        registry.host_lineage("TrippinApi", "ApiBase").unwrap(),
        vec!["TrippinApi".to_string()]
    );
}
