use modelgraph::model_catalog::{DeclaredType, ModelCatalogError, PrimitiveKind};
use test_case::test_case;

#[test_case("Queryable<Person>", "Queryable<Person>" ; "queryable")]
#[test_case("IQueryable<Person>", "Queryable<Person>" ; "queryable alias")]
#[test_case("List<long>", "Collection<Int64>" ; "collection alias with primitive alias")]
#[test_case("Map<string,Person>", "Map<String, Person>" ; "generic")]
#[test_case("Trippin.Models.Person", "Trippin.Models.Person" ; "qualified reference")]
fn test_canonical_spelling(expression: &str, canonical: &str) {
    assert_eq!(DeclaredType::parse(expression).unwrap().to_string(), canonical);
}

#[test]
fn test_entity_set_shape_only_for_queryable_references() {
    let queryable = DeclaredType::parse("Queryable<Person>").unwrap();
    let collection = DeclaredType::parse("Collection<Person>").unwrap();
    let primitive_queryable = DeclaredType::parse("Queryable<Int32>").unwrap();

    assert_eq!(
        queryable.queryable_element().and_then(DeclaredType::reference_name),
        Some("Person")
    );
    assert!(collection.queryable_element().is_none());
    assert_eq!(
        collection.sequence_element(),
        Some(&DeclaredType::reference("Person"))
    );
    assert_eq!(
        primitive_queryable
            .queryable_element()
            .and_then(DeclaredType::reference_name),
        None
    );
}

#[test]
fn test_element_or_self() {
    let single = DeclaredType::Primitive(PrimitiveKind::Guid);
    assert_eq!(single.element_or_self(), &single);
    assert_eq!(
        DeclaredType::collection_of(single.clone()).element_or_self(),
        &single
    );
}

#[test]
fn test_invalid_expression_reports_input() {
    let err = DeclaredType::parse("Queryable<Person").unwrap_err();
    match err {
        ModelCatalogError::InvalidTypeExpression { expression, .. } => {
            assert_eq!(expression, "Queryable<Person")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_serde_uses_type_expression_strings() {
    let ty: DeclaredType = serde_json::from_str("\"Collection<Person>\"").unwrap();
    assert_eq!(ty, DeclaredType::collection_of(DeclaredType::reference("Person")));
    assert_eq!(serde_json::to_string(&ty).unwrap(), "\"Collection<Person>\"");
}
