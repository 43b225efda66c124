//! Model assembly over host catalogs

#[cfg(test)]
mod model_assembly_integration_tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use modelgraph::config::EngineConfig;
    use modelgraph::conventions::{ModelAssembler, ModelContext, ModelProvider};
    use modelgraph::model_catalog::{
        DeclaredType, FacetOrigin, FacetRef, FacetRegistration, Model, ModelBuilder,
        ModelCatalogError, ModelCatalogResult, OperationBinding, OperationKind, PrimitiveKind,
        ReturnShape,
    };
    use tokio_util::sync::CancellationToken;

    use crate::fixtures::{assemble, catalog, ignoring, trippin};

    fn binding_target(model: &Model, source: &str, property: &str) -> Option<FacetRef> {
        model
            .navigation_bindings()
            .iter()
            .find(|b| b.source.name() == source && b.navigation_property == property)
            .map(|b| b.target.clone())
    }

    #[tokio::test]
    async fn test_ignored_property_is_not_a_facet() {
        let (catalog, registry) = catalog(
            r#"
host_types:
  - name: Api
    base: ApiBase
    properties:
      - { name: People, type: "Queryable<Person>" }
      - { name: Invisible, type: "Queryable<Person>" }
structural_types:
  - name: Person
    keys: [Id]
    properties:
      - { name: Id, type: Int32 }
model:
  types: [Person]
"#,
        );
        let assembled = assemble(&catalog, registry, "Api", &ignoring(&["Invisible"])).await;
        let model = &assembled.model;

        assert_eq!(model.container_element_names(), vec!["People"]);
        assert!(model.find_facet("Invisible").is_none());
        assert!(assembled.catalog.entity_set_property("Invisible").is_none());
    }

    #[tokio::test]
    async fn test_trippin_facets() {
        let (catalog, registry) = trippin();
        let assembled = assemble(&catalog, registry, "TrippinApi", &ignoring(&["Invisible"])).await;
        let model = &assembled.model;

        assert_eq!(
            model.container_element_names(),
            vec!["People", "Airlines", "Airports", "Me", "Flagship"]
        );
        assert_eq!(model.container_name(), "Container");
        assert_eq!(model.namespace(), "Trippin");
        assert_eq!(model.find_entity_set("People").unwrap().origin, FacetOrigin::Instance);
        assert_eq!(model.find_singleton("Flagship").unwrap().origin, FacetOrigin::Static);
        // primitive and non-public host properties never become facets
        assert!(model.find_facet("RequestCount").is_none());
        assert!(model.find_facet("Secrets").is_none());

        let flagship = assembled.catalog.singleton_property("Flagship").unwrap();
        assert!(flagship.is_static);
        assert_eq!(flagship.element_type, "Airline");
    }

    #[tokio::test]
    async fn test_trippin_types_and_keys() {
        let (catalog, registry) = trippin();
        let assembled = assemble(&catalog, registry, "TrippinApi", &EngineConfig::default()).await;
        let model = &assembled.model;

        let names: Vec<&str> = model.types().iter().map(|t| t.name.as_str()).collect();
        for expected in ["Person", "Airline", "Airport", "Trip", "Location"] {
            assert!(names.contains(&expected), "missing type {expected}");
        }
        assert_eq!(model.find_type("Person").unwrap().keys, vec!["PersonId"]);
        assert_eq!(model.find_type("Trip").unwrap().keys, vec!["TripId"]);
        assert_eq!(model.find_type("Airline").unwrap().keys, vec!["AirlineCode"]);
        assert!(model.find_type("Location").unwrap().keys.is_empty());
        assert_eq!(
            model.find_enum_type("Feeling").unwrap().members,
            vec!["Happy", "Sad", "Indifferent"]
        );
        assert_eq!(
            model.find_type("Person").unwrap().full_name(),
            "Trippin.Models.Person"
        );
    }

    #[tokio::test]
    async fn test_navigation_binding_requires_single_candidate() {
        let (catalog, registry) = trippin();

        // People and Invisible both hold Person
        let ambiguous =
            assemble(&catalog, registry.clone(), "TrippinApi", &EngineConfig::default()).await;
        assert_eq!(binding_target(&ambiguous.model, "People", "Friends"), None);

        let assembled = assemble(&catalog, registry, "TrippinApi", &ignoring(&["Invisible"])).await;
        let model = &assembled.model;
        assert_eq!(
            binding_target(model, "People", "Friends"),
            Some(FacetRef::EntitySet("People".to_string()))
        );
        assert_eq!(
            binding_target(model, "People", "BestFriend"),
            Some(FacetRef::EntitySet("People".to_string()))
        );
        assert_eq!(
            binding_target(model, "Me", "Friends"),
            Some(FacetRef::EntitySet("People".to_string()))
        );
        // no entity set holds Trip
        assert_eq!(binding_target(model, "People", "Trips"), None);
        assert_eq!(
            model
                .find_navigation_property("Person", "Friends")
                .map(|p| p.is_collection),
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_operation_classification() {
        let (catalog, registry) = trippin();
        let assembled = assemble(&catalog, registry, "TrippinApi", &ignoring(&["Invisible"])).await;
        let model = &assembled.model;

        let most_friends = model.find_operations("GetPersonWithMostFriends")[0];
        assert_eq!(most_friends.kind, OperationKind::Function);
        assert_eq!(most_friends.binding, OperationBinding::Unbound);
        assert_eq!(most_friends.namespace, "Trippin");
        assert_eq!(
            most_friends.return_shape,
            Some(ReturnShape::Entity {
                entity_type: "Person".to_string(),
                entity_set: "People".to_string(),
            })
        );

        let nearest = model.find_operations("GetNearestAirport")[0];
        assert_eq!(nearest.parameters.len(), 2);
        assert_eq!(
            nearest.parameters[0].ty,
            DeclaredType::Primitive(PrimitiveKind::Double)
        );
        assert_eq!(
            nearest.return_shape,
            Some(ReturnShape::Entity {
                entity_type: "Airport".to_string(),
                entity_set: "Airports".to_string(),
            })
        );

        let favorite = model.find_operations("GetFavoriteAirline")[0];
        assert_eq!(favorite.binding, OperationBinding::Entity("Person".to_string()));
        assert!(favorite.is_composable);
        assert!(favorite.parameters.is_empty());

        let trips = model.find_operations("GetFriendsTrips")[0];
        assert_eq!(trips.parameters[0].name, "userNames");
        assert!(trips.parameters[0].is_collection);
        assert_eq!(
            trips.parameters[0].ty,
            DeclaredType::Primitive(PrimitiveKind::String)
        );
        // Trip has no entity set
        assert_eq!(trips.return_shape, None);

        let reset = model.find_operations("ResetDataSource")[0];
        assert_eq!(reset.kind, OperationKind::Action);
        assert!(!reset.is_composable);
        assert_eq!(reset.return_shape, None);

        assert!(model.find_operations("Audit").is_empty());
    }

    #[tokio::test]
    async fn test_namespace_override_keeps_facet_names() {
        let (catalog, registry) = trippin();
        let config = EngineConfig {
            namespace: Some("Sample".to_string()),
            ..ignoring(&["Invisible"])
        };
        let baseline = assemble(&catalog, registry.clone(), "TrippinApi", &ignoring(&["Invisible"])).await;
        let assembled = assemble(&catalog, registry, "TrippinApi", &config).await;
        let model = &assembled.model;

        assert_eq!(model.namespace(), "Sample");
        assert!(model.types().iter().all(|t| t.namespace == "Sample"));
        assert!(model.enum_types().iter().all(|t| t.namespace == "Sample"));
        assert!(model.operations().iter().all(|o| o.namespace == "Sample"));
        assert_eq!(
            model.container_element_names(),
            baseline.model.container_element_names()
        );
        assert_eq!(model.navigation_bindings(), baseline.model.navigation_bindings());
    }

    #[tokio::test]
    async fn test_most_derived_declaration_wins() {
        let yaml = r#"
host_types:
  - name: Level1
    base: ApiBase
    properties:
      - { name: People, type: "Queryable<Person>" }
      - { name: Orders, type: "Queryable<Order>" }
  - name: Level2
    base: Level1
    properties:
      - { name: People, type: "Queryable<Order>" }
  - name: Level3
    base: Level2
    properties:
      - { name: People, type: Int32 }
structural_types:
  - name: Person
    keys: [Id]
  - name: Order
    keys: [Id]
model:
  types: [Person, Order]
"#;
        let (catalog, registry) = catalog(yaml);

        let level2 = assemble(&catalog, registry.clone(), "Level2", &EngineConfig::default()).await;
        assert_eq!(level2.model.find_entity_set("People").unwrap().element_type, "Order");
        assert_eq!(level2.model.container_element_names(), vec!["People", "Orders"]);

        // the primitive redeclaration hides the base queryable entirely
        let level3 = assemble(&catalog, registry, "Level3", &EngineConfig::default()).await;
        assert!(level3.model.find_facet("People").is_none());
        assert_eq!(level3.model.container_element_names(), vec!["Orders"]);
    }

    #[tokio::test]
    async fn test_registered_facet_is_not_replaced() {
        let (mut catalog, registry) = trippin();
        catalog.model.entity_sets.push(FacetRegistration {
            name: "People".to_string(),
            type_name: "Airline".to_string(),
        });
        let assembled = assemble(&catalog, registry, "TrippinApi", &ignoring(&["Invisible"])).await;

        let people = assembled.model.find_entity_set("People").unwrap();
        assert_eq!(people.element_type, "Airline");
        assert_eq!(people.origin, FacetOrigin::Registered);
        assert!(assembled.catalog.entity_set_property("People").is_none());
    }

    struct FixedProvider {
        empty: bool,
    }

    #[async_trait]
    impl ModelProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn get_model(
            &self,
            context: &ModelContext<'_>,
            _cancel: &CancellationToken,
        ) -> ModelCatalogResult<Option<Model>> {
            if self.empty {
                return Ok(Some(Model::empty("Provided", "Container")));
            }
            let mut builder = ModelBuilder::new(context.registry, "Provided", "Container");
            builder.add_structural_type("Person");
            builder.add_entity_set("People", "Person", FacetOrigin::Registered);
            Ok(Some(builder.build()))
        }
    }

    #[tokio::test]
    async fn test_provider_model_short_circuits() {
        let (_, registry) = trippin();
        let assembled = ModelAssembler::new(registry)
            .with_provider(Arc::new(FixedProvider { empty: false }))
            .assemble("TrippinApi", &EngineConfig::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(assembled.model.namespace(), "Provided");
        assert_eq!(assembled.model.container_element_names(), vec!["People"]);
        assert!(assembled.model.operations().is_empty());
        assert!(assembled.catalog.entity_set_property("People").is_some());
        assert!(assembled.catalog.singleton_property("Me").is_none());
    }

    #[tokio::test]
    async fn test_empty_provider_model_falls_through() {
        let (catalog, registry) = trippin();
        let assembled = ModelAssembler::new(registry)
            .with_provider(Arc::new(FixedProvider { empty: true }))
            .with_extender(Arc::new(
                modelgraph::conventions::RegisteredModelExtender::new(catalog.model.clone()),
            ))
            .assemble("TrippinApi", &EngineConfig::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(assembled.model.namespace(), "Trippin");
        assert!(!assembled.model.operations().is_empty());
    }

    #[tokio::test]
    async fn test_assembly_is_deterministic_and_serializable() {
        let (catalog, registry) = trippin();
        let config = ignoring(&["Invisible"]);
        let first = assemble(&catalog, registry.clone(), "TrippinApi", &config).await;
        let second = assemble(&catalog, registry, "TrippinApi", &config).await;
        assert_eq!(first.model, second.model);
        assert_eq!(first.catalog, second.catalog);

        let json = serde_json::to_string(first.model.as_ref()).unwrap();
        let restored: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(&restored, first.model.as_ref());
    }

    #[tokio::test]
    async fn test_undeclared_base_is_fatal() {
        let (catalog, registry) = catalog(
            r#"
host_types:
  - name: Api
    base: MissingBase
"#,
        );
        let err = ModelAssembler::new(registry)
            .with_extender(Arc::new(
                modelgraph::conventions::RegisteredModelExtender::new(catalog.model.clone()),
            ))
            .assemble("Api", &EngineConfig::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ModelCatalogError::BaseTypeNotFound {
                host_type: "Api".to_string(),
                base_type: "MissingBase".to_string(),
            }
        );
        assert!(err.is_fatal_reflection_error());
    }
}
