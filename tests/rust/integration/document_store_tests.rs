//! End-to-end execution and submit against the in-memory document store

#[cfg(test)]
mod document_store_integration_tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use modelgraph::conventions::ModelMapperChain;
    use modelgraph::query_pipeline::{
        InMemoryHost, QueryContext, QueryExpr, QueryExpressionPipeline, ScalarExpr,
    };
    use modelgraph::store::{DocumentStore, DocumentStoreSourcer, QueryExecutor, StoreError};
    use modelgraph::submit::{submit, ChangeSet, ChangeSetInitializer, SubmitError, SubmitResult};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    use crate::fixtures::{assemble, ignoring, trippin};

    const PEOPLE_QUERY: &str = include_str!("../../../demos/people_query.json");

    #[tokio::test]
    async fn test_demo_query_end_to_end() {
        let (catalog, registry) = trippin();
        let assembled = assemble(&catalog, registry, "TrippinApi", &ignoring(&["Invisible"])).await;
        let definition = catalog.document_store.as_ref().unwrap();

        let pipeline = QueryExpressionPipeline::new()
            .with_sourcer(Arc::new(DocumentStoreSourcer::from_definition(definition)))
            .with_conventions(assembled.catalog.clone());
        let context = QueryContext::new(
            assembled.model.clone(),
            Arc::new(ModelMapperChain::new().with_conventions(assembled.catalog.clone())),
        )
        .with_host(Arc::new(InMemoryHost::new(vec!["TrippinApi".to_string()])));

        let query: QueryExpr = serde_json::from_str(PEOPLE_QUERY).unwrap();
        let rewritten = pipeline.compose(&query, &context).unwrap();
        let result = DocumentStore::from_definition(definition)
            .execute_query(&rewritten, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            result.rows,
            vec![
                json!({"UserName": "russellwhyte", "Age": 34}),
                json!({"UserName": "ronaldmundy", "Age": 41}),
            ]
        );
    }

    #[tokio::test]
    async fn test_unrewritten_query_is_rejected_by_store() {
        let store = DocumentStore::new("trippin");
        let err = store
            .execute_query(&QueryExpr::stub("People"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::UnresolvedStub {
                name: "People".to_string()
            }
        );
    }

    struct StampInitializer;

    #[async_trait]
    impl ChangeSetInitializer for StampInitializer {
        async fn initialize(
            &self,
            change_set: &mut ChangeSet,
            _cancel: &CancellationToken,
        ) -> SubmitResult<()> {
            let mut stamped = ChangeSet::new();
            for entry in change_set.entries() {
                let mut entry = entry.clone();
                entry.values.insert("Audited".to_string(), json!(true));
                stamped.push(entry);
            }
            *change_set = stamped;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_submit_validates_initializes_and_commits() {
        let (catalog, registry) = trippin();
        let assembled = assemble(&catalog, registry, "TrippinApi", &ignoring(&["Invisible"])).await;
        let store = DocumentStore::from_definition(catalog.document_store.as_ref().unwrap());

        let change_set = ChangeSet::new()
            .insert("People", json!({"PersonId": 4, "UserName": "keithpinckney"}))
            .update("Airlines", json!({"AirlineCode": "FM"}), json!({"Name": "China Eastern"}));
        let outcome = submit(
            &assembled.model,
            change_set,
            Some(&StampInitializer),
            &store,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.applied, 2);

        let people = store.documents("People").await.unwrap();
        assert_eq!(people.len(), 4);
        assert_eq!(people[3]["Audited"], json!(true));
        let airlines = store.documents("Airlines").await.unwrap();
        assert_eq!(airlines[1]["Name"], json!("China Eastern"));
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_change_sets() {
        let (catalog, registry) = trippin();
        let assembled = assemble(&catalog, registry, "TrippinApi", &ignoring(&["Invisible"])).await;
        let store = DocumentStore::from_definition(catalog.document_store.as_ref().unwrap());
        let cancel = CancellationToken::new();

        let missing_key = ChangeSet::new().delete("People", json!({"UserName": "russellwhyte"}));
        assert_eq!(
            submit(&assembled.model, missing_key, None, &store, &cancel).await,
            Err(SubmitError::MissingKey {
                entity_set: "People".to_string(),
                key: "PersonId".to_string(),
            })
        );

        let unknown = ChangeSet::new().insert("Invisible", json!({"PersonId": 9}));
        assert!(matches!(
            submit(&assembled.model, unknown, None, &store, &cancel).await,
            Err(SubmitError::UnknownEntitySet { .. })
        ));
        assert_eq!(store.documents("People").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_insert_with_existing_key_conflicts() {
        let (catalog, registry) = trippin();
        let assembled = assemble(&catalog, registry, "TrippinApi", &ignoring(&["Invisible"])).await;
        let store = DocumentStore::from_definition(catalog.document_store.as_ref().unwrap());

        let duplicate = ChangeSet::new().insert("People", json!({"PersonId": 1, "UserName": "imposter"}));
        assert!(matches!(
            submit(&assembled.model, duplicate, None, &store, &CancellationToken::new()).await,
            Err(SubmitError::Conflict { .. })
        ));
        assert_eq!(store.documents("People").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_submit_commits_nothing() {
        let (catalog, registry) = trippin();
        let assembled = assemble(&catalog, registry, "TrippinApi", &ignoring(&["Invisible"])).await;
        let store = DocumentStore::from_definition(catalog.document_store.as_ref().unwrap());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let change_set = ChangeSet::new().delete("People", json!({"PersonId": 1}));
        assert_eq!(
            submit(&assembled.model, change_set, None, &store, &cancel).await,
            Err(SubmitError::Cancelled)
        );
        assert_eq!(store.documents("People").await.unwrap().len(), 3);
    }
}
