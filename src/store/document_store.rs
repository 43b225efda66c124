use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::errors::{StoreError, StoreResult};
use super::evaluate::evaluate;
use super::{QueryExecutor, QueryResult};
use crate::model_catalog::{DocumentStoreDefinition, FacetRef};
use crate::query_pipeline::{QueryExpr, QueryExpressionSourcer, QueryRewriteContext, SourceExpr};
use crate::submit::{
    ChangeOperation, ChangeSet, ChangeSetEntry, SubmitError, SubmitExecutor, SubmitOutcome,
    SubmitResult,
};

/// Sources entity-set stubs whose name is one of the store's collections.
///
/// Singletons and unknown names are declined so the convention sourcer can
/// answer them.
#[derive(Debug, Clone)]
pub struct DocumentStoreSourcer {
    database: String,
    collections: BTreeSet<String>,
}

impl DocumentStoreSourcer {
    pub fn new<S: Into<String>>(
        database: impl Into<String>,
        collections: impl IntoIterator<Item = S>,
    ) -> Self {
        DocumentStoreSourcer {
            database: database.into(),
            collections: collections.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_definition(definition: &DocumentStoreDefinition) -> Self {
        Self::new(definition.database.clone(), definition.collections.keys().cloned())
    }
}

impl QueryExpressionSourcer for DocumentStoreSourcer {
    fn source(&self, context: &QueryRewriteContext<'_>, _embedded: bool) -> Option<QueryExpr> {
        let FacetRef::EntitySet(name) = context.stub_facet()? else {
            return None;
        };
        if !self.collections.contains(name) {
            return None;
        }
        let element_type = context.query_context.mapper.resolve(name)?;
        Some(QueryExpr::Source(SourceExpr::OpenCollection {
            database: self.database.clone(),
            collection: name.clone(),
            element_type,
        }))
    }
}

/// In-memory JSON document store
#[derive(Debug)]
pub struct DocumentStore {
    database: String,
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl DocumentStore {
    pub fn new(database: impl Into<String>) -> Self {
        DocumentStore {
            database: database.into(),
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_definition(definition: &DocumentStoreDefinition) -> Self {
        let collections = definition
            .collections
            .iter()
            .map(|(name, documents)| (name.clone(), documents.clone()))
            .collect();
        DocumentStore {
            database: definition.database.clone(),
            collections: RwLock::new(collections),
        }
    }

    pub fn with_collection(mut self, name: impl Into<String>, documents: Vec<Value>) -> Self {
        self.collections.get_mut().insert(name.into(), documents);
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub async fn documents(&self, collection: &str) -> Option<Vec<Value>> {
        self.collections.read().await.get(collection).cloned()
    }
}

#[async_trait]
impl QueryExecutor for DocumentStore {
    async fn execute_query(
        &self,
        query: &QueryExpr,
        cancel: &CancellationToken,
    ) -> StoreResult<QueryResult> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let collections = self.collections.read().await;
        let rows = evaluate(query, &self.database, &collections)?;
        log::debug!("Query returned {} row(s)", rows.len());
        Ok(QueryResult { rows })
    }
}

#[async_trait]
impl SubmitExecutor for DocumentStore {
    /// Changes are applied to a staged copy which replaces the live
    /// collections only if the token is still live afterwards.
    async fn execute_submit(
        &self,
        change_set: &ChangeSet,
        cancel: &CancellationToken,
    ) -> SubmitResult<SubmitOutcome> {
        let mut collections = self.collections.write().await;
        let mut staged = collections.clone();
        for entry in change_set.entries() {
            if cancel.is_cancelled() {
                return Err(SubmitError::Cancelled);
            }
            apply(&mut staged, entry)?;
        }

        if cancel.is_cancelled() {
            log::info!("Submit cancelled, discarding {} staged change(s)", change_set.entries().len());
            return Err(SubmitError::Cancelled);
        }
        *collections = staged;
        Ok(SubmitOutcome {
            applied: change_set.entries().len(),
        })
    }
}

fn matches_key(document: &Value, key: &Map<String, Value>) -> bool {
    !key.is_empty() && key.iter().all(|(k, v)| document.get(k) == Some(v))
}

fn apply(collections: &mut HashMap<String, Vec<Value>>, entry: &ChangeSetEntry) -> SubmitResult<()> {
    let not_found = || SubmitError::NotFound {
        entity_set: entry.entity_set.clone(),
        key: entry.key_display(),
    };
    match entry.operation {
        ChangeOperation::Insert => {
            let mut document = entry.values.clone();
            for (k, v) in &entry.key {
                document.insert(k.clone(), v.clone());
            }
            let documents = collections.entry(entry.entity_set.clone()).or_default();
            if documents.iter().any(|d| matches_key(d, &entry.key)) {
                return Err(SubmitError::Conflict {
                    entity_set: entry.entity_set.clone(),
                    key: entry.key_display(),
                });
            }
            documents.push(Value::Object(document));
        }
        ChangeOperation::Update => {
            let document = collections
                .get_mut(&entry.entity_set)
                .and_then(|docs| docs.iter_mut().find(|d| matches_key(d, &entry.key)))
                .ok_or_else(not_found)?;
            if let Value::Object(fields) = document {
                for (k, v) in &entry.values {
                    fields.insert(k.clone(), v.clone());
                }
            }
        }
        ChangeOperation::Delete => {
            let documents = collections.get_mut(&entry.entity_set).ok_or_else(not_found)?;
            let before = documents.len();
            documents.retain(|d| !matches_key(d, &entry.key));
            if documents.len() == before {
                return Err(not_found());
            }
        }
    }
    Ok(())
}
