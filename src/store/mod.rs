//! Backing-store execution beyond the sourcer boundary.

pub mod document_store;
pub mod errors;
mod evaluate;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::query_pipeline::QueryExpr;

pub use document_store::{DocumentStore, DocumentStoreSourcer};
pub use errors::{StoreError, StoreResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub rows: Vec<Value>,
}

/// Executes a fully sourced query
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute_query(
        &self,
        query: &QueryExpr,
        cancel: &CancellationToken,
    ) -> StoreResult<QueryResult>;
}
