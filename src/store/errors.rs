use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Query still contains unresolved data source `{name}`")]
    UnresolvedStub { name: String },
    #[error("Query targets database `{database}` which this store does not serve")]
    ForeignDatabase { database: String },
    #[error("Collection `{collection}` does not exist")]
    UnknownCollection { collection: String },
    #[error("Query execution was cancelled")]
    Cancelled,
}

pub type StoreResult<T> = Result<T, StoreError>;
