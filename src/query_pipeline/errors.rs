use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryPipelineError {
    #[error("Access to {element} was denied")]
    AccessDenied { element: String },
    #[error("No sourcer could resolve data source `{name}`")]
    UnresolvedSource { name: String },
}

pub type QueryPipelineResult<T> = Result<T, QueryPipelineError>;
