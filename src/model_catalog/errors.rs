//! # Model Catalog Error Types
//!
//! Errors raised while loading a host catalog or assembling a model.
//!
//! ## Error Categories
//!
//! - **Reflection Errors**: the declared host surface cannot be walked
//!   (missing host type, missing base type, inheritance cycle). These are
//!   fatal at startup and abort model assembly.
//! - **Declaration Errors**: malformed type expressions or duplicate names
//!   in a host catalog.
//! - **Configuration Errors**: file I/O and parsing issues during catalog
//!   loading.
//!
//! Unresolved elements (unregistered facet types, ambiguous navigation
//! targets, unresolved operation returns) are NOT errors; they are omitted
//! from the model.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelCatalogError {
    #[error("Host type `{host_type}` is not declared in the host catalog")]
    HostTypeNotFound { host_type: String },
    #[error("Base type `{base_type}` of host type `{host_type}` is not declared")]
    BaseTypeNotFound { host_type: String, base_type: String },
    #[error("Inheritance cycle detected while walking `{host_type}` (revisited `{revisited}`)")]
    InheritanceCycle { host_type: String, revisited: String },
    #[error("Invalid type expression `{expression}`: {reason}")]
    InvalidTypeExpression { expression: String, reason: String },
    #[error("Duplicate declaration of `{name}` in host catalog")]
    DuplicateDeclaration { name: String },
    #[error("Failed to read host catalog: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse host catalog: {error}")]
    ConfigParseError { error: String },
    #[error("Invalid host catalog: {message}")]
    InvalidConfig { message: String },
    #[error("Model provider `{provider}` failed: {message}")]
    Provider { provider: String, message: String },
    #[error("Model assembly was cancelled")]
    Cancelled,
}

impl ModelCatalogError {
    /// Whether this error must abort service initialization
    pub fn is_fatal_reflection_error(&self) -> bool {
        matches!(
            self,
            ModelCatalogError::HostTypeNotFound { .. }
                | ModelCatalogError::BaseTypeNotFound { .. }
                | ModelCatalogError::InheritanceCycle { .. }
        )
    }
}

pub type ModelCatalogResult<T> = Result<T, ModelCatalogError>;
