use std::sync::Arc;

use super::catalog::ConventionCatalog;
use crate::chain::HandlerChain;

/// Resolves a symbolic facet name to its backing type name
pub trait ModelMapper: Send + Sync {
    fn resolve(&self, _name: &str) -> Option<String> {
        None
    }

    fn resolve_qualified(&self, _namespace: &str, _name: &str) -> Option<String> {
        None
    }
}

/// Inner mappers first, convention mapper last
#[derive(Debug, Clone, Default)]
pub struct ModelMapperChain {
    mappers: HandlerChain<dyn ModelMapper>,
}

impl ModelMapperChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapper(mut self, mapper: Arc<dyn ModelMapper>) -> Self {
        self.mappers.push(mapper);
        self
    }

    pub fn with_conventions(mut self, catalog: Arc<ConventionCatalog>) -> Self {
        self.mappers
            .push_fallback(Arc::new(ConventionModelMapper::new(catalog)));
        self
    }

    pub fn resolve(&self, name: &str) -> Option<String> {
        self.mappers.first_answer(|m| m.resolve(name))
    }

    pub fn resolve_qualified(&self, namespace: &str, name: &str) -> Option<String> {
        self.mappers
            .first_answer(|m| m.resolve_qualified(namespace, name))
    }
}

/// Answers unqualified names from the scanned facet properties
pub struct ConventionModelMapper {
    catalog: Arc<ConventionCatalog>,
}

impl ConventionModelMapper {
    pub fn new(catalog: Arc<ConventionCatalog>) -> Self {
        ConventionModelMapper { catalog }
    }
}

impl ModelMapper for ConventionModelMapper {
    fn resolve(&self, name: &str) -> Option<String> {
        self.catalog.element_type_of(name).map(str::to_string)
    }
}
