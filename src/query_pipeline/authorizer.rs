use std::collections::HashSet;

use super::context::QueryRewriteContext;

/// Allow/deny hook evaluated for every node with a model reference.
///
/// `None` declines and lets the next authorizer answer.
pub trait QueryExpressionAuthorizer: Send + Sync {
    fn authorize(&self, context: &QueryRewriteContext<'_>) -> Option<bool>;
}

/// Denies access to a fixed set of facets by name
#[derive(Debug, Clone, Default)]
pub struct FacetAccessAuthorizer {
    denied: HashSet<String>,
}

impl FacetAccessAuthorizer {
    pub fn deny<S: Into<String>>(facets: impl IntoIterator<Item = S>) -> Self {
        FacetAccessAuthorizer {
            denied: facets.into_iter().map(Into::into).collect(),
        }
    }
}

impl QueryExpressionAuthorizer for FacetAccessAuthorizer {
    fn authorize(&self, context: &QueryRewriteContext<'_>) -> Option<bool> {
        let facet = context.model_reference.facet_name()?;
        self.denied.contains(facet).then_some(false)
    }
}
