//! Query expression pipeline.
//!
//! Rewrites a [`QueryExpr`] top-down, replacing each source stub with a
//! concrete backing-store expression. Three ordered handler chains share a
//! [`QueryRewriteContext`]:
//!
//! - authorizers are asked about every node that has a model reference;
//!   an explicit deny aborts the rewrite with `AccessDenied`
//! - expanders may replace a stub with a materialized sub-query, which is
//!   itself rewritten
//! - sourcers resolve whatever stub is left; a stub nobody sources is an
//!   `UnresolvedSource` error
//!
//! Host-specific handlers run before the convention fallbacks registered
//! by [`QueryExpressionPipeline::with_conventions`].

pub mod ast;
pub mod authorizer;
pub mod context;
pub mod errors;
pub mod expander;
mod rewriter;
pub mod sourcer;
pub mod transformed;

use std::sync::Arc;

pub use ast::{CompareOp, QueryExpr, ScalarExpr, SourceExpr};
pub use authorizer::{FacetAccessAuthorizer, QueryExpressionAuthorizer};
pub use context::{
    HostInstance, HostValue, InMemoryHost, ModelReference, QueryContext, QueryRewriteContext,
};
pub use errors::{QueryPipelineError, QueryPipelineResult};
pub use expander::{ConventionExpander, QueryExpressionExpander};
pub use sourcer::{ConventionSourcer, QueryExpressionSourcer};
pub use transformed::Transformed;

use crate::chain::HandlerChain;
use crate::conventions::ConventionCatalog;
use rewriter::Rewriter;

#[derive(Debug, Clone, Default)]
pub struct QueryExpressionPipeline {
    authorizers: HandlerChain<dyn QueryExpressionAuthorizer>,
    expanders: HandlerChain<dyn QueryExpressionExpander>,
    sourcers: HandlerChain<dyn QueryExpressionSourcer>,
}

impl QueryExpressionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn QueryExpressionAuthorizer>) -> Self {
        self.authorizers.push(authorizer);
        self
    }

    pub fn with_expander(mut self, expander: Arc<dyn QueryExpressionExpander>) -> Self {
        self.expanders.push(expander);
        self
    }

    pub fn with_sourcer(mut self, sourcer: Arc<dyn QueryExpressionSourcer>) -> Self {
        self.sourcers.push(sourcer);
        self
    }

    /// Append the convention expander and sourcer as fallbacks
    pub fn with_conventions(mut self, catalog: Arc<ConventionCatalog>) -> Self {
        self.expanders
            .push_fallback(Arc::new(ConventionExpander::new(catalog.clone())));
        self.sourcers
            .push_fallback(Arc::new(ConventionSourcer::new(catalog)));
        self
    }

    /// Rewrite `query`, reporting whether anything changed
    pub fn compose_transformed(
        &self,
        query: &QueryExpr,
        context: &QueryContext,
    ) -> QueryPipelineResult<Transformed<QueryExpr>> {
        Rewriter::new(self, context).rewrite(query, false)
    }

    pub fn compose(&self, query: &QueryExpr, context: &QueryContext) -> QueryPipelineResult<QueryExpr> {
        self.compose_transformed(query, context)
            .map(Transformed::into_inner)
    }
}
