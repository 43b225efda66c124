use std::sync::Arc;

use super::ast::QueryExpr;
use super::context::{HostValue, QueryRewriteContext};
use crate::conventions::ConventionCatalog;
use crate::model_catalog::FacetRef;

/// Replaces a source stub with a materialized sub-query, or declines
pub trait QueryExpressionExpander: Send + Sync {
    fn expand(&self, context: &QueryRewriteContext<'_>) -> Option<QueryExpr>;
}

/// Expands entity-set stubs backed by a host-declared queryable property
pub struct ConventionExpander {
    catalog: Arc<ConventionCatalog>,
}

impl ConventionExpander {
    pub fn new(catalog: Arc<ConventionCatalog>) -> Self {
        ConventionExpander { catalog }
    }
}

impl QueryExpressionExpander for ConventionExpander {
    fn expand(&self, context: &QueryRewriteContext<'_>) -> Option<QueryExpr> {
        let FacetRef::EntitySet(name) = context.stub_facet()? else {
            return None;
        };
        entity_set_query(&self.catalog, context, name)
    }
}

/// The host queryable behind an entity set, if the host exposes one
pub(crate) fn entity_set_query(
    catalog: &ConventionCatalog,
    context: &QueryRewriteContext<'_>,
    name: &str,
) -> Option<QueryExpr> {
    let property = catalog.entity_set_property(name)?;
    match context.query_context.read_host_property(
        &catalog.host_type,
        &property.facet,
        property.is_static,
    )? {
        HostValue::Queryable(query) => Some(query),
        HostValue::Object(_) => None,
    }
}
