use std::sync::Arc;

use super::ast::QueryExpr;
use super::context::{HostValue, QueryRewriteContext};
use super::expander::entity_set_query;
use crate::conventions::ConventionCatalog;
use crate::model_catalog::FacetRef;

/// Terminal resolver from a source stub to a backing-store expression.
///
/// Store-specific sourcers decline names they do not own.
pub trait QueryExpressionSourcer: Send + Sync {
    fn source(&self, context: &QueryRewriteContext<'_>, embedded: bool) -> Option<QueryExpr>;
}

/// Sources stubs the backing store cannot: host queryables and singleton values
pub struct ConventionSourcer {
    catalog: Arc<ConventionCatalog>,
}

impl ConventionSourcer {
    pub fn new(catalog: Arc<ConventionCatalog>) -> Self {
        ConventionSourcer { catalog }
    }
}

impl QueryExpressionSourcer for ConventionSourcer {
    fn source(&self, context: &QueryRewriteContext<'_>, _embedded: bool) -> Option<QueryExpr> {
        match context.stub_facet()? {
            FacetRef::EntitySet(name) => entity_set_query(&self.catalog, context, name),
            FacetRef::Singleton(name) => {
                let property = self.catalog.singleton_property(name)?;
                let value = context.query_context.read_host_property(
                    &self.catalog.host_type,
                    &property.facet,
                    property.is_static,
                )?;
                match value {
                    // one-element sequence over the current value
                    HostValue::Object(value) => {
                        Some(QueryExpr::constant(property.element_type.clone(), vec![value]))
                    }
                    HostValue::Queryable(_) => None,
                }
            }
        }
    }
}
