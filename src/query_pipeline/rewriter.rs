use super::ast::QueryExpr;
use super::context::{QueryContext, QueryRewriteContext};
use super::errors::{QueryPipelineError, QueryPipelineResult};
use super::transformed::Transformed;
use super::QueryExpressionPipeline;

/// Top-down rewrite of one query, stub by stub.
///
/// Holds only the names of stubs currently being expanded, so composing the
/// same query twice yields the same result.
pub(crate) struct Rewriter<'p> {
    pipeline: &'p QueryExpressionPipeline,
    context: &'p QueryContext,
    expanding: Vec<String>,
}

impl<'p> Rewriter<'p> {
    pub(crate) fn new(pipeline: &'p QueryExpressionPipeline, context: &'p QueryContext) -> Self {
        Rewriter {
            pipeline,
            context,
            expanding: vec![],
        }
    }

    pub(crate) fn rewrite(
        &mut self,
        node: &QueryExpr,
        embedded: bool,
    ) -> QueryPipelineResult<Transformed<QueryExpr>> {
        let rewrite_context = QueryRewriteContext::new(node, self.context);

        if !rewrite_context.model_reference.is_none() {
            let verdict = self
                .pipeline
                .authorizers
                .first_answer(|a| a.authorize(&rewrite_context));
            if verdict == Some(false) {
                log::warn!("Access denied to {}", rewrite_context.model_reference);
                return Err(QueryPipelineError::AccessDenied {
                    element: rewrite_context.model_reference.to_string(),
                });
            }
        }

        match node {
            QueryExpr::SourceStub { name } => self.rewrite_stub(name, &rewrite_context, embedded),
            QueryExpr::Source(_) => Ok(Transformed::No(node.clone())),
            QueryExpr::Filter { input, predicate } => {
                let input_tf = self.rewrite(input, true)?;
                Ok(rebuild_or_clone(input_tf, node, |input| QueryExpr::Filter {
                    input: Box::new(input),
                    predicate: predicate.clone(),
                }))
            }
            QueryExpr::Project { input, fields } => {
                let input_tf = self.rewrite(input, true)?;
                Ok(rebuild_or_clone(input_tf, node, |input| QueryExpr::Project {
                    input: Box::new(input),
                    fields: fields.clone(),
                }))
            }
            QueryExpr::Navigate { input, property } => {
                let input_tf = self.rewrite(input, true)?;
                Ok(rebuild_or_clone(input_tf, node, |input| QueryExpr::Navigate {
                    input: Box::new(input),
                    property: property.clone(),
                }))
            }
        }
    }

    fn rewrite_stub(
        &mut self,
        name: &str,
        rewrite_context: &QueryRewriteContext<'_>,
        embedded: bool,
    ) -> QueryPipelineResult<Transformed<QueryExpr>> {
        // A stub under expansion goes straight to the sourcers
        if !self.expanding.iter().any(|n| n == name) {
            if let Some(expanded) = self
                .pipeline
                .expanders
                .first_answer(|e| e.expand(rewrite_context))
            {
                log::debug!("Expanded data source `{}`", name);
                self.expanding.push(name.to_string());
                let result = self.rewrite(&expanded, embedded);
                self.expanding.pop();
                return Ok(Transformed::Yes(result?.into_inner()));
            }
        }

        match self
            .pipeline
            .sourcers
            .first_answer(|s| {
                // handing back the stub being sourced counts as a decline
                s.source(rewrite_context, embedded)
                    .filter(|sourced| !sourced.stub_names().contains(&name))
            })
        {
            Some(sourced) => {
                log::debug!("Sourced data source `{}`", name);
                Ok(Transformed::Yes(sourced))
            }
            None => {
                log::warn!("No sourcer resolved data source `{}`", name);
                Err(QueryPipelineError::UnresolvedSource {
                    name: name.to_string(),
                })
            }
        }
    }
}

fn rebuild_or_clone(
    input_tf: Transformed<QueryExpr>,
    old_node: &QueryExpr,
    rebuild: impl FnOnce(QueryExpr) -> QueryExpr,
) -> Transformed<QueryExpr> {
    match input_tf {
        Transformed::Yes(new_input) => Transformed::Yes(rebuild(new_input)),
        Transformed::No(_) => Transformed::No(old_node.clone()),
    }
}
