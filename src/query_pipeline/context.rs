use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ast::{QueryExpr, SourceExpr};
use crate::conventions::ModelMapperChain;
use crate::model_catalog::{FacetRef, Model};

/// Current value of a host property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostValue {
    /// A queryable backing an entity set
    Queryable(QueryExpr),
    /// A plain object, such as a singleton's value
    Object(Value),
}

/// The host instance serving a request
pub trait HostInstance: Send + Sync {
    /// Whether this instance is of `host_type` or a type derived from it
    fn is_instance_of(&self, host_type: &str) -> bool;

    fn read_property(&self, name: &str) -> Option<HostValue>;
}

/// Host instance backed by a property map
#[derive(Debug, Clone, Default)]
pub struct InMemoryHost {
    lineage: Vec<String>,
    values: HashMap<String, HostValue>,
}

impl InMemoryHost {
    /// `lineage` lists the instance's type first, then its ancestors
    pub fn new(lineage: Vec<String>) -> Self {
        InMemoryHost {
            lineage,
            values: HashMap::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: HostValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

impl HostInstance for InMemoryHost {
    fn is_instance_of(&self, host_type: &str) -> bool {
        self.lineage.iter().any(|t| t == host_type)
    }

    fn read_property(&self, name: &str) -> Option<HostValue> {
        self.values.get(name).cloned()
    }
}

/// Per-request state shared by every node rewrite
#[derive(Clone)]
pub struct QueryContext {
    pub model: Arc<Model>,
    pub mapper: Arc<ModelMapperChain>,
    pub host: Option<Arc<dyn HostInstance>>,
    /// Values of static host properties
    pub statics: HashMap<String, HostValue>,
}

impl QueryContext {
    pub fn new(model: Arc<Model>, mapper: Arc<ModelMapperChain>) -> Self {
        QueryContext {
            model,
            mapper,
            host: None,
            statics: HashMap::new(),
        }
    }

    pub fn with_host(mut self, host: Arc<dyn HostInstance>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_static(mut self, name: impl Into<String>, value: HostValue) -> Self {
        self.statics.insert(name.into(), value);
        self
    }

    /// Read a host property, static or from the request's host instance.
    ///
    /// Instance properties are only read when the host instance is of `host_type`.
    pub fn read_host_property(&self, host_type: &str, name: &str, is_static: bool) -> Option<HostValue> {
        if is_static {
            return self.statics.get(name).cloned();
        }
        self.host
            .as_ref()
            .filter(|host| host.is_instance_of(host_type))
            .and_then(|host| host.read_property(name))
    }
}

impl fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("namespace", &self.model.namespace())
            .field("has_host", &self.host.is_some())
            .field("statics", &self.statics.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// What a query node represents in the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReference {
    None,
    /// A source stub; `facet` is set when the name is a model facet
    DataSourceStub {
        name: String,
        facet: Option<FacetRef>,
    },
    EntitySet(String),
    Singleton(String),
    Type(String),
}

impl ModelReference {
    /// Classify a node against the model
    pub fn classify(node: &QueryExpr, model: &Model) -> Self {
        match node {
            QueryExpr::SourceStub { name } => ModelReference::DataSourceStub {
                name: name.clone(),
                facet: model.find_facet(name),
            },
            QueryExpr::Source(SourceExpr::OpenCollection {
                collection,
                element_type,
                ..
            }) => match model.find_facet(collection) {
                Some(FacetRef::EntitySet(name)) => ModelReference::EntitySet(name),
                Some(FacetRef::Singleton(name)) => ModelReference::Singleton(name),
                None => ModelReference::Type(element_type.clone()),
            },
            QueryExpr::Source(SourceExpr::Constant { element_type, .. }) => {
                ModelReference::Type(element_type.clone())
            }
            QueryExpr::Navigate { input, property } => element_type_of(input, model)
                .and_then(|t| model.find_navigation_property(&t, property))
                .map(|nav| ModelReference::Type(nav.target_type.clone()))
                .unwrap_or(ModelReference::None),
            QueryExpr::Filter { .. } | QueryExpr::Project { .. } => ModelReference::None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ModelReference::None)
    }

    /// Name of the facet this reference points at, if any
    pub fn facet_name(&self) -> Option<&str> {
        match self {
            ModelReference::DataSourceStub { facet, .. } => facet.as_ref().map(|f| f.name()),
            ModelReference::EntitySet(name) | ModelReference::Singleton(name) => Some(name),
            ModelReference::None | ModelReference::Type(_) => None,
        }
    }
}

impl fmt::Display for ModelReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelReference::None => f.write_str("unclassified node"),
            ModelReference::DataSourceStub {
                facet: Some(facet), ..
            } => write!(f, "{}", facet),
            ModelReference::DataSourceStub { name, facet: None } => {
                write!(f, "data source `{}`", name)
            }
            ModelReference::EntitySet(name) => write!(f, "entity set `{}`", name),
            ModelReference::Singleton(name) => write!(f, "singleton `{}`", name),
            ModelReference::Type(name) => write!(f, "type `{}`", name),
        }
    }
}

/// Element type produced by an expression, when the model knows it
fn element_type_of(expr: &QueryExpr, model: &Model) -> Option<String> {
    match expr {
        QueryExpr::SourceStub { name } => model
            .find_facet(name)
            .and_then(|facet| model.facet_type(&facet).map(str::to_string)),
        QueryExpr::Source(SourceExpr::OpenCollection { element_type, .. })
        | QueryExpr::Source(SourceExpr::Constant { element_type, .. }) => Some(element_type.clone()),
        QueryExpr::Filter { input, .. } | QueryExpr::Project { input, .. } => {
            element_type_of(input, model)
        }
        QueryExpr::Navigate { input, property } => {
            let source = element_type_of(input, model)?;
            model
                .find_navigation_property(&source, property)
                .map(|nav| nav.target_type.clone())
        }
    }
}

/// State for rewriting one node
pub struct QueryRewriteContext<'a> {
    pub visited_node: &'a QueryExpr,
    pub model_reference: ModelReference,
    pub query_context: &'a QueryContext,
}

impl<'a> QueryRewriteContext<'a> {
    pub fn new(visited_node: &'a QueryExpr, query_context: &'a QueryContext) -> Self {
        QueryRewriteContext {
            visited_node,
            model_reference: ModelReference::classify(visited_node, &query_context.model),
            query_context,
        }
    }

    pub fn model(&self) -> &Model {
        &self.query_context.model
    }

    /// The facet a stub node names, if the model has it
    pub fn stub_facet(&self) -> Option<&FacetRef> {
        match &self.model_reference {
            ModelReference::DataSourceStub { facet, .. } => facet.as_ref(),
            _ => None,
        }
    }

    /// The name of a stub node
    pub fn stub_name(&self) -> Option<&str> {
        match &self.model_reference {
            ModelReference::DataSourceStub { name, .. } => Some(name),
            _ => None,
        }
    }
}
