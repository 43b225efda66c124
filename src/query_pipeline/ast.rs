use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query AST rewritten by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryExpr {
    /// Placeholder naming a facet whose backing query is not yet known
    SourceStub { name: String },
    /// Concrete backing-store source
    Source(SourceExpr),
    Filter {
        input: Box<QueryExpr>,
        predicate: ScalarExpr,
    },
    Project {
        input: Box<QueryExpr>,
        fields: Vec<String>,
    },
    Navigate {
        input: Box<QueryExpr>,
        property: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceExpr {
    /// Open a store collection as a queryable
    OpenCollection {
        database: String,
        collection: String,
        element_type: String,
    },
    /// A constant in-memory sequence
    Constant {
        element_type: String,
        values: Vec<Value>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarExpr {
    Property(String),
    Literal(Value),
    Compare {
        op: CompareOp,
        left: Box<ScalarExpr>,
        right: Box<ScalarExpr>,
    },
    And(Box<ScalarExpr>, Box<ScalarExpr>),
    Or(Box<ScalarExpr>, Box<ScalarExpr>),
    Not(Box<ScalarExpr>),
}

impl QueryExpr {
    pub fn stub(name: impl Into<String>) -> Self {
        QueryExpr::SourceStub { name: name.into() }
    }

    pub fn constant(element_type: impl Into<String>, values: Vec<Value>) -> Self {
        QueryExpr::Source(SourceExpr::Constant {
            element_type: element_type.into(),
            values,
        })
    }

    pub fn filter(self, predicate: ScalarExpr) -> Self {
        QueryExpr::Filter {
            input: Box::new(self),
            predicate,
        }
    }

    pub fn project<S: Into<String>>(self, fields: impl IntoIterator<Item = S>) -> Self {
        QueryExpr::Project {
            input: Box::new(self),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn navigate(self, property: impl Into<String>) -> Self {
        QueryExpr::Navigate {
            input: Box::new(self),
            property: property.into(),
        }
    }

    /// Direct child expression, if any
    pub fn input(&self) -> Option<&QueryExpr> {
        match self {
            QueryExpr::Filter { input, .. }
            | QueryExpr::Project { input, .. }
            | QueryExpr::Navigate { input, .. } => Some(input),
            QueryExpr::SourceStub { .. } | QueryExpr::Source(_) => None,
        }
    }

    /// Names of every stub remaining in the tree, outermost first
    pub fn stub_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(self);
        while let Some(expr) = current {
            if let QueryExpr::SourceStub { name } = expr {
                names.push(name.as_str());
            }
            current = expr.input();
        }
        names
    }

    pub fn has_stubs(&self) -> bool {
        !self.stub_names().is_empty()
    }
}

impl ScalarExpr {
    pub fn property(name: impl Into<String>) -> Self {
        ScalarExpr::Property(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        ScalarExpr::Literal(value.into())
    }

    pub fn compare(op: CompareOp, left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `property == value`
    pub fn property_eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(
            CompareOp::Eq,
            Self::property(property),
            Self::literal(value),
        )
    }

    pub fn and(self, other: ScalarExpr) -> Self {
        ScalarExpr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: ScalarExpr) -> Self {
        ScalarExpr::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        ScalarExpr::Not(Box::new(self))
    }
}
