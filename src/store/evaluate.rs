use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};
use crate::query_pipeline::{CompareOp, QueryExpr, ScalarExpr, SourceExpr};

/// Evaluate a rewritten query over in-memory collections
pub(crate) fn evaluate(
    query: &QueryExpr,
    database: &str,
    collections: &HashMap<String, Vec<Value>>,
) -> StoreResult<Vec<Value>> {
    match query {
        QueryExpr::SourceStub { name } => Err(StoreError::UnresolvedStub { name: name.clone() }),
        QueryExpr::Source(SourceExpr::OpenCollection {
            database: target,
            collection,
            ..
        }) => {
            if target != database {
                return Err(StoreError::ForeignDatabase {
                    database: target.clone(),
                });
            }
            collections
                .get(collection)
                .cloned()
                .ok_or_else(|| StoreError::UnknownCollection {
                    collection: collection.clone(),
                })
        }
        QueryExpr::Source(SourceExpr::Constant { values, .. }) => Ok(values.clone()),
        QueryExpr::Filter { input, predicate } => {
            let rows = evaluate(input, database, collections)?;
            Ok(rows
                .into_iter()
                .filter(|row| truthy(&scalar(predicate, row)))
                .collect())
        }
        QueryExpr::Project { input, fields } => {
            let rows = evaluate(input, database, collections)?;
            Ok(rows
                .iter()
                .map(|row| {
                    let projected: Map<String, Value> = fields
                        .iter()
                        .map(|field| (field.clone(), lookup(row, field).clone()))
                        .collect();
                    Value::Object(projected)
                })
                .collect())
        }
        QueryExpr::Navigate { input, property } => {
            let rows = evaluate(input, database, collections)?;
            let mut related = Vec::new();
            for row in &rows {
                match lookup(row, property) {
                    Value::Array(items) => related.extend(items.iter().cloned()),
                    Value::Null => {}
                    value => related.push(value.clone()),
                }
            }
            Ok(related)
        }
    }
}

/// Dotted path lookup; missing members read as null
fn lookup<'v>(row: &'v Value, path: &str) -> &'v Value {
    path.split('.')
        .try_fold(row, |value, segment| value.get(segment))
        .unwrap_or(&Value::Null)
}

fn scalar(expr: &ScalarExpr, row: &Value) -> Value {
    match expr {
        ScalarExpr::Property(path) => lookup(row, path).clone(),
        ScalarExpr::Literal(value) => value.clone(),
        ScalarExpr::Compare { op, left, right } => {
            let (left, right) = (scalar(left, row), scalar(right, row));
            let ordering = compare(&left, &right);
            Value::Bool(match op {
                CompareOp::Eq => ordering == Some(Ordering::Equal),
                CompareOp::Ne => ordering != Some(Ordering::Equal),
                CompareOp::Lt => ordering == Some(Ordering::Less),
                CompareOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                CompareOp::Gt => ordering == Some(Ordering::Greater),
                CompareOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            })
        }
        ScalarExpr::And(left, right) => {
            Value::Bool(truthy(&scalar(left, row)) && truthy(&scalar(right, row)))
        }
        ScalarExpr::Or(left, right) => {
            Value::Bool(truthy(&scalar(left, row)) || truthy(&scalar(right, row)))
        }
        ScalarExpr::Not(inner) => Value::Bool(!truthy(&scalar(inner, row))),
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (l, r) if l == r => Some(Ordering::Equal),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}
