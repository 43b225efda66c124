//! Write-path handoff.
//!
//! A [`ChangeSet`] is validated against the model and handed to an optional
//! [`ChangeSetInitializer`] and then a [`SubmitExecutor`]. Executors must
//! observe cancellation before committing anything.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::model_catalog::Model;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubmitError {
    #[error("Entity set `{name}` does not exist in the model")]
    UnknownEntitySet { name: String },
    #[error("Change to `{entity_set}` is missing key property `{key}`")]
    MissingKey { entity_set: String, key: String },
    #[error("No entity in `{entity_set}` matches key {key}")]
    NotFound { entity_set: String, key: String },
    #[error("An entity in `{entity_set}` already has key {key}")]
    Conflict { entity_set: String, key: String },
    #[error("Submit was cancelled before commit")]
    Cancelled,
}

pub type SubmitResult<T> = Result<T, SubmitError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSetEntry {
    pub entity_set: String,
    pub operation: ChangeOperation,
    /// Key property values identifying the entity
    #[serde(default)]
    pub key: Map<String, Value>,
    /// Property values to write
    #[serde(default)]
    pub values: Map<String, Value>,
}

impl ChangeSetEntry {
    pub fn key_display(&self) -> String {
        Value::Object(self.key.clone()).to_string()
    }
}

/// Ordered write-path payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    entries: Vec<ChangeSetEntry>,
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ChangeSetEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: ChangeSetEntry) {
        self.entries.push(entry);
    }

    pub fn insert(mut self, entity_set: impl Into<String>, values: Value) -> Self {
        self.push(ChangeSetEntry {
            entity_set: entity_set.into(),
            operation: ChangeOperation::Insert,
            key: Map::new(),
            values: object(values),
        });
        self
    }

    pub fn update(mut self, entity_set: impl Into<String>, key: Value, values: Value) -> Self {
        self.push(ChangeSetEntry {
            entity_set: entity_set.into(),
            operation: ChangeOperation::Update,
            key: object(key),
            values: object(values),
        });
        self
    }

    pub fn delete(mut self, entity_set: impl Into<String>, key: Value) -> Self {
        self.push(ChangeSetEntry {
            entity_set: entity_set.into(),
            operation: ChangeOperation::Delete,
            key: object(key),
            values: Map::new(),
        });
        self
    }

    /// Every entry targets a model entity set; updates and deletes carry the full key
    pub fn validate(&self, model: &Model) -> SubmitResult<()> {
        for entry in &self.entries {
            let entity_set = model.find_entity_set(&entry.entity_set).ok_or_else(|| {
                SubmitError::UnknownEntitySet {
                    name: entry.entity_set.clone(),
                }
            })?;
            for key in key_properties(model, &entity_set.element_type) {
                let present = entry.key.contains_key(key)
                    || (entry.operation == ChangeOperation::Insert
                        && entry.values.contains_key(key));
                if !present {
                    return Err(SubmitError::MissingKey {
                        entity_set: entry.entity_set.clone(),
                        key: key.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Fill each insert's key from the key property values it writes
    pub fn assign_insert_keys(&mut self, model: &Model) {
        for entry in &mut self.entries {
            if entry.operation != ChangeOperation::Insert {
                continue;
            }
            let Some(entity_set) = model.find_entity_set(&entry.entity_set) else {
                continue;
            };
            for key in key_properties(model, &entity_set.element_type) {
                if let Some(value) = entry.values.get(key) {
                    entry.key.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
        }
    }
}

// Keys are declared on the root of an entity hierarchy
fn key_properties<'m>(model: &'m Model, type_name: &str) -> &'m [String] {
    let mut current = model.find_type(type_name);
    while let Some(ty) = current {
        if !ty.keys.is_empty() {
            return &ty.keys;
        }
        current = ty.base_type.as_deref().and_then(|b| model.find_type(b));
    }
    &[]
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmitOutcome {
    pub applied: usize,
}

/// Prepares a change set before execution, e.g. filling server-side values
#[async_trait]
pub trait ChangeSetInitializer: Send + Sync {
    async fn initialize(
        &self,
        change_set: &mut ChangeSet,
        cancel: &CancellationToken,
    ) -> SubmitResult<()>;
}

#[async_trait]
pub trait SubmitExecutor: Send + Sync {
    async fn execute_submit(
        &self,
        change_set: &ChangeSet,
        cancel: &CancellationToken,
    ) -> SubmitResult<SubmitOutcome>;
}

/// Validate and hand a change set to the submit collaborators
pub async fn submit(
    model: &Model,
    mut change_set: ChangeSet,
    initializer: Option<&dyn ChangeSetInitializer>,
    executor: &dyn SubmitExecutor,
    cancel: &CancellationToken,
) -> SubmitResult<SubmitOutcome> {
    if cancel.is_cancelled() {
        return Err(SubmitError::Cancelled);
    }
    change_set.validate(model)?;

    if let Some(initializer) = initializer {
        initializer.initialize(&mut change_set, cancel).await?;
        change_set.validate(model)?;
    }
    change_set.assign_insert_keys(model);

    if cancel.is_cancelled() {
        return Err(SubmitError::Cancelled);
    }
    let outcome = executor.execute_submit(&change_set, cancel).await?;
    log::debug!("Submitted {} change(s)", outcome.applied);
    Ok(outcome)
}
