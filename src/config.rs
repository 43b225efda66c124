use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

pub const DEFAULT_ROOT_TYPE: &str = "ApiBase";
pub const DEFAULT_CONTAINER_NAME: &str = "Container";

lazy_static::lazy_static! {
    static ref NAMESPACE_PATTERN: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
            .expect("namespace pattern is valid");
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn validate_namespace(namespace: &str) -> Result<(), ValidationError> {
    if NAMESPACE_PATTERN.is_match(namespace) {
        Ok(())
    } else {
        let mut error = ValidationError::new("namespace");
        error.message = Some("Namespace must be dot-separated identifiers".into());
        Err(error)
    }
}

/// Model assembly configuration with validation
#[derive(Clone, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Namespace override for structural and enum types
    #[validate(custom(function = "validate_namespace"))]
    pub namespace: Option<String>,

    /// Host property names never exposed as facets
    pub ignored_properties: Vec<String>,

    /// Host type boundary where member scans stop
    #[validate(length(min = 1, message = "Root type cannot be empty"))]
    pub root_type: String,

    /// Entity container name
    #[validate(length(min = 1, message = "Container name cannot be empty"))]
    pub container_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            ignored_properties: vec![],
            root_type: DEFAULT_ROOT_TYPE.to_string(),
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            namespace: env::var("MODELGRAPH_NAMESPACE")
                .ok()
                .filter(|ns| !ns.is_empty()),
            ignored_properties: split_list(
                &env::var("MODELGRAPH_IGNORED_PROPERTIES").unwrap_or_default(),
            ),
            root_type: parse_env_var("MODELGRAPH_ROOT_TYPE", DEFAULT_ROOT_TYPE)?,
            container_name: parse_env_var("MODELGRAPH_CONTAINER_NAME", DEFAULT_CONTAINER_NAME)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let config = Self {
            namespace: cli.namespace,
            ignored_properties: cli.ignored_properties,
            root_type: cli.root_type.unwrap_or_else(|| DEFAULT_ROOT_TYPE.to_string()),
            container_name: cli
                .container_name
                .unwrap_or_else(|| DEFAULT_CONTAINER_NAME.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Layer `other` over this configuration.
    ///
    /// Values `other` sets explicitly win; ignore lists are unioned.
    pub fn merge(&mut self, other: Self) {
        if other.namespace.is_some() {
            self.namespace = other.namespace;
        }
        for name in other.ignored_properties {
            if !self.ignored_properties.contains(&name) {
                self.ignored_properties.push(name);
            }
        }
        if other.root_type != DEFAULT_ROOT_TYPE {
            self.root_type = other.root_type;
        }
        if other.container_name != DEFAULT_CONTAINER_NAME {
            self.container_name = other.container_name;
        }
    }

    pub fn is_ignored(&self, property: &str) -> bool {
        self.ignored_properties.iter().any(|p| p == property)
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub namespace: Option<String>,
    pub ignored_properties: Vec<String>,
    pub root_type: Option<String>,
    pub container_name: Option<String>,
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
