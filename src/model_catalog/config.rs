use super::declared_type::DeclaredType;
use super::errors::{ModelCatalogError, ModelCatalogResult};
use super::host_registry::HostTypeRegistry;
use crate::query_pipeline::context::HostValue;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// Host catalog management.
///
/// A host catalog is the statically registered description of a host
/// application's type surface: the host types whose members are scanned,
/// the structural and enum types the model may contain, and the types and
/// facets the host pre-registers before conventions run.
///
/// ```yaml
/// name: trippin
/// host_types:
///   - name: TrippinApi
///     namespace: Trippin
///     base: ApiBase
///     properties:
///       - { name: People, type: "Queryable<Person>" }
///       - { name: Me, type: Person }
///     methods:
///       - name: GetPersonWithMostFriends
///         returns: Person
///         operation: { entity_set: People }
/// structural_types:
///   - name: Person
///     namespace: Trippin.Models
///     keys: [PersonId]
///     properties:
///       - { name: PersonId, type: Int32 }
///       - { name: Friends, type: "Collection<Person>" }
///       - { name: BestFriend, type: Person, singleton_target: true }
/// model:
///   types: [Person]
/// ```
///
/// # Usage
///
/// ```ignore
/// let catalog = HostCatalogConfig::from_yaml_file("trippin.yaml")?;
/// let registry = catalog.to_registry()?;
/// ```

lazy_static::lazy_static! {
    static ref IDENTIFIER_PATTERN: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid");
}

fn default_namespace() -> String {
    "Default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_void() -> DeclaredType {
    DeclaredType::Void
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    NonPublic,
}

/// A property declared on a host type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DeclaredType,
    #[serde(default)]
    pub visibility: Visibility,
    /// Whether the property has an accessible getter
    #[serde(default = "default_true")]
    pub readable: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, ty: DeclaredType) -> Self {
        PropertyDefinition {
            name: name.into(),
            ty,
            visibility: Visibility::Public,
            readable: true,
            is_static: false,
        }
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DeclaredType,
}

impl ParameterDefinition {
    pub fn new(name: impl Into<String>, ty: DeclaredType) -> Self {
        ParameterDefinition {
            name: name.into(),
            ty,
        }
    }
}

/// Marker attached to a method to expose it as a model operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationMarker {
    /// Operation name; falls back to the method name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub is_bound: bool,
    #[serde(default)]
    pub has_side_effects: bool,
    #[serde(default)]
    pub is_composable: bool,
    /// Entity set the returned entities come from
    #[serde(default)]
    pub entity_set: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDefinition {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
    #[serde(default = "default_void")]
    pub returns: DeclaredType,
    #[serde(default)]
    pub operation: Option<OperationMarker>,
}

impl MethodDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        MethodDefinition {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            parameters: vec![],
            returns: DeclaredType::Void,
            operation: None,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, ty: DeclaredType) -> Self {
        self.parameters.push(ParameterDefinition::new(name, ty));
        self
    }

    pub fn returning(mut self, ty: DeclaredType) -> Self {
        self.returns = ty;
        self
    }

    pub fn with_operation(mut self, marker: OperationMarker) -> Self {
        self.operation = Some(marker);
        self
    }
}

/// A host type whose declared members form the model's contract surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostTypeDefinition {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
    #[serde(default)]
    pub methods: Vec<MethodDefinition>,
}

impl HostTypeDefinition {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        HostTypeDefinition {
            name: name.into(),
            namespace: namespace.into(),
            base: None,
            properties: vec![],
            methods: vec![],
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_method(mut self, method: MethodDefinition) -> Self {
        self.methods.push(method);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralKind {
    #[default]
    Entity,
    Complex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralPropertyDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DeclaredType,
    /// Navigation target is a singleton facet rather than an entity set
    #[serde(default)]
    pub singleton_target: bool,
}

/// A structural (entity or complex) type the model may contain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralTypeDefinition {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub kind: StructuralKind,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub properties: Vec<StructuralPropertyDefinition>,
}

impl StructuralTypeDefinition {
    pub fn entity(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        StructuralTypeDefinition {
            name: name.into(),
            namespace: namespace.into(),
            kind: StructuralKind::Entity,
            base: None,
            keys: vec![],
            properties: vec![],
        }
    }

    pub fn complex(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        StructuralTypeDefinition {
            kind: StructuralKind::Complex,
            ..StructuralTypeDefinition::entity(name, namespace)
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, ty: DeclaredType) -> Self {
        self.properties.push(StructuralPropertyDefinition {
            name: name.into(),
            ty,
            singleton_target: false,
        });
        self
    }

    pub fn with_singleton_navigation(mut self, name: impl Into<String>, ty: DeclaredType) -> Self {
        self.properties.push(StructuralPropertyDefinition {
            name: name.into(),
            ty,
            singleton_target: true,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumTypeDefinition {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetRegistration {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Types and facets the host registers before conventions run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRegistrationDefinition {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub entity_sets: Vec<FacetRegistration>,
    #[serde(default)]
    pub singletons: Vec<FacetRegistration>,
    /// Extra key properties per entity type
    #[serde(default)]
    pub keys: BTreeMap<String, Vec<String>>,
}

/// Seed data for the in-memory document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStoreDefinition {
    pub database: String,
    #[serde(default)]
    pub collections: BTreeMap<String, Vec<serde_json::Value>>,
}

/// Host catalog loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostCatalogConfig {
    /// Optional catalog name
    #[serde(default)]
    pub name: Option<String>,
    pub host_types: Vec<HostTypeDefinition>,
    #[serde(default)]
    pub structural_types: Vec<StructuralTypeDefinition>,
    #[serde(default)]
    pub enum_types: Vec<EnumTypeDefinition>,
    #[serde(default)]
    pub model: ModelRegistrationDefinition,
    /// Static host property values, by property name
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub host_values: BTreeMap<String, HostValue>,
    #[serde(default)]
    pub document_store: Option<DocumentStoreDefinition>,
}

impl HostCatalogConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ModelCatalogResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ModelCatalogError::ConfigReadError {
                error: format!("{}: {}", path.as_ref().display(), e),
            }
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ModelCatalogResult<Self> {
        let config: HostCatalogConfig =
            serde_yaml::from_str(content).map_err(|e| ModelCatalogError::ConfigParseError {
                error: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Structural validation: identifiers, duplicate declarations, dangling registrations
    pub fn validate(&self) -> ModelCatalogResult<()> {
        let mut declared: HashSet<&str> = HashSet::new();
        let names = self
            .host_types
            .iter()
            .map(|t| t.name.as_str())
            .chain(self.structural_types.iter().map(|t| t.name.as_str()))
            .chain(self.enum_types.iter().map(|t| t.name.as_str()));
        for name in names {
            if !IDENTIFIER_PATTERN.is_match(name) {
                return Err(ModelCatalogError::InvalidConfig {
                    message: format!("`{}` is not a valid type name", name),
                });
            }
            if !declared.insert(name) {
                return Err(ModelCatalogError::DuplicateDeclaration {
                    name: name.to_string(),
                });
            }
        }

        for host in &self.host_types {
            let mut members: HashSet<&str> = HashSet::new();
            for property in &host.properties {
                if !members.insert(property.name.as_str()) {
                    return Err(ModelCatalogError::DuplicateDeclaration {
                        name: format!("{}.{}", host.name, property.name),
                    });
                }
            }
        }

        let registered = self
            .model
            .types
            .iter()
            .chain(self.model.entity_sets.iter().map(|f| &f.type_name))
            .chain(self.model.singletons.iter().map(|f| &f.type_name))
            .chain(self.model.keys.keys());
        for type_name in registered {
            if !self.structural_types.iter().any(|t| &t.name == type_name) {
                return Err(ModelCatalogError::InvalidConfig {
                    message: format!(
                        "model registration references undeclared structural type `{}`",
                        type_name
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn to_registry(&self) -> ModelCatalogResult<HostTypeRegistry> {
        let mut registry = HostTypeRegistry::new();
        for host in &self.host_types {
            registry.register_host_type(host.clone())?;
        }
        for structural in &self.structural_types {
            registry.register_structural_type(structural.clone())?;
        }
        for enum_type in &self.enum_types {
            registry.register_enum_type(enum_type.clone())?;
        }
        log::debug!(
            "Host catalog {:?}: {} host type(s), {} structural type(s), {} enum type(s)",
            self.name,
            self.host_types.len(),
            self.structural_types.len(),
            self.enum_types.len()
        );
        Ok(registry)
    }
}
