use serde::{Deserialize, Serialize};
use std::fmt;

use super::config::StructuralKind;
use super::declared_type::DeclaredType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DeclaredType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationProperty {
    pub name: String,
    /// Related entity type
    pub target_type: String,
    pub is_collection: bool,
    /// Bind to a singleton facet instead of an entity set
    pub singleton_target: bool,
}

/// A structural (entity or complex) type in the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    pub namespace: String,
    pub kind: StructuralKind,
    pub base_type: Option<String>,
    pub keys: Vec<String>,
    pub properties: Vec<StructuralProperty>,
    pub navigation_properties: Vec<NavigationProperty>,
}

impl TypeDescriptor {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumTypeDescriptor {
    pub name: String,
    pub namespace: String,
    pub members: Vec<String>,
}

/// Where a facet came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetOrigin {
    /// A static host property
    Static,
    /// An instance host property
    Instance,
    /// Registered by a preparer, extender or host catalog
    Registered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySetDescriptor {
    pub name: String,
    pub element_type: String,
    pub origin: FacetOrigin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingletonDescriptor {
    pub name: String,
    pub type_name: String,
    pub origin: FacetOrigin,
}

/// Reference to a container facet by kind and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacetRef {
    EntitySet(String),
    Singleton(String),
}

impl FacetRef {
    pub fn name(&self) -> &str {
        match self {
            FacetRef::EntitySet(name) | FacetRef::Singleton(name) => name,
        }
    }
}

impl fmt::Display for FacetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacetRef::EntitySet(name) => write!(f, "entity set `{}`", name),
            FacetRef::Singleton(name) => write!(f, "singleton `{}`", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationBindingDescriptor {
    pub source: FacetRef,
    pub declaring_type: String,
    pub navigation_property: String,
    pub target: FacetRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// No side effects
    Function,
    /// Side effects
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationBinding {
    Unbound,
    Entity(String),
    EntityCollection(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationParameter {
    pub name: String,
    /// Element type for collection parameters, the declared type otherwise
    #[serde(rename = "type")]
    pub ty: DeclaredType,
    pub is_collection: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReturnShape {
    Single(DeclaredType),
    Collection(DeclaredType),
    Entity {
        entity_type: String,
        entity_set: String,
    },
    EntityCollection {
        entity_type: String,
        entity_set: String,
    },
}

/// A function or action as exposed by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOperation {
    pub name: String,
    pub namespace: String,
    pub kind: OperationKind,
    pub binding: OperationBinding,
    pub is_composable: bool,
    pub parameters: Vec<OperationParameter>,
    /// `None` for void operations and for entity returns with no resolvable entity set
    pub return_shape: Option<ReturnShape>,
}

/// Immutable model snapshot produced by assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    namespace: String,
    container_name: String,
    types: Vec<TypeDescriptor>,
    enum_types: Vec<EnumTypeDescriptor>,
    entity_sets: Vec<EntitySetDescriptor>,
    singletons: Vec<SingletonDescriptor>,
    operations: Vec<ModelOperation>,
    navigation_bindings: Vec<NavigationBindingDescriptor>,
}

impl Model {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        namespace: String,
        container_name: String,
        types: Vec<TypeDescriptor>,
        enum_types: Vec<EnumTypeDescriptor>,
        entity_sets: Vec<EntitySetDescriptor>,
        singletons: Vec<SingletonDescriptor>,
        operations: Vec<ModelOperation>,
        navigation_bindings: Vec<NavigationBindingDescriptor>,
    ) -> Self {
        Model {
            namespace,
            container_name,
            types,
            enum_types,
            entity_sets,
            singletons,
            operations,
            navigation_bindings,
        }
    }

    pub fn empty(namespace: impl Into<String>, container_name: impl Into<String>) -> Self {
        Self::from_parts(
            namespace.into(),
            container_name.into(),
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
        )
    }

    /// No schema elements and no container elements
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.enum_types.is_empty()
            && self.entity_sets.is_empty()
            && self.singletons.is_empty()
            && self.operations.is_empty()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    pub fn enum_types(&self) -> &[EnumTypeDescriptor] {
        &self.enum_types
    }

    pub fn entity_sets(&self) -> &[EntitySetDescriptor] {
        &self.entity_sets
    }

    pub fn singletons(&self) -> &[SingletonDescriptor] {
        &self.singletons
    }

    pub fn operations(&self) -> &[ModelOperation] {
        &self.operations
    }

    pub fn navigation_bindings(&self) -> &[NavigationBindingDescriptor] {
        &self.navigation_bindings
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn find_enum_type(&self, name: &str) -> Option<&EnumTypeDescriptor> {
        self.enum_types.iter().find(|t| t.name == name)
    }

    pub fn find_entity_set(&self, name: &str) -> Option<&EntitySetDescriptor> {
        self.entity_sets.iter().find(|s| s.name == name)
    }

    pub fn find_singleton(&self, name: &str) -> Option<&SingletonDescriptor> {
        self.singletons.iter().find(|s| s.name == name)
    }

    /// Operations with the given name (bound overloads share a name)
    pub fn find_operations(&self, name: &str) -> Vec<&ModelOperation> {
        self.operations.iter().filter(|o| o.name == name).collect()
    }

    /// Resolve a container element name to a facet reference
    pub fn find_facet(&self, name: &str) -> Option<FacetRef> {
        if self.find_entity_set(name).is_some() {
            Some(FacetRef::EntitySet(name.to_string()))
        } else if self.find_singleton(name).is_some() {
            Some(FacetRef::Singleton(name.to_string()))
        } else {
            None
        }
    }

    /// Element type of an entity set, value type of a singleton
    pub fn facet_type(&self, facet: &FacetRef) -> Option<&str> {
        match facet {
            FacetRef::EntitySet(name) => self.find_entity_set(name).map(|s| s.element_type.as_str()),
            FacetRef::Singleton(name) => self.find_singleton(name).map(|s| s.type_name.as_str()),
        }
    }

    /// Names of all container elements, entity sets first
    pub fn container_element_names(&self) -> Vec<&str> {
        self.entity_sets
            .iter()
            .map(|s| s.name.as_str())
            .chain(self.singletons.iter().map(|s| s.name.as_str()))
            .collect()
    }

    /// Bindings declared on one facet, in binding order
    pub fn bindings_for(&self, source: &FacetRef) -> Vec<&NavigationBindingDescriptor> {
        self.navigation_bindings
            .iter()
            .filter(|b| &b.source == source)
            .collect()
    }

    /// Find a navigation property on a type or any of its ancestors
    pub fn find_navigation_property(
        &self,
        type_name: &str,
        property: &str,
    ) -> Option<&NavigationProperty> {
        let mut current = self.find_type(type_name);
        while let Some(ty) = current {
            if let Some(nav) = ty.navigation_properties.iter().find(|n| n.name == property) {
                return Some(nav);
            }
            current = ty.base_type.as_deref().and_then(|b| self.find_type(b));
        }
        None
    }
}
