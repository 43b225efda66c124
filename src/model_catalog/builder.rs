use std::collections::BTreeMap;

use super::config::{StructuralKind, StructuralTypeDefinition};
use super::declared_type::DeclaredType;
use super::host_registry::HostTypeRegistry;
use super::model::{
    EntitySetDescriptor, EnumTypeDescriptor, FacetOrigin, FacetRef, Model, ModelOperation,
    NavigationBindingDescriptor, NavigationProperty, SingletonDescriptor, StructuralProperty,
    TypeDescriptor,
};

/// A structural type registered in the in-progress model
#[derive(Debug, Clone)]
struct PendingType {
    name: String,
    namespace: String,
    kind: StructuralKind,
    base_type: Option<String>,
    keys: Vec<String>,
}

/// Mutable model under construction.
///
/// Types are pulled from the [`HostTypeRegistry`] on demand: registering a
/// structural type also registers its base type, the structural and enum
/// types its properties reference. Facets are only accepted for types that
/// are already registered.
pub struct ModelBuilder<'r> {
    registry: &'r HostTypeRegistry,
    namespace: String,
    container_name: String,
    types: BTreeMap<String, PendingType>,
    enum_types: BTreeMap<String, EnumTypeDescriptor>,
    entity_sets: Vec<EntitySetDescriptor>,
    singletons: Vec<SingletonDescriptor>,
    operations: Vec<ModelOperation>,
    bindings: Vec<NavigationBindingDescriptor>,
}

impl<'r> ModelBuilder<'r> {
    pub fn new(
        registry: &'r HostTypeRegistry,
        namespace: impl Into<String>,
        container_name: impl Into<String>,
    ) -> Self {
        ModelBuilder {
            registry,
            namespace: namespace.into(),
            container_name: container_name.into(),
            types: BTreeMap::new(),
            enum_types: BTreeMap::new(),
            entity_sets: vec![],
            singletons: vec![],
            operations: vec![],
            bindings: vec![],
        }
    }

    pub fn registry(&self) -> &'r HostTypeRegistry {
        self.registry
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Register a structural type and everything it reaches.
    ///
    /// Returns false when the registry has no such structural type.
    pub fn add_structural_type(&mut self, name: &str) -> bool {
        if self.types.contains_key(name) {
            return true;
        }
        let registry = self.registry;
        let Some(definition) = registry.structural_type(name) else {
            log::debug!("Structural type `{}` is not declared, not registering", name);
            return false;
        };

        // Insert before recursing so self-referencing types terminate
        self.types.insert(
            name.to_string(),
            PendingType {
                name: definition.name.clone(),
                namespace: definition.namespace.clone(),
                kind: definition.kind,
                base_type: None,
                keys: definition.keys.clone(),
            },
        );

        if let Some(base) = definition.base.as_deref() {
            if self.add_structural_type(base) {
                if let Some(pending) = self.types.get_mut(name) {
                    pending.base_type = Some(base.to_string());
                }
            }
        }

        for property in &definition.properties {
            if let DeclaredType::Reference(referenced) = property.ty.element_or_self() {
                if registry.enum_type(referenced).is_some() {
                    self.add_enum_type(referenced);
                } else if registry.structural_type(referenced).is_some() {
                    self.add_structural_type(referenced);
                }
            }
        }
        true
    }

    pub fn add_enum_type(&mut self, name: &str) -> bool {
        if self.enum_types.contains_key(name) {
            return true;
        }
        match self.registry.enum_type(name) {
            Some(definition) => {
                self.enum_types.insert(
                    name.to_string(),
                    EnumTypeDescriptor {
                        name: definition.name.clone(),
                        namespace: definition.namespace.clone(),
                        members: definition.members.clone(),
                    },
                );
                true
            }
            None => false,
        }
    }

    pub fn is_structural_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn is_entity_type(&self, name: &str) -> bool {
        self.types
            .get(name)
            .is_some_and(|t| t.kind == StructuralKind::Entity)
    }

    /// Add a key property to a registered entity type
    pub fn has_key(&mut self, type_name: &str, key: &str) -> bool {
        match self.types.get_mut(type_name) {
            Some(pending) if pending.kind == StructuralKind::Entity => {
                if !pending.keys.iter().any(|k| k == key) {
                    pending.keys.push(key.to_string());
                }
                true
            }
            _ => false,
        }
    }

    fn facet_name_taken(&self, name: &str) -> bool {
        self.entity_sets.iter().any(|s| s.name == name)
            || self.singletons.iter().any(|s| s.name == name)
    }

    /// Add an entity set; skipped when the name is taken or the element type is unregistered
    pub fn add_entity_set(&mut self, name: &str, element_type: &str, origin: FacetOrigin) -> bool {
        if self.facet_name_taken(name) {
            log::debug!("Facet `{}` already exists, leaving it untouched", name);
            return false;
        }
        if !self.is_structural_type(element_type) {
            log::debug!(
                "Entity set `{}` skipped: element type `{}` is not registered",
                name,
                element_type
            );
            return false;
        }
        self.entity_sets.push(EntitySetDescriptor {
            name: name.to_string(),
            element_type: element_type.to_string(),
            origin,
        });
        true
    }

    /// Add a singleton; skipped when the name is taken or the type is unregistered
    pub fn add_singleton(&mut self, name: &str, type_name: &str, origin: FacetOrigin) -> bool {
        if self.facet_name_taken(name) {
            log::debug!("Facet `{}` already exists, leaving it untouched", name);
            return false;
        }
        if !self.is_structural_type(type_name) {
            log::debug!(
                "Singleton `{}` skipped: type `{}` is not registered",
                name,
                type_name
            );
            return false;
        }
        self.singletons.push(SingletonDescriptor {
            name: name.to_string(),
            type_name: type_name.to_string(),
            origin,
        });
        true
    }

    pub fn entity_sets(&self) -> &[EntitySetDescriptor] {
        &self.entity_sets
    }

    pub fn singletons(&self) -> &[SingletonDescriptor] {
        &self.singletons
    }

    pub fn find_entity_set(&self, name: &str) -> Option<&EntitySetDescriptor> {
        self.entity_sets.iter().find(|s| s.name == name)
    }

    pub fn base_type_of(&self, name: &str) -> Option<&str> {
        self.types.get(name).and_then(|t| t.base_type.as_deref())
    }

    /// Registered ancestors, nearest first
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let mut ancestors = Vec::new();
        let mut current = self.base_type_of(name);
        while let Some(base) = current {
            if base == name || ancestors.iter().any(|a| a == base) {
                break;
            }
            ancestors.push(base.to_string());
            current = self.base_type_of(base);
        }
        ancestors
    }

    /// Registered descendants, breadth first, in name order per level
    pub fn derived_types(&self, name: &str) -> Vec<String> {
        let mut derived: Vec<String> = Vec::new();
        let mut frontier = vec![name.to_string()];
        while let Some(parent) = frontier.pop() {
            for child in self
                .types
                .values()
                .filter(|t| t.base_type.as_deref() == Some(parent.as_str()))
            {
                if child.name != name && !derived.contains(&child.name) {
                    derived.push(child.name.clone());
                    frontier.insert(0, child.name.clone());
                }
            }
        }
        derived
    }

    fn definition(&self, name: &str) -> Option<&'r StructuralTypeDefinition> {
        if self.types.contains_key(name) {
            self.registry.structural_type(name)
        } else {
            None
        }
    }

    /// Navigation properties declared directly on a registered type
    pub fn navigation_properties(&self, type_name: &str) -> Vec<NavigationProperty> {
        let Some(definition) = self.definition(type_name) else {
            return vec![];
        };
        definition
            .properties
            .iter()
            .filter_map(|property| {
                let target = property.ty.element_or_self().reference_name()?;
                if !self.is_entity_type(target) {
                    return None;
                }
                Some(NavigationProperty {
                    name: property.name.clone(),
                    target_type: target.to_string(),
                    is_collection: property.ty.sequence_element().is_some(),
                    singleton_target: property.singleton_target,
                })
            })
            .collect()
    }

    fn structural_properties(&self, type_name: &str) -> Vec<StructuralProperty> {
        let Some(definition) = self.definition(type_name) else {
            return vec![];
        };
        definition
            .properties
            .iter()
            .filter(|property| match property.ty.element_or_self() {
                DeclaredType::Primitive(_) => true,
                DeclaredType::Reference(name) => {
                    self.enum_types.contains_key(name)
                        || (self.is_structural_type(name) && !self.is_entity_type(name))
                }
                _ => false,
            })
            .map(|property| StructuralProperty {
                name: property.name.clone(),
                ty: property.ty.clone(),
            })
            .collect()
    }

    // Entity types without declared keys get `Id` or `<Type>Id` when present
    fn convention_keys(&self, pending: &PendingType) -> Vec<String> {
        if pending.kind != StructuralKind::Entity
            || !pending.keys.is_empty()
            || pending.base_type.is_some()
        {
            return pending.keys.clone();
        }
        let Some(definition) = self.definition(&pending.name) else {
            return vec![];
        };
        let type_key = format!("{}Id", pending.name);
        definition
            .properties
            .iter()
            .find(|p| {
                matches!(p.ty, DeclaredType::Primitive(_))
                    && (p.name.eq_ignore_ascii_case("Id") || p.name.eq_ignore_ascii_case(&type_key))
            })
            .map(|p| vec![p.name.clone()])
            .unwrap_or_default()
    }

    pub fn add_operation(&mut self, operation: ModelOperation) {
        self.operations.push(operation);
    }

    pub fn has_binding(&self, source: &FacetRef, declaring_type: &str, property: &str) -> bool {
        self.bindings.iter().any(|b| {
            &b.source == source
                && b.declaring_type == declaring_type
                && b.navigation_property == property
        })
    }

    /// Record a navigation binding unless one exists for the same source and property
    pub fn add_binding(&mut self, binding: NavigationBindingDescriptor) -> bool {
        if self.has_binding(
            &binding.source,
            &binding.declaring_type,
            &binding.navigation_property,
        ) {
            return false;
        }
        self.bindings.push(binding);
        true
    }

    /// Rewrite the namespace of every structural and enum type
    pub fn apply_namespace_override(&mut self, namespace: &str) {
        for pending in self.types.values_mut() {
            pending.namespace = namespace.to_string();
        }
        for enum_type in self.enum_types.values_mut() {
            enum_type.namespace = namespace.to_string();
        }
        self.namespace = namespace.to_string();
    }

    pub fn build(self) -> Model {
        let types = self
            .types
            .values()
            .map(|pending| TypeDescriptor {
                name: pending.name.clone(),
                namespace: pending.namespace.clone(),
                kind: pending.kind,
                base_type: pending.base_type.clone(),
                keys: self.convention_keys(pending),
                properties: self.structural_properties(&pending.name),
                navigation_properties: self.navigation_properties(&pending.name),
            })
            .collect();

        Model::from_parts(
            self.namespace,
            self.container_name,
            types,
            self.enum_types.into_values().collect(),
            self.entity_sets,
            self.singletons,
            self.operations,
            self.bindings,
        )
    }
}
