use std::collections::HashSet;

use crate::model_catalog::{
    DeclaredType, HostTypeRegistry, ModelBuilder, ModelCatalogResult, ModelOperation,
    OperationBinding, OperationKind, OperationParameter, ParameterDefinition, ReturnShape,
};

/// A marked host method as scanned
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub name: String,
    pub method_name: String,
    pub namespace: Option<String>,
    pub is_bound: bool,
    pub has_side_effects: bool,
    pub is_composable: bool,
    pub parameters: Vec<ParameterDefinition>,
    pub returns: DeclaredType,
    /// Entity set the returned entities come from
    pub entity_set: Option<String>,
    pub declaring_type: String,
    pub is_static: bool,
}

pub struct OperationScanner<'r> {
    registry: &'r HostTypeRegistry,
    root_type: String,
}

impl<'r> OperationScanner<'r> {
    pub fn new(registry: &'r HostTypeRegistry, root_type: impl Into<String>) -> Self {
        OperationScanner {
            registry,
            root_type: root_type.into(),
        }
    }

    /// Every marked method on the host chain, any visibility, static or instance.
    ///
    /// A redeclared method name masks the base declaration.
    pub fn scan(&self, host_type: &str) -> ModelCatalogResult<Vec<OperationDescriptor>> {
        let chain = self.registry.host_chain(host_type, &self.root_type)?;

        let mut seen: HashSet<&str> = HashSet::new();
        let mut descriptors = Vec::new();
        for level in chain {
            for method in &level.methods {
                if !seen.insert(method.name.as_str()) {
                    continue;
                }
                let Some(marker) = &method.operation else {
                    continue;
                };
                descriptors.push(OperationDescriptor {
                    name: marker.name.clone().unwrap_or_else(|| method.name.clone()),
                    method_name: method.name.clone(),
                    namespace: marker.namespace.clone(),
                    is_bound: marker.is_bound,
                    has_side_effects: marker.has_side_effects,
                    is_composable: marker.is_composable,
                    parameters: method.parameters.clone(),
                    returns: method.returns.clone(),
                    entity_set: marker.entity_set.clone(),
                    declaring_type: level.name.clone(),
                    is_static: method.is_static,
                });
            }
        }
        Ok(descriptors)
    }
}

/// Attach scanned operations to the model; returns how many were added
pub fn attach_operations(descriptors: Vec<OperationDescriptor>, builder: &mut ModelBuilder<'_>) -> usize {
    let mut attached = 0;
    for descriptor in descriptors {
        match to_model_operation(&descriptor, builder) {
            Some(operation) => {
                log::debug!(
                    "Adding {:?} `{}.{}` ({:?})",
                    operation.kind,
                    operation.namespace,
                    operation.name,
                    operation.binding
                );
                builder.add_operation(operation);
                attached += 1;
            }
            None => log::debug!("Operation `{}` excluded from the model", descriptor.name),
        }
    }
    attached
}

fn to_model_operation(
    descriptor: &OperationDescriptor,
    builder: &ModelBuilder<'_>,
) -> Option<ModelOperation> {
    let kind = if descriptor.has_side_effects {
        OperationKind::Action
    } else {
        OperationKind::Function
    };

    let mut parameters = descriptor.parameters.iter();
    let binding = if descriptor.is_bound {
        // bound operations need a binding parameter
        let binding_parameter = parameters.next()?;
        binding_of(&binding_parameter.ty, builder)?
    } else {
        OperationBinding::Unbound
    };

    let parameters = parameters
        .map(|parameter| match parameter.ty.sequence_element() {
            Some(element) => OperationParameter {
                name: parameter.name.clone(),
                ty: element.clone(),
                is_collection: true,
            },
            None => OperationParameter {
                name: parameter.name.clone(),
                ty: parameter.ty.clone(),
                is_collection: false,
            },
        })
        .collect();

    Some(ModelOperation {
        name: descriptor.name.clone(),
        namespace: descriptor
            .namespace
            .clone()
            .unwrap_or_else(|| builder.namespace().to_string()),
        kind,
        binding,
        is_composable: kind == OperationKind::Function && descriptor.is_composable,
        parameters,
        return_shape: return_shape(descriptor, builder),
    })
}

fn binding_of(ty: &DeclaredType, builder: &ModelBuilder<'_>) -> Option<OperationBinding> {
    match ty.sequence_element() {
        Some(element) => {
            let name = element.reference_name()?;
            builder
                .is_entity_type(name)
                .then(|| OperationBinding::EntityCollection(name.to_string()))
        }
        None => {
            let name = ty.reference_name()?;
            builder
                .is_entity_type(name)
                .then(|| OperationBinding::Entity(name.to_string()))
        }
    }
}

fn return_shape(descriptor: &OperationDescriptor, builder: &ModelBuilder<'_>) -> Option<ReturnShape> {
    let returns = &descriptor.returns;
    if returns.is_void() {
        return None;
    }
    let (target, is_sequence) = match returns.sequence_element() {
        Some(element) => (element, true),
        None => (returns, false),
    };

    let entity_type = target.reference_name().filter(|name| builder.is_entity_type(name));
    let Some(entity_type) = entity_type else {
        return Some(if is_sequence {
            ReturnShape::Collection(target.clone())
        } else {
            ReturnShape::Single(target.clone())
        });
    };

    let entity_set = descriptor.entity_set.clone().or_else(|| {
        builder
            .entity_sets()
            .iter()
            .find(|set| set.element_type == entity_type)
            .map(|set| set.name.clone())
    });
    let Some(entity_set) = entity_set else {
        log::debug!(
            "No entity set returns `{}` for operation `{}`, omitting return annotation",
            entity_type,
            descriptor.name
        );
        return None;
    };

    let entity_type = entity_type.to_string();
    Some(if is_sequence {
        ReturnShape::EntityCollection {
            entity_type,
            entity_set,
        }
    } else {
        ReturnShape::Entity {
            entity_type,
            entity_set,
        }
    })
}
