use std::collections::HashSet;

use crate::model_catalog::{
    DeclaredType, HostTypeRegistry, ModelCatalogResult, PropertyDefinition, Visibility,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    /// `Queryable<E>` with a reference element type
    EntitySet { element_type: String },
    /// A non-generic reference type
    Singleton { value_type: String },
    Ignored,
}

/// A scanned host property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub declared_type: DeclaredType,
    pub kind: PropertyKind,
    pub is_static: bool,
    /// Host type that declared the winning property
    pub declaring_type: String,
}

/// Result of one property scan, consumed once by the assembler
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyScan {
    host_type: String,
    descriptors: Vec<PropertyDescriptor>,
}

impl PropertyScan {
    pub fn host_type(&self) -> &str {
        &self.host_type
    }

    pub fn descriptors(&self) -> &[PropertyDescriptor] {
        &self.descriptors
    }

    pub fn into_descriptors(self) -> Vec<PropertyDescriptor> {
        self.descriptors
    }
}

pub struct PropertyScanner<'r> {
    registry: &'r HostTypeRegistry,
    root_type: String,
}

impl<'r> PropertyScanner<'r> {
    pub fn new(registry: &'r HostTypeRegistry, root_type: impl Into<String>) -> Self {
        PropertyScanner {
            registry,
            root_type: root_type.into(),
        }
    }

    /// Collect publicly readable properties from `host_type` up to the root boundary.
    ///
    /// The most-derived declaration of a name wins regardless of its type.
    /// Ignored names mask base declarations but yield no descriptor.
    pub fn scan(&self, host_type: &str, ignored: &[String]) -> ModelCatalogResult<PropertyScan> {
        let chain = self.registry.host_chain(host_type, &self.root_type)?;

        let mut seen: HashSet<&str> = HashSet::new();
        let mut descriptors = Vec::new();
        for level in chain {
            for property in &level.properties {
                if property.visibility != Visibility::Public || !property.readable {
                    continue;
                }
                if !seen.insert(property.name.as_str()) {
                    log::trace!(
                        "{}.{} masked by a more-derived declaration",
                        level.name,
                        property.name
                    );
                    continue;
                }
                if ignored.iter().any(|name| name == &property.name) {
                    continue;
                }
                descriptors.push(PropertyDescriptor {
                    name: property.name.clone(),
                    declared_type: property.ty.clone(),
                    kind: classify(property),
                    is_static: property.is_static,
                    declaring_type: level.name.clone(),
                });
            }
        }

        log::debug!(
            "Scanned {} propert(ies) on host type `{}`",
            descriptors.len(),
            host_type
        );
        Ok(PropertyScan {
            host_type: host_type.to_string(),
            descriptors,
        })
    }
}

fn classify(property: &PropertyDefinition) -> PropertyKind {
    match &property.ty {
        DeclaredType::Queryable(element) => match element.reference_name() {
            Some(element_type) => PropertyKind::EntitySet {
                element_type: element_type.to_string(),
            },
            None => PropertyKind::Ignored,
        },
        DeclaredType::Reference(value_type) => PropertyKind::Singleton {
            value_type: value_type.clone(),
        },
        _ => PropertyKind::Ignored,
    }
}
