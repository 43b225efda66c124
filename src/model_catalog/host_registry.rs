use std::collections::{HashMap, HashSet};

use super::config::{EnumTypeDefinition, HostTypeDefinition, StructuralTypeDefinition};
use super::errors::{ModelCatalogError, ModelCatalogResult};

/// Explicit registry of the declared host surface.
///
/// Stands in for runtime reflection: host types, structural types and enum
/// types are registered up front and looked up by name. Type names are
/// unique across all three kinds.
#[derive(Debug, Clone, Default)]
pub struct HostTypeRegistry {
    host_types: HashMap<String, HostTypeDefinition>,
    structural_types: HashMap<String, StructuralTypeDefinition>,
    enum_types: HashMap<String, EnumTypeDefinition>,
}

impl HostTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_unique(&self, name: &str) -> ModelCatalogResult<()> {
        if self.host_types.contains_key(name)
            || self.structural_types.contains_key(name)
            || self.enum_types.contains_key(name)
        {
            return Err(ModelCatalogError::DuplicateDeclaration {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    pub fn register_host_type(&mut self, definition: HostTypeDefinition) -> ModelCatalogResult<()> {
        self.ensure_unique(&definition.name)?;
        self.host_types.insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn register_structural_type(
        &mut self,
        definition: StructuralTypeDefinition,
    ) -> ModelCatalogResult<()> {
        self.ensure_unique(&definition.name)?;
        self.structural_types
            .insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn register_enum_type(&mut self, definition: EnumTypeDefinition) -> ModelCatalogResult<()> {
        self.ensure_unique(&definition.name)?;
        self.enum_types.insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn host_type(&self, name: &str) -> Option<&HostTypeDefinition> {
        self.host_types.get(name)
    }

    pub fn structural_type(&self, name: &str) -> Option<&StructuralTypeDefinition> {
        self.structural_types.get(name)
    }

    pub fn enum_type(&self, name: &str) -> Option<&EnumTypeDefinition> {
        self.enum_types.get(name)
    }

    /// Walk a host type's inheritance chain, most-derived first.
    ///
    /// The walk stops before `root_type`; a base that is neither declared nor
    /// the root is a fatal reflection error, as is a cycle.
    pub fn host_chain(
        &self,
        host_type: &str,
        root_type: &str,
    ) -> ModelCatalogResult<Vec<&HostTypeDefinition>> {
        let mut chain = Vec::new();
        if host_type == root_type {
            return Ok(chain);
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut current =
            self.host_types
                .get(host_type)
                .ok_or_else(|| ModelCatalogError::HostTypeNotFound {
                    host_type: host_type.to_string(),
                })?;

        loop {
            visited.insert(current.name.as_str());
            chain.push(current);

            let base = match current.base.as_deref() {
                None => break,
                Some(base) if base == root_type => break,
                Some(base) => base,
            };
            if visited.contains(base) {
                return Err(ModelCatalogError::InheritanceCycle {
                    host_type: host_type.to_string(),
                    revisited: base.to_string(),
                });
            }
            current =
                self.host_types
                    .get(base)
                    .ok_or_else(|| ModelCatalogError::BaseTypeNotFound {
                        host_type: current.name.clone(),
                        base_type: base.to_string(),
                    })?;
        }

        Ok(chain)
    }

    /// Names of `host_type` and its ancestors below the root boundary
    pub fn host_lineage(&self, host_type: &str, root_type: &str) -> ModelCatalogResult<Vec<String>> {
        Ok(self
            .host_chain(host_type, root_type)?
            .into_iter()
            .map(|t| t.name.clone())
            .collect())
    }
}
