//! Model assembly.
//!
//! Orchestrates the inner provider chain, preparers, extenders, the
//! property and operation scanners and the navigation binder into one
//! immutable [`Model`] plus the [`ConventionCatalog`] of facet-backing host
//! properties.
//!
//! Phases, each preceded by a cancellation check:
//!
//! 1. inner [`ModelProvider`]s; the first non-empty model wins unchanged
//! 2. [`ModelPreparer`]s, then [`ModelExtender`]s
//! 3. property scan and facet registration
//! 4. operation scan
//! 5. namespace override
//! 6. navigation binding

use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::catalog::{ConventionCatalog, FacetProperty};
use super::navigation_binder::NavigationBinder;
use super::operation_scanner::{attach_operations, OperationScanner};
use super::property_scanner::{PropertyKind, PropertyScan, PropertyScanner};
use crate::chain::HandlerChain;
use crate::config::EngineConfig;
use crate::model_catalog::{
    FacetOrigin, HostTypeRegistry, Model, ModelBuilder, ModelCatalogError, ModelCatalogResult,
    ModelRegistrationDefinition,
};

/// Build-time state shared with providers and preparers
#[derive(Debug)]
pub struct ModelContext<'a> {
    pub registry: &'a HostTypeRegistry,
    pub host_type: &'a str,
    pub config: &'a EngineConfig,
    /// Entity set name to element type, filled by preparers
    pub entity_set_type_map: BTreeMap<String, String>,
    /// Key properties per entity type, filled by preparers
    pub type_key_properties: BTreeMap<String, Vec<String>>,
}

impl<'a> ModelContext<'a> {
    pub fn new(registry: &'a HostTypeRegistry, host_type: &'a str, config: &'a EngineConfig) -> Self {
        ModelContext {
            registry,
            host_type,
            config,
            entity_set_type_map: BTreeMap::new(),
            type_key_properties: BTreeMap::new(),
        }
    }
}

/// Supplies a complete model ahead of convention building
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn get_model(
        &self,
        context: &ModelContext<'_>,
        cancel: &CancellationToken,
    ) -> ModelCatalogResult<Option<Model>>;
}

/// Fills the context with entity sets and keys from a backing store
#[async_trait]
pub trait ModelPreparer: Send + Sync {
    async fn prepare(
        &self,
        context: &mut ModelContext<'_>,
        cancel: &CancellationToken,
    ) -> ModelCatalogResult<()>;
}

/// Pre-registers types and facets before conventions run
pub trait ModelExtender: Send + Sync {
    fn extend(&self, builder: &mut ModelBuilder<'_>) -> ModelCatalogResult<()>;
}

/// Applies the `model:` section of a host catalog
pub struct RegisteredModelExtender {
    registration: ModelRegistrationDefinition,
}

impl RegisteredModelExtender {
    pub fn new(registration: ModelRegistrationDefinition) -> Self {
        RegisteredModelExtender { registration }
    }
}

impl ModelExtender for RegisteredModelExtender {
    fn extend(&self, builder: &mut ModelBuilder<'_>) -> ModelCatalogResult<()> {
        for type_name in &self.registration.types {
            builder.add_structural_type(type_name);
        }
        for facet in &self.registration.entity_sets {
            builder.add_structural_type(&facet.type_name);
            builder.add_entity_set(&facet.name, &facet.type_name, FacetOrigin::Registered);
        }
        for facet in &self.registration.singletons {
            builder.add_structural_type(&facet.type_name);
            builder.add_singleton(&facet.name, &facet.type_name, FacetOrigin::Registered);
        }
        for (type_name, keys) in &self.registration.keys {
            builder.add_structural_type(type_name);
            for key in keys {
                builder.has_key(type_name, key);
            }
        }
        Ok(())
    }
}

/// Result of assembly
#[derive(Debug, Clone)]
pub struct AssembledModel {
    pub model: Arc<Model>,
    pub catalog: Arc<ConventionCatalog>,
}

pub struct ModelAssembler {
    registry: Arc<HostTypeRegistry>,
    providers: HandlerChain<dyn ModelProvider>,
    preparers: Vec<Arc<dyn ModelPreparer>>,
    extenders: Vec<Arc<dyn ModelExtender>>,
}

fn check_cancelled(cancel: &CancellationToken) -> ModelCatalogResult<()> {
    if cancel.is_cancelled() {
        return Err(ModelCatalogError::Cancelled);
    }
    Ok(())
}

impl ModelAssembler {
    pub fn new(registry: Arc<HostTypeRegistry>) -> Self {
        ModelAssembler {
            registry,
            providers: HandlerChain::new(),
            preparers: vec![],
            extenders: vec![],
        }
    }

    pub fn registry(&self) -> &Arc<HostTypeRegistry> {
        &self.registry
    }

    pub fn with_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_preparer(mut self, preparer: Arc<dyn ModelPreparer>) -> Self {
        self.preparers.push(preparer);
        self
    }

    pub fn with_extender(mut self, extender: Arc<dyn ModelExtender>) -> Self {
        self.extenders.push(extender);
        self
    }

    pub async fn assemble(
        &self,
        host_type: &str,
        config: &EngineConfig,
        cancel: &CancellationToken,
    ) -> ModelCatalogResult<AssembledModel> {
        check_cancelled(cancel)?;
        let registry = self.registry.as_ref();
        let host = registry
            .host_type(host_type)
            .ok_or_else(|| ModelCatalogError::HostTypeNotFound {
                host_type: host_type.to_string(),
            })?;
        let namespace = config
            .namespace
            .clone()
            .unwrap_or_else(|| host.namespace.clone());
        let property_scanner = PropertyScanner::new(registry, config.root_type.as_str());

        let mut context = ModelContext::new(registry, host_type, config);

        for provider in self.providers.iter() {
            check_cancelled(cancel)?;
            let Some(model) = provider.get_model(&context, cancel).await? else {
                continue;
            };
            if model.is_empty() {
                continue;
            }
            log::info!(
                "Model provider `{}` supplied the model for `{}`",
                provider.name(),
                host_type
            );
            let scan = property_scanner.scan(host_type, &config.ignored_properties)?;
            let catalog = catalog_for_model(scan, &model);
            return Ok(AssembledModel {
                model: Arc::new(model),
                catalog: Arc::new(catalog),
            });
        }

        for preparer in &self.preparers {
            check_cancelled(cancel)?;
            preparer.prepare(&mut context, cancel).await?;
        }

        let mut builder = ModelBuilder::new(registry, namespace, config.container_name.as_str());
        for (name, type_name) in mem::take(&mut context.entity_set_type_map) {
            builder.add_structural_type(&type_name);
            builder.add_entity_set(&name, &type_name, FacetOrigin::Registered);
        }
        for (type_name, keys) in mem::take(&mut context.type_key_properties) {
            builder.add_structural_type(&type_name);
            for key in keys {
                builder.has_key(&type_name, &key);
            }
        }
        for extender in &self.extenders {
            check_cancelled(cancel)?;
            extender.extend(&mut builder)?;
        }

        check_cancelled(cancel)?;
        let scan = property_scanner.scan(host_type, &config.ignored_properties)?;
        let catalog = register_facets(scan, &mut builder);

        check_cancelled(cancel)?;
        let operations = OperationScanner::new(registry, config.root_type.as_str()).scan(host_type)?;
        let operation_count = attach_operations(operations, &mut builder);

        if let Some(namespace) = &config.namespace {
            builder.apply_namespace_override(namespace);
        }

        check_cancelled(cancel)?;
        let binding_count = NavigationBinder::bind(&mut builder);

        let model = builder.build();
        log::info!(
            "Assembled model for `{}`: {} type(s), {} entity set(s), {} singleton(s), {} operation(s), {} binding(s)",
            host_type,
            model.types().len(),
            model.entity_sets().len(),
            model.singletons().len(),
            operation_count,
            binding_count
        );

        Ok(AssembledModel {
            model: Arc::new(model),
            catalog: Arc::new(catalog),
        })
    }
}

/// Promote scanned candidates to facets and record the backing properties
fn register_facets(scan: PropertyScan, builder: &mut ModelBuilder<'_>) -> ConventionCatalog {
    let mut catalog = ConventionCatalog::new(scan.host_type());
    for descriptor in scan.into_descriptors() {
        let origin = if descriptor.is_static {
            FacetOrigin::Static
        } else {
            FacetOrigin::Instance
        };
        match descriptor.kind {
            PropertyKind::EntitySet { element_type } => {
                builder.add_entity_set(&descriptor.name, &element_type, origin);
                if builder
                    .find_entity_set(&descriptor.name)
                    .is_some_and(|s| s.element_type == element_type)
                {
                    catalog.entity_set_properties.push(FacetProperty {
                        facet: descriptor.name,
                        element_type,
                        is_static: descriptor.is_static,
                    });
                }
            }
            PropertyKind::Singleton { value_type } => {
                builder.add_singleton(&descriptor.name, &value_type, origin);
                if builder
                    .singletons()
                    .iter()
                    .any(|s| s.name == descriptor.name && s.type_name == value_type)
                {
                    catalog.singleton_properties.push(FacetProperty {
                        facet: descriptor.name,
                        element_type: value_type,
                        is_static: descriptor.is_static,
                    });
                }
            }
            PropertyKind::Ignored => {}
        }
    }
    catalog
}

/// Catalog entries for a provider-supplied model: only facets it actually contains
fn catalog_for_model(scan: PropertyScan, model: &Model) -> ConventionCatalog {
    let mut catalog = ConventionCatalog::new(scan.host_type());
    for descriptor in scan.into_descriptors() {
        match descriptor.kind {
            PropertyKind::EntitySet { element_type } => {
                if model
                    .find_entity_set(&descriptor.name)
                    .is_some_and(|s| s.element_type == element_type)
                {
                    catalog.entity_set_properties.push(FacetProperty {
                        facet: descriptor.name,
                        element_type,
                        is_static: descriptor.is_static,
                    });
                }
            }
            PropertyKind::Singleton { value_type } => {
                if model
                    .find_singleton(&descriptor.name)
                    .is_some_and(|s| s.type_name == value_type)
                {
                    catalog.singleton_properties.push(FacetProperty {
                        facet: descriptor.name,
                        element_type: value_type,
                        is_static: descriptor.is_static,
                    });
                }
            }
            PropertyKind::Ignored => {}
        }
    }
    catalog
}
