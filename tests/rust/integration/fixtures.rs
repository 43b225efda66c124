use std::sync::Arc;

use modelgraph::config::EngineConfig;
use modelgraph::conventions::{AssembledModel, ModelAssembler, RegisteredModelExtender};
use modelgraph::model_catalog::{HostCatalogConfig, HostTypeRegistry};
use tokio_util::sync::CancellationToken;

pub const TRIPPIN: &str = include_str!("../../../demos/trippin.yaml");

pub fn trippin() -> (HostCatalogConfig, Arc<HostTypeRegistry>) {
    catalog(TRIPPIN)
}

pub fn catalog(yaml: &str) -> (HostCatalogConfig, Arc<HostTypeRegistry>) {
    let catalog = HostCatalogConfig::from_yaml_str(yaml).unwrap();
    let registry = Arc::new(catalog.to_registry().unwrap());
    (catalog, registry)
}

pub fn ignoring(names: &[&str]) -> EngineConfig {
    EngineConfig {
        ignored_properties: names.iter().map(|n| n.to_string()).collect(),
        ..EngineConfig::default()
    }
}

/// Assemble the catalog's host with its registrations applied
pub async fn assemble(
    catalog: &HostCatalogConfig,
    registry: Arc<HostTypeRegistry>,
    host: &str,
    config: &EngineConfig,
) -> AssembledModel {
    ModelAssembler::new(registry)
        .with_extender(Arc::new(RegisteredModelExtender::new(catalog.model.clone())))
        .assemble(host, config, &CancellationToken::new())
        .await
        .unwrap()
}
