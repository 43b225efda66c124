use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use modelgraph::{
    config,
    conventions::{AssembledModel, ModelAssembler, ModelMapperChain, RegisteredModelExtender},
    model_catalog::{HostCatalogConfig, HostTypeRegistry},
    query_pipeline::{
        FacetAccessAuthorizer, InMemoryHost, QueryContext, QueryExpr, QueryExpressionPipeline,
    },
    store::{DocumentStore, DocumentStoreSourcer, QueryExecutor},
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

/// ModelGraph - convention-based model and query mapping
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Host catalog YAML file
    #[arg(long)]
    catalog: PathBuf,

    /// Host type to assemble the model for
    #[arg(long)]
    host: String,

    /// Engine configuration YAML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Namespace override for structural and enum types
    #[arg(long)]
    namespace: Option<String>,

    /// Host property to ignore (repeatable)
    #[arg(long = "ignore")]
    ignored_properties: Vec<String>,

    /// Host type where member scans stop
    #[arg(long)]
    root_type: Option<String>,

    /// Entity container name
    #[arg(long)]
    container_name: Option<String>,

    /// JSON query to rewrite (and execute when the catalog seeds a document store)
    #[arg(long)]
    query: Option<PathBuf>,

    /// Facet to deny access to (repeatable)
    #[arg(long = "deny")]
    denied_facets: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,
}

impl From<&Cli> for config::CliConfig {
    fn from(cli: &Cli) -> Self {
        config::CliConfig {
            namespace: cli.namespace.clone(),
            ignored_properties: cli.ignored_properties.clone(),
            root_type: cli.root_type.clone(),
            container_name: cli.container_name.clone(),
        }
    }
}

fn print<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<config::EngineConfig> {
    let mut engine_config = config::EngineConfig::from_env().context("Invalid environment configuration")?;
    if let Some(path) = &cli.config {
        engine_config.merge(
            config::EngineConfig::from_yaml_file(path)
                .with_context(|| format!("Invalid configuration file {}", path.display()))?,
        );
    }
    engine_config.merge(config::EngineConfig::from_cli(cli.into()).context("Invalid CLI configuration")?);
    Ok(engine_config)
}

/// Host instance for the catalog's `host_values`: statics go to the context, the rest to the instance
fn query_context(
    catalog: &HostCatalogConfig,
    registry: &HostTypeRegistry,
    assembled: &AssembledModel,
    cli: &Cli,
    engine_config: &config::EngineConfig,
) -> Result<QueryContext> {
    let mapper = ModelMapperChain::new().with_conventions(assembled.catalog.clone());
    let lineage = registry.host_lineage(&cli.host, &engine_config.root_type)?;
    let is_static = |name: &str| {
        assembled
            .catalog
            .entity_set_property(name)
            .or_else(|| assembled.catalog.singleton_property(name))
            .is_some_and(|p| p.is_static)
    };

    let mut host = InMemoryHost::new(lineage);
    let mut statics = Vec::new();
    for (name, value) in &catalog.host_values {
        if engine_config.is_ignored(name) {
            continue;
        }
        if is_static(name) {
            statics.push((name.clone(), value.clone()));
        } else {
            host = host.with_value(name.clone(), value.clone());
        }
    }

    let mut context =
        QueryContext::new(assembled.model.clone(), Arc::new(mapper)).with_host(Arc::new(host));
    for (name, value) in statics {
        context = context.with_static(name, value);
    }
    Ok(context)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let engine_config = load_config(&cli)?;

    let catalog = HostCatalogConfig::from_yaml_file(&cli.catalog)
        .with_context(|| format!("Failed to load host catalog {}", cli.catalog.display()))?;
    let registry = Arc::new(catalog.to_registry()?);

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupt received, cancelling");
            ctrl_c_token.cancel();
        }
    });

    let assembler = ModelAssembler::new(registry.clone())
        .with_extender(Arc::new(RegisteredModelExtender::new(catalog.model.clone())));
    let assembled = assembler
        .assemble(&cli.host, &engine_config, &cancel)
        .await
        .with_context(|| format!("Failed to assemble model for `{}`", cli.host))?;

    let Some(query_path) = &cli.query else {
        return print(assembled.model.as_ref(), cli.output);
    };

    let query_text = std::fs::read_to_string(query_path)
        .with_context(|| format!("Failed to read query {}", query_path.display()))?;
    let query: QueryExpr = serde_json::from_str(&query_text).context("Query is not a valid AST")?;

    let mut pipeline = QueryExpressionPipeline::new().with_conventions(assembled.catalog.clone());
    if !cli.denied_facets.is_empty() {
        pipeline = pipeline.with_authorizer(Arc::new(FacetAccessAuthorizer::deny(
            cli.denied_facets.iter().cloned(),
        )));
    }
    if let Some(definition) = &catalog.document_store {
        pipeline = pipeline.with_sourcer(Arc::new(DocumentStoreSourcer::from_definition(definition)));
    }

    let context = query_context(&catalog, &registry, &assembled, &cli, &engine_config)?;
    let rewritten = pipeline.compose(&query, &context)?;
    print(&rewritten, cli.output)?;

    if let Some(definition) = &catalog.document_store {
        let store = DocumentStore::from_definition(definition);
        let result = store.execute_query(&rewritten, &cancel).await?;
        print(&result, cli.output)?;
    }
    Ok(())
}
