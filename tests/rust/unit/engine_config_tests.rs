use std::env;
use std::io::Write;

use modelgraph::config::{CliConfig, ConfigError, EngineConfig, DEFAULT_ROOT_TYPE};
use serial_test::serial;
use tempfile::NamedTempFile;

const ENV_VARS: &[&str] = &[
    "MODELGRAPH_NAMESPACE",
    "MODELGRAPH_IGNORED_PROPERTIES",
    "MODELGRAPH_ROOT_TYPE",
    "MODELGRAPH_CONTAINER_NAME",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_env_then_file_then_cli_layering() {
    clear_env();
    env::set_var("MODELGRAPH_IGNORED_PROPERTIES", "Invisible");
    env::set_var("MODELGRAPH_CONTAINER_NAME", "Trippin");
    let mut config = EngineConfig::from_env().unwrap();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "namespace: Trippin.Models\nignored_properties: [Secrets]").unwrap();
    config.merge(EngineConfig::from_yaml_file(file.path()).unwrap());

    config.merge(
        EngineConfig::from_cli(CliConfig {
            namespace: Some("Sample".to_string()),
            ignored_properties: vec!["Invisible".to_string()],
            ..Default::default()
        })
        .unwrap(),
    );

    assert_eq!(config.namespace.as_deref(), Some("Sample"));
    assert_eq!(config.ignored_properties, vec!["Invisible", "Secrets"]);
    assert_eq!(config.container_name, "Trippin");
    assert_eq!(config.root_type, DEFAULT_ROOT_TYPE);
    clear_env();
}

#[test]
#[serial]
fn test_env_namespace_validated() {
    clear_env();
    env::set_var("MODELGRAPH_NAMESPACE", "not a namespace");
    assert!(matches!(
        EngineConfig::from_env(),
        Err(ConfigError::Validation(_))
    ));
    clear_env();
}

#[test]
fn test_yaml_with_empty_container_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "container_name: \"\"").unwrap();
    assert!(matches!(
        EngineConfig::from_yaml_file(file.path()),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn test_malformed_yaml_is_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "ignored_properties: {{ nope").unwrap();
    assert!(matches!(
        EngineConfig::from_yaml_file(file.path()),
        Err(ConfigError::Parse { .. })
    ));
}
