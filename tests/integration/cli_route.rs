//! Integration tests for CLI command routing

use contactlink::cli::{exit_code, map_error, Commands, ConfigCommands, RunContext};
use contactlink::config::{ContactLinkConfig, StoreBackend};
use contactlink::error::IdentifyError;
use tempfile::TempDir;

fn memory_context(workspace: &TempDir) -> RunContext {
    let mut config = ContactLinkConfig::default();
    config.store.backend = StoreBackend::Memory;
    RunContext::from_config(workspace.path().to_path_buf(), config).unwrap()
}

fn identify(email: Option<&str>, phone: Option<&str>, format: &str) -> Commands {
    Commands::Identify {
        email: email.map(str::to_string),
        phone_number: phone.map(str::to_string),
        format: format.to_string(),
    }
}

#[test]
fn test_identify_prints_contact_envelope() {
    let workspace = TempDir::new().unwrap();
    let context = memory_context(&workspace);

    context.execute(&identify(Some("a@x.com"), Some("111"), "json")).unwrap();
    let output = context
        .execute(&identify(Some("a@x.com"), Some("222"), "json"))
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "contact": {
                "primaryContactId": 1,
                "emails": ["a@x.com"],
                "phoneNumbers": ["111", "222"],
                "secondaryContactIds": [2]
            }
        })
    );
}

#[test]
fn test_identify_without_identifiers_exits_with_validation_code() {
    let workspace = TempDir::new().unwrap();
    let context = memory_context(&workspace);

    let err = context.execute(&identify(None, Some("   "), "json")).unwrap_err();
    assert!(matches!(err, IdentifyError::Validation(_)));
    assert_eq!(exit_code(&err), 2);
    assert!(map_error(&err).contains("Either email or phoneNumber must be provided."));
}

#[test]
fn test_show_unknown_contact_fails() {
    let workspace = TempDir::new().unwrap();
    let context = memory_context(&workspace);

    let err = context
        .execute(&Commands::Show {
            id: 9,
            format: "json".to_string(),
        })
        .unwrap_err();
    assert_eq!(exit_code(&err), 1);
}

#[test]
fn test_list_shows_every_contact() {
    let workspace = TempDir::new().unwrap();
    let context = memory_context(&workspace);
    context.execute(&identify(Some("a@x.com"), None, "json")).unwrap();
    context.execute(&identify(None, Some("222"), "json")).unwrap();

    let output = context
        .execute(&Commands::List {
            format: "json".to_string(),
        })
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(value[1]["phoneNumber"], "222");

    let table = context
        .execute(&Commands::List {
            format: "text".to_string(),
        })
        .unwrap();
    assert!(table.contains("a@x.com"));
    assert!(table.contains("primary"));
}

#[test]
fn test_config_show_renders_toml() {
    let workspace = TempDir::new().unwrap();
    let context = memory_context(&workspace);

    let output = context
        .execute(&Commands::Config {
            command: ConfigCommands::Show,
        })
        .unwrap();
    let parsed: toml::Value = toml::from_str(&output).unwrap();
    assert_eq!(parsed["store"]["backend"].as_str(), Some("memory"));
    assert_eq!(parsed["logging"]["output"].as_str(), Some("stderr"));
}

#[test]
fn test_sled_backend_creates_store_under_workspace() {
    let workspace = TempDir::new().unwrap();
    let context =
        RunContext::from_config(workspace.path().to_path_buf(), ContactLinkConfig::default())
            .unwrap();
    context.execute(&identify(Some("a@x.com"), None, "text")).unwrap();

    assert!(workspace.path().join(".contactlink/store").is_dir());
    assert_eq!(context.service().contacts().unwrap().len(), 1);
}
