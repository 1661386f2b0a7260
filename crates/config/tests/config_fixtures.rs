//! Integration tests for parsing config fixtures from the workspace testkit.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tombstone_config::{
    CURRENT_CONFIG_VERSION, SyncTriggerKind, TombstoneConfig, TombstoneEnv,
    load_tombstone_config_from_path, parse_tombstone_config_json, parse_tombstone_config_toml,
    to_pretty_json,
};
use tombstone_domain::OnItemFailure;
use tombstone_shared::ErrorCode;

fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest_dir.to_path_buf())
}

fn fixture_path(relative: &str) -> PathBuf {
    workspace_root()
        .join("crates")
        .join("testkit")
        .join("fixtures")
        .join(relative)
}

fn read_fixture(relative: &str) -> Result<String, Box<dyn Error>> {
    Ok(fs::read_to_string(fixture_path(relative))?)
}

#[test]
fn parses_valid_fixture_and_normalizes() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/tombstone-config.valid.json")?;
    let config = parse_tombstone_config_json(&contents)?;

    assert_eq!(config.version, CURRENT_CONFIG_VERSION);
    assert_eq!(
        &*config.vault.config_dir, ".obsidian",
        "configDir should be trimmed"
    );
    assert_eq!(
        config.session_id().map(|id| id.as_str()),
        Some("9f3c2a71-vault")
    );
    assert_eq!(config.sync.trigger, SyncTriggerKind::Command);
    assert_eq!(config.sync.command, vec!["obsidian-cli", "exec"]);
    assert_eq!(config.on_item_failure(), OnItemFailure::Continue);

    let root = config
        .vault
        .root
        .clone()
        .ok_or_else(|| std::io::Error::other("vault root missing"))?;
    assert_eq!(
        config.history_store_path(&root),
        PathBuf::from("/vaults/work/.obsidian/plugins/remotely-save/file-history.json")
    );
    Ok(())
}

#[test]
fn parses_default_toml_fixture() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/tombstone-config.default.toml")?;
    let config = parse_tombstone_config_toml(&contents)?;

    assert_eq!(config.as_ref(), &TombstoneConfig::default());
    assert!(config.session_id().is_none());
    Ok(())
}

#[test]
fn invalid_fixture_reports_session_id() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/tombstone-config.invalid.json")?;
    let error = parse_tombstone_config_json(&contents)
        .err()
        .ok_or_else(|| std::io::Error::other("expected invalid config error"))?;

    assert_eq!(error.code, ErrorCode::new("config", "invalid_session_id"));
    assert_eq!(error.metadata_value("field"), Some("sessionId"));
    Ok(())
}

#[test]
fn loads_toml_by_extension() -> Result<(), Box<dyn Error>> {
    let path = fixture_path("config/tombstone-config.default.toml");
    let config = load_tombstone_config_from_path(
        Some(&path),
        Some(r#"{"sync":{"sessionId":"override"}}"#),
        &TombstoneEnv::default(),
    )?;
    assert_eq!(config.session_id().map(|id| id.as_str()), Some("override"));
    Ok(())
}

#[test]
fn missing_config_file_is_not_found() {
    let path = fixture_path("config/does-not-exist.json");
    let error = load_tombstone_config_from_path(Some(&path), None, &TombstoneEnv::default()).err();
    assert!(error.is_some_and(|error| {
        error.code == ErrorCode::new("config", "config_file_not_found")
    }));
}

#[test]
fn pretty_json_is_stable_and_reparses() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/tombstone-config.valid.json")?;
    let config = parse_tombstone_config_json(&contents)?;
    let first = to_pretty_json(config.as_ref())?;
    let reparsed = parse_tombstone_config_json(&first)?;
    let second = to_pretty_json(reparsed.as_ref())?;

    assert_eq!(first, second);
    assert!(first.ends_with('\n'));
    Ok(())
}
