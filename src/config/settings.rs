//! Settings file loading and saving

use crate::config::Config;
use crate::config::schema::validate_against_schema;
use crate::error::SyncError;
use crate::system::System;
use anyhow::{Context as _, Result};
use serde::Serialize as _;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::path::Path;
use tracing::debug;

/// Load the settings file, filling defaults for every missing key
///
/// A missing file is not an error: it yields the default (unconfigured)
/// settings.
pub fn load_config(system: &dyn System, path: &Path) -> Result<Config> {
    if !system.exists(path) {
        debug!("Settings file {} not found, using defaults", path.display());
        return Ok(Config::default());
    }
    if !system.is_file(path) {
        return Err(SyncError::filesystem(format!(
            "Settings path {} is not a file",
            path.display()
        ))
        .into());
    }

    let content = system.read_to_string(path).map_err(|e| {
        SyncError::filesystem(format!(
            "Failed to read settings file {}: {e}",
            path.display()
        ))
    })?;

    parse_config(&content)
        .with_context(|| format!("Failed to load settings from {}", path.display()))
}

/// Parse settings JSON, validating its shape and filling defaults
pub fn parse_config(content: &str) -> Result<Config> {
    let value: Value = serde_json::from_str(content).map_err(|e| {
        SyncError::config_invalid(format!("Settings file is not valid JSON: {e}"))
    })?;

    validate_against_schema(&value)?;

    let mut config: Config = serde_json::from_value(value)
        .map_err(|e| SyncError::config_invalid(format!("Invalid settings: {e}")))?;

    // The list variant always carries both lists once either is present
    if config.files.is_some() || config.folders.is_some() {
        config.files.get_or_insert_with(Vec::new);
        config.folders.get_or_insert_with(Vec::new);
    }

    Ok(config)
}

/// Serialize settings as JSON pretty-printed with a 4-space indent
pub fn to_pretty_json(config: &Config) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    config
        .serialize(&mut serializer)
        .context("Failed to serialize settings")?;
    String::from_utf8(buffer).context("Serialized settings are not UTF-8")
}

/// Write settings back to disk, creating the parent directory if needed
pub fn save_config(system: &dyn System, config: &Config, path: &Path) -> Result<()> {
    let json = to_pretty_json(config)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !system.is_dir(parent)
    {
        system.create_dir_all(parent).map_err(|e| {
            SyncError::filesystem(format!(
                "Failed to create settings directory {}: {e}",
                parent.display()
            ))
        })?;
    }
    system.write(path, json.as_bytes()).map_err(|e| {
        SyncError::filesystem(format!(
            "Failed to write settings file {}: {e}",
            path.display()
        ))
    })?;
    debug!("Settings saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    #[test]
    fn test_pretty_json_uses_four_spaces() {
        let json = to_pretty_json(&Config::default()).unwrap();
        assert!(json.starts_with("{\n    \"remote_url\": \"\""));
        assert!(!json.contains("\"files\""));
    }

    #[test]
    fn test_invalid_json_is_config_invalid() {
        let err = parse_config("{ not json").unwrap_err();
        let sync = err.downcast_ref::<SyncError>().unwrap();
        assert!(matches!(sync, SyncError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let system = MockSystem::new();
        let config = load_config(&system, Path::new("/nowhere/config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_directory_is_not_a_settings_file() {
        let system = MockSystem::new().with_dir("/app/config.json");
        let err = load_config(&system, Path::new("/app/config.json")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::Filesystem { .. })
        ));
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let system = MockSystem::new();
        let path = Path::new("/home/ada/.config/tracksync/config.json");
        save_config(&system, &Config::default(), path).unwrap();
        assert!(system.is_file(path));
    }

    #[test]
    fn test_save_then_load_keeps_unknown_keys() {
        let system = MockSystem::new().with_file(
            "/app/config.json",
            br#"{"branch": "live", "window": {"w": 540}}"#,
        );
        let path = Path::new("/app/config.json");
        let config = load_config(&system, path).unwrap();
        save_config(&system, &config, path).unwrap();

        let reloaded = load_config(&system, path).unwrap();
        assert_eq!(reloaded.branch, "live");
        assert_eq!(
            reloaded.extra.get("window"),
            Some(&serde_json::json!({"w": 540}))
        );
    }
}
