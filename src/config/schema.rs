//! JSON Schema validation for the settings file

use crate::error::SyncError;
use serde_json::Value;

/// Validate a settings value against the embedded schema
///
/// # Errors
///
/// Returns `ConfigInvalid` listing every schema violation
pub fn validate_against_schema(config: &Value) -> Result<(), SyncError> {
    let schema: Value = serde_json::from_str(include_str!("../../docs/config.schema.json"))
        .map_err(|e| SyncError::config_invalid(format!("Embedded settings schema is invalid: {e}")))?;

    let validator = jsonschema::draft7::new(&schema)
        .map_err(|e| SyncError::config_invalid(format!("Failed to compile settings schema: {e}")))?;

    let error_messages: Vec<String> = validator
        .iter_errors(config)
        .map(|e| format!("  - {e}"))
        .collect();

    if !error_messages.is_empty() {
        return Err(SyncError::config_invalid(format!(
            "Settings file does not match the expected shape:\n{}",
            error_messages.join("\n")
        )));
    }

    Ok(())
}
