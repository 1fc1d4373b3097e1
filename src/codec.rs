//! JSON export/import of cookie sets

use crate::cookie::{CookieRecord, RawImportRecord};
use crate::error::{CookieError, Result};
use serde_json::Value;

/// Pretty-printed JSON array of full records, read-only fields included.
pub fn export_to_text(cookies: &[CookieRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(cookies)?)
}

/// Parse an import payload into untyped records.
///
/// Invalid JSON is a `Parse` error; valid JSON that is not an array is a
/// `Validation` error. Elements are not inspected here.
pub fn import_from_text(text: &str) -> Result<Vec<RawImportRecord>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CookieError::Parse(format!("Invalid JSON format: {}", e)))?;
    records_from_value(value)
}

/// Split an already-parsed payload into records, rejecting anything but an array.
pub fn records_from_value(value: Value) -> Result<Vec<RawImportRecord>> {
    match value {
        Value::Array(items) => Ok(items.into_iter().map(RawImportRecord).collect()),
        other => Err(CookieError::Validation(format!(
            "Import payload must be a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
