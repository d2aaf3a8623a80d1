//! JSON Schema validation

use super::validation_error;
use crate::domain::ConfigValue;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Read a JSON Schema document. The file must exist, end in `.json` and parse.
pub fn load_json_schema(path: &Path) -> Result<ConfigValue> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if !is_json {
        return Err(Error::schema_load(format!(
            "JSON Schema must be a .json file, got '{}'",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(Error::schema_load(format!("Schema file '{}' not found", path.display())));
    }

    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| {
        Error::schema_load(format!("Invalid JSON in schema file '{}': {e}", path.display()))
    })
}

/// Validate `data` against the schema at `path`, reporting every violation.
pub fn validate_with_json_schema(data: &ConfigValue, path: &Path) -> Result<()> {
    let schema = load_json_schema(path)?;
    let validator = jsonschema::options()
        .should_validate_formats(true)
        .build(&schema)
        .map_err(|e| Error::schema_load(format!("Invalid JSON Schema '{}': {e}", path.display())))?;

    let failures: Vec<String> = validator
        .iter_errors(data)
        .map(|error| {
            let location = error.instance_path.to_string();
            let location = if location.is_empty() { "<root>".to_string() } else { location };
            format!("{location}: {error}")
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(validation_error("Schema validation failed", failures))
    }
}
