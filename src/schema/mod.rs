//! Schema validation of the merged configuration
//!
//! A schema spec containing `::` names a model in a model file
//! (`models.yaml::AppConfig`); anything else is a path to a JSON Schema
//! document. Both branches report failures as [`Error::Validation`].

pub mod json_schema;
pub mod model;

use crate::domain::ConfigValue;
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::debug;

pub use json_schema::{load_json_schema, validate_with_json_schema};
pub use model::{load_model, validate_with_model, ModelSet};

const MODEL_SEPARATOR: &str = "::";

/// Which validator a schema spec selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSpec {
    /// A named model inside a model file.
    Model { module: PathBuf, model: String },
    /// A JSON Schema document.
    JsonSchema(PathBuf),
}

impl SchemaSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        if !spec.contains(MODEL_SEPARATOR) {
            return Ok(Self::JsonSchema(PathBuf::from(spec)));
        }

        match spec.split_once(MODEL_SEPARATOR) {
            Some((module, model))
                if !module.is_empty() && !model.is_empty() && !model.contains(MODEL_SEPARATOR) =>
            {
                Ok(Self::Model { module: PathBuf::from(module), model: model.to_string() })
            }
            _ => Err(Error::schema_load(format!(
                "Invalid format '{spec}'. Expected format: 'models.yaml::ModelName'"
            ))),
        }
    }
}

/// Validate `data` against `spec`. No spec means no validation.
pub fn validate(data: &ConfigValue, spec: Option<&str>) -> Result<()> {
    let Some(spec) = spec else {
        return Ok(());
    };

    match SchemaSpec::parse(spec)? {
        SchemaSpec::Model { module, model } => {
            debug!(module = %module.display(), model, "validating with model");
            validate_with_model(data, &module, &model)
        }
        SchemaSpec::JsonSchema(path) => {
            debug!(schema = %path.display(), "validating with JSON Schema");
            validate_with_json_schema(data, &path)
        }
    }
}

/// Format a list of field failures under a common prefix.
pub(crate) fn validation_error(prefix: &str, failures: Vec<String>) -> Error {
    Error::Validation { message: format!("{prefix}: {}", failures.join("; ")), failures }
}
