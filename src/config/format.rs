//! Format detection and decoding of JSON, YAML and TOML documents

use crate::domain::{ConfigValue, Format};
use crate::error::{Error, Result};
use serde_json::{Map, Number};
use std::path::Path;

/// Decode `content` read from `path`, choosing the format from the file extension.
pub fn parse_file(path: &Path, content: &str) -> Result<ConfigValue> {
    let format = Format::from_path(path)
        .ok_or_else(|| Error::UnsupportedFormat { path: path.to_path_buf() })?;
    parse_str(format, content, &path.display().to_string())
}

/// Decode `content` in the given format. `origin` names the source in error messages.
pub fn parse_str(format: Format, content: &str, origin: &str) -> Result<ConfigValue> {
    let parse_error =
        |message: String| Error::Parse { origin: origin.to_string(), format, message };

    match format {
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Yaml => {
            // Tags are dropped, never resolved to anything executable.
            let raw: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
            Ok(yaml_to_config(raw))
        }
        Format::Toml => {
            let raw: toml::Table = content
                .parse()
                .map_err(|e: toml::de::Error| parse_error(e.to_string()))?;
            Ok(toml_to_config(toml::Value::Table(raw)))
        }
    }
}

fn yaml_to_config(value: serde_yaml::Value) -> ConfigValue {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => ConfigValue::Null,
        Yaml::Bool(b) => ConfigValue::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                ConfigValue::from(i)
            } else if let Some(u) = n.as_u64() {
                ConfigValue::from(u)
            } else {
                // NaN and infinities have no JSON representation.
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map_or_else(|| ConfigValue::String(n.to_string()), ConfigValue::Number)
            }
        }
        Yaml::String(s) => ConfigValue::String(s),
        Yaml::Sequence(items) => {
            ConfigValue::Array(items.into_iter().map(yaml_to_config).collect())
        }
        Yaml::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_config(value));
            }
            ConfigValue::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_config(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Null => "null".to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        complex => serde_yaml::to_string(&complex).unwrap_or_default().trim_end().to_string(),
    }
}

fn toml_to_config(value: toml::Value) -> ConfigValue {
    use toml::Value as Toml;

    match value {
        Toml::String(s) => ConfigValue::String(s),
        Toml::Integer(i) => ConfigValue::from(i),
        Toml::Float(f) => Number::from_f64(f)
            .map_or_else(|| ConfigValue::String(f.to_string()), ConfigValue::Number),
        Toml::Boolean(b) => ConfigValue::Bool(b),
        Toml::Datetime(dt) => ConfigValue::String(dt.to_string()),
        Toml::Array(items) => ConfigValue::Array(items.into_iter().map(toml_to_config).collect()),
        Toml::Table(table) => {
            ConfigValue::Object(table.into_iter().map(|(k, v)| (k, toml_to_config(v))).collect())
        }
    }
}
