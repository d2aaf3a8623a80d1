//! Model-file validation
//!
//! A model file (JSON, YAML or TOML) maps model names to field declarations:
//!
//! ```yaml
//! DatabaseConfig:
//!   extra: forbid
//!   fields:
//!     host: { type: string, min_length: 1 }
//!     port: { type: integer, ge: 1, le: 65535 }
//! Config:
//!   fields:
//!     database: DatabaseConfig
//!     features: { type: map, values: boolean, default: {} }
//! ```
//!
//! Validating data against a model works like constructing the model from the
//! data as keyword arguments: required fields must be present, values must be
//! of (or coercible to) the declared type, constraints must hold and extra keys
//! are ignored, allowed or forbidden per model. Every failure is collected.

use super::validation_error;
use crate::config::format::parse_file;
use crate::domain::{ConfigValue, Format};
use crate::error::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use serde_json::Map;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Policy for keys that a model does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraPolicy {
    #[default]
    Ignore,
    Allow,
    Forbid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModel {
    #[serde(default)]
    extra: ExtraPolicy,
    #[serde(default)]
    fields: Map<String, ConfigValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldDecl {
    Short(String),
    Full(Box<RawField>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    required: Option<bool>,
    default: Option<ConfigValue>,
    #[serde(default)]
    nullable: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<String>,
    ge: Option<f64>,
    gt: Option<f64>,
    le: Option<f64>,
    lt: Option<f64>,
    choices: Option<Vec<ConfigValue>>,
    items: Option<FieldDecl>,
    values: Option<FieldDecl>,
}

#[derive(Debug, Clone, PartialEq)]
enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    List,
    Map,
    Any,
    Model(String),
}

#[derive(Debug)]
struct FieldRule {
    kind: FieldKind,
    required: bool,
    nullable: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    ge: Option<f64>,
    gt: Option<f64>,
    le: Option<f64>,
    lt: Option<f64>,
    choices: Option<Vec<ConfigValue>>,
    items: Option<Box<FieldRule>>,
    values: Option<Box<FieldRule>>,
}

#[derive(Debug)]
struct Model {
    extra: ExtraPolicy,
    fields: Vec<(String, FieldRule)>,
}

/// Every model declared in one model file.
#[derive(Debug)]
pub struct ModelSet {
    models: HashMap<String, Model>,
}

impl ModelSet {
    /// Build the model set from an already-parsed model file.
    pub fn from_value(value: ConfigValue, origin: &str) -> Result<Self> {
        let ConfigValue::Object(declared) = value else {
            return Err(Error::schema_load(format!(
                "Model file '{origin}' must map model names to model definitions"
            )));
        };

        let mut raw_models = Vec::with_capacity(declared.len());
        for (name, body) in declared {
            let raw: RawModel = serde_json::from_value(body).map_err(|e| {
                Error::schema_load(format!("Invalid model '{name}' in '{origin}': {e}"))
            })?;
            raw_models.push((name, raw));
        }

        let names: Vec<&str> = raw_models.iter().map(|(name, _)| name.as_str()).collect();
        let mut models = HashMap::with_capacity(raw_models.len());
        for (name, raw) in &raw_models {
            let mut fields = Vec::with_capacity(raw.fields.len());
            for (field, decl) in &raw.fields {
                let decl: FieldDecl = serde_json::from_value(decl.clone()).map_err(|e| {
                    Error::schema_load(format!("Invalid field '{name}.{field}' in '{origin}': {e}"))
                })?;
                let context = format!("{name}.{field}");
                fields.push((field.clone(), compile_field(decl, &names, &context)?));
            }
            models.insert(name.clone(), Model { extra: raw.extra, fields });
        }

        Ok(Self { models })
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    /// Validate `data` as the input to `model`, collecting every failure.
    pub fn check(&self, model: &str, data: &ConfigValue) -> Vec<String> {
        let mut failures = Vec::new();
        if let Some(model) = self.models.get(model) {
            self.check_model(model, data, "", &mut failures);
        }
        failures
    }

    fn check_model(
        &self,
        model: &Model,
        data: &ConfigValue,
        path: &str,
        failures: &mut Vec<String>,
    ) {
        let Some(object) = data.as_object() else {
            failures.push(failure(path, "Input should be a valid dictionary"));
            return;
        };

        for (name, rule) in &model.fields {
            let field_path = join(path, name);
            match object.get(name) {
                Some(value) => self.check_field(rule, value, &field_path, failures),
                None if rule.required => failures.push(failure(&field_path, "Field required")),
                None => {}
            }
        }

        if model.extra == ExtraPolicy::Forbid {
            for key in object.keys() {
                if !model.fields.iter().any(|(name, _)| name == key) {
                    failures.push(failure(&join(path, key), "Extra inputs are not permitted"));
                }
            }
        }
    }

    fn check_field(
        &self,
        rule: &FieldRule,
        value: &ConfigValue,
        path: &str,
        failures: &mut Vec<String>,
    ) {
        if value.is_null() {
            if !rule.nullable && rule.kind != FieldKind::Any {
                failures.push(failure(path, "Input should not be null"));
            }
            return;
        }

        match &rule.kind {
            FieldKind::String => {
                let Some(text) = value.as_str() else {
                    failures.push(failure(path, "Input should be a valid string"));
                    return;
                };
                let length = text.chars().count();
                check_length(rule, length, "String", "character", path, failures);
                if let Some(pattern) = &rule.pattern {
                    if !pattern.is_match(text) {
                        let reason = format!("String should match pattern '{pattern}'");
                        failures.push(failure(path, &reason));
                    }
                }
            }
            FieldKind::Integer => match coerce_integer(value) {
                Some(n) => check_bounds(rule, n, path, failures),
                None => failures.push(failure(path, "Input should be a valid integer")),
            },
            FieldKind::Number => match coerce_number(value) {
                Some(n) => check_bounds(rule, n, path, failures),
                None => failures.push(failure(path, "Input should be a valid number")),
            },
            FieldKind::Boolean => {
                if coerce_bool(value).is_none() {
                    failures.push(failure(path, "Input should be a valid boolean"));
                }
            }
            FieldKind::List => {
                let Some(items) = value.as_array() else {
                    failures.push(failure(path, "Input should be a valid list"));
                    return;
                };
                check_length(rule, items.len(), "List", "item", path, failures);
                if let Some(item_rule) = &rule.items {
                    for (index, item) in items.iter().enumerate() {
                        let item_path = join(path, &index.to_string());
                        self.check_field(item_rule, item, &item_path, failures);
                    }
                }
            }
            FieldKind::Map => {
                let Some(entries) = value.as_object() else {
                    failures.push(failure(path, "Input should be a valid dictionary"));
                    return;
                };
                check_length(rule, entries.len(), "Dictionary", "item", path, failures);
                if let Some(value_rule) = &rule.values {
                    for (key, entry) in entries {
                        self.check_field(value_rule, entry, &join(path, key), failures);
                    }
                }
            }
            FieldKind::Any => {}
            FieldKind::Model(name) => {
                if let Some(model) = self.models.get(name) {
                    self.check_model(model, value, path, failures);
                }
            }
        }

        if let Some(choices) = &rule.choices {
            if !choices.contains(value) {
                let expected: Vec<String> = choices.iter().map(ToString::to_string).collect();
                failures.push(failure(path, &format!("Input should be {}", expected.join(" or "))));
            }
        }
    }
}

fn compile_field(decl: FieldDecl, models: &[&str], context: &str) -> Result<FieldRule> {
    let raw = match decl {
        FieldDecl::Short(kind) => RawField { kind: Some(kind), ..RawField::default() },
        FieldDecl::Full(raw) => *raw,
    };

    let kind = match raw.kind.as_deref() {
        None => FieldKind::Any,
        Some(name) => resolve_kind(name, models).ok_or_else(|| {
            Error::schema_load(format!("Unknown type '{name}' for field '{context}'"))
        })?,
    };
    let pattern = raw
        .pattern
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| Error::schema_load(format!("Invalid pattern for field '{context}': {e}")))?;
    let items = raw
        .items
        .map(|decl| compile_field(decl, models, &format!("{context}[]")).map(Box::new))
        .transpose()?;
    let values = raw
        .values
        .map(|decl| compile_field(decl, models, &format!("{context}{{}}")).map(Box::new))
        .transpose()?;

    Ok(FieldRule {
        kind,
        required: raw.required.unwrap_or(raw.default.is_none()),
        nullable: raw.nullable,
        min_length: raw.min_length,
        max_length: raw.max_length,
        pattern,
        ge: raw.ge,
        gt: raw.gt,
        le: raw.le,
        lt: raw.lt,
        choices: raw.choices,
        items,
        values,
    })
}

fn resolve_kind(name: &str, models: &[&str]) -> Option<FieldKind> {
    let kind = match name {
        "string" | "str" => FieldKind::String,
        "integer" | "int" => FieldKind::Integer,
        "number" | "float" => FieldKind::Number,
        "boolean" | "bool" => FieldKind::Boolean,
        "list" | "array" => FieldKind::List,
        "map" | "dict" | "object" => FieldKind::Map,
        "any" => FieldKind::Any,
        model if models.contains(&model) => FieldKind::Model(model.to_string()),
        _ => return None,
    };
    Some(kind)
}

fn coerce_integer(value: &ConfigValue) -> Option<f64> {
    match value {
        ConfigValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i as f64)
            } else if let Some(u) = n.as_u64() {
                Some(u as f64)
            } else {
                n.as_f64().filter(|f| f.fract() == 0.0)
            }
        }
        ConfigValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        ConfigValue::String(s) => s.trim().parse::<i64>().ok().map(|i| i as f64),
        _ => None,
    }
}

fn coerce_number(value: &ConfigValue) -> Option<f64> {
    match value {
        ConfigValue::Number(n) => n.as_f64(),
        ConfigValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        ConfigValue::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn coerce_bool(value: &ConfigValue) -> Option<bool> {
    match value {
        ConfigValue::Bool(b) => Some(*b),
        ConfigValue::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        ConfigValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn check_bounds(rule: &FieldRule, n: f64, path: &str, failures: &mut Vec<String>) {
    let bounds = [
        (rule.ge, "greater than or equal to", n >= rule.ge.unwrap_or(f64::MIN)),
        (rule.gt, "greater than", rule.gt.map_or(true, |gt| n > gt)),
        (rule.le, "less than or equal to", n <= rule.le.unwrap_or(f64::MAX)),
        (rule.lt, "less than", rule.lt.map_or(true, |lt| n < lt)),
    ];
    for (limit, relation, ok) in bounds {
        if let (Some(limit), false) = (limit, ok) {
            failures.push(failure(path, &format!("Input should be {relation} {limit}")));
        }
    }
}

fn check_length(
    rule: &FieldRule,
    length: usize,
    what: &str,
    unit: &str,
    path: &str,
    failures: &mut Vec<String>,
) {
    if let Some(min) = rule.min_length.filter(|min| length < *min) {
        let reason = format!("{what} should have at least {min} {}", plural(unit, min));
        failures.push(failure(path, &reason));
    }
    if let Some(max) = rule.max_length.filter(|max| length > *max) {
        let reason = format!("{what} should have at most {max} {}", plural(unit, max));
        failures.push(failure(path, &reason));
    }
}

fn plural(unit: &str, count: usize) -> String {
    if count == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn failure(path: &str, reason: &str) -> String {
    let path = if path.is_empty() { "<root>" } else { path };
    format!("{path}: {reason}")
}

/// Load the model file at `path`.
pub fn load_model(path: &Path) -> Result<ModelSet> {
    if !path.is_file() {
        return Err(Error::schema_load(format!("Module file '{}' not found", path.display())));
    }
    if Format::from_path(path).is_none() {
        return Err(Error::schema_load(format!(
            "Model file '{}' must be a .json, .yaml, .yml or .toml file",
            path.display()
        )));
    }

    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let value = parse_file(path, &content)
        .map_err(|e| Error::schema_load(format!("Failed to load model file: {e}")))?;
    ModelSet::from_value(value, &path.display().to_string())
}

/// Validate `data` against `model` declared in the model file at `module`.
pub fn validate_with_model(data: &ConfigValue, module: &Path, model: &str) -> Result<()> {
    let models = load_model(module)?;
    if !models.contains(model) {
        return Err(Error::schema_load(format!(
            "Class '{model}' not found in {}",
            module.display()
        )));
    }

    let failures = models.check(model, data);
    if failures.is_empty() {
        Ok(())
    } else {
        Err(validation_error(&format!("Model validation failed for {model}"), failures))
    }
}
