//! Config source loading
//!
//! Each config file is expanded from its pattern, rendered as a template with
//! the resolved environment, and only then parsed.

use super::format::{parse_file, parse_str};
use crate::domain::{ConfigValue, EnvironmentMap, Format};
use crate::env::to_context;
use crate::error::{Error, Result};
use crate::render::Renderer;
use crate::utils::expand_files_or_globs;
use std::path::Path;
use tracing::debug;

/// A parsed configuration layer and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSource {
    pub origin: String,
    pub value: ConfigValue,
}

/// Load one config file, templating it with `env` first.
pub fn load_config(path: &Path, renderer: &Renderer, env: &EnvironmentMap) -> Result<ConfigValue> {
    if Format::from_path(path).is_none() {
        return Err(Error::UnsupportedFormat { path: path.to_path_buf() });
    }
    let content = renderer.render_file(path, &to_context(env))?;
    parse_file(path, &content)
}

/// Expand `patterns` and load every file in order. Empty documents contribute nothing.
pub fn load_sources(
    patterns: &[String],
    renderer: &Renderer,
    env: &EnvironmentMap,
) -> Result<Vec<ConfigSource>> {
    let files = expand_files_or_globs(patterns)?;
    debug!(files = ?files, "config sources");

    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let value = load_config(&file, renderer, env)?;
        if value.is_null() {
            debug!(path = %file.display(), "empty document, skipping");
            continue;
        }
        sources.push(ConfigSource { origin: file.display().to_string(), value });
    }
    Ok(sources)
}

/// Parse piped input. Blank input or a null document yields `None`.
pub fn parse_stdin(content: &str, format: Format) -> Result<Option<ConfigSource>> {
    if content.trim().is_empty() {
        debug!("stdin was empty or whitespace only, no config read");
        return Ok(None);
    }

    let value = parse_str(format, content, "<stdin>")?;
    if value.is_null() {
        debug!("stdin content parsed to null, not adding");
        return Ok(None);
    }
    Ok(Some(ConfigSource { origin: "<stdin>".to_string(), value }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FunctionRegistry;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn renderer() -> Renderer {
        Renderer::new(&FunctionRegistry::default())
    }

    fn env(pairs: &[(&str, &str)]) -> EnvironmentMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_config_is_templated_with_environment() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("app.yml");
        fs::write(&path, "name: {{ APP_NAME }}\nport: {{ PORT }}\n").unwrap();

        let env = env(&[("APP_NAME", "billing"), ("PORT", "8080")]);
        let value = load_config(&path, &renderer(), &env).unwrap();
        assert_eq!(value, json!({"name": "billing", "port": 8080}));
    }

    #[test]
    fn test_config_without_environment_is_not_templated() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("raw.json");
        fs::write(&path, r#"{"sql": "select '{{ not_templated }}'"}"#).unwrap();

        let value = load_config(&path, &renderer(), &EnvironmentMap::new()).unwrap();
        assert_eq!(value, json!({"sql": "select '{{ not_templated }}'"}));
    }

    #[test]
    fn test_undefined_environment_variable_fails_with_file_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("app.toml");
        fs::write(&path, "name = \"{{ MISSING }}\"\n").unwrap();

        let err = load_config(&path, &renderer(), &env(&[("OTHER", "x")])).unwrap_err();
        assert!(matches!(err, Error::UndefinedVariable { .. }));
        let msg = err.to_string();
        assert!(msg.contains("MISSING") && msg.contains("app.toml"), "{msg}");
    }

    #[test]
    fn test_unsupported_extension_fails_before_reading() {
        let err = load_config(Path::new("does-not-exist.ini"), &renderer(), &EnvironmentMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_sources_follow_pattern_then_sorted_order_and_skip_empty() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("b.yml"), "b: 1\n").unwrap();
        fs::write(dir.join("a.yml"), "a: 1\n").unwrap();
        fs::write(dir.join("empty.yml"), "").unwrap();
        fs::write(dir.join("last.json"), "{\"z\": 1}").unwrap();
        let root = crate::utils::normalize_path(&dir.to_string_lossy());

        let sources = load_sources(
            &[format!("{root}/last.json"), format!("{root}/*.yml")],
            &renderer(),
            &EnvironmentMap::new(),
        )
        .unwrap();
        let values: Vec<_> = sources.into_iter().map(|s| s.value).collect();
        assert_eq!(values, [json!({"z": 1}), json!({"a": 1}), json!({"b": 1})]);
    }

    #[test]
    fn test_stdin_parsing() {
        assert_eq!(parse_stdin("  \n", Format::Json).unwrap(), None);
        assert_eq!(parse_stdin("null", Format::Json).unwrap(), None);

        let source = parse_stdin("[table]\nkey = 'v'\n", Format::Toml).unwrap().unwrap();
        assert_eq!(source.origin, "<stdin>");
        assert_eq!(source.value, json!({"table": {"key": "v"}}));

        let err = parse_stdin("{not json", Format::Json).unwrap_err();
        assert!(matches!(err, Error::Parse { ref origin, .. } if origin == "<stdin>"));
    }
}
