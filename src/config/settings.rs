//! Project defaults for the command line
//!
//! An `injinja.toml` / `injinja.yml` (optionally dot-prefixed) in the working
//! directory, or a file named with `--settings`, supplies default flag values.
//! `INJINJA_OUTPUT`, `INJINJA_SCHEMA`, `INJINJA_TEMPLATE` and
//! `INJINJA_STDIN_FORMAT` override the file.

use crate::domain::Format;
use crate::error::{Error, Result};
use figment::providers::{Env, Format as _, Toml, Yaml};
use figment::Figment;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CANDIDATES: [&str; 6] = [
    "injinja.toml",
    ".injinja.toml",
    "injinja.yml",
    ".injinja.yml",
    "injinja.yaml",
    ".injinja.yaml",
];

const ENV_PREFIX: &str = "INJINJA_";
const ENV_KEYS: [&str; 4] = ["output", "schema", "template", "stdin_format"];

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub env: Vec<String>,
    pub prefix: Vec<String>,
    pub config: Vec<String>,
    pub functions: Vec<String>,
    pub template: Option<PathBuf>,
    pub output: Option<String>,
    pub schema: Option<String>,
    pub stdin_format: Option<String>,
}

/// Load settings from `explicit`, or from the first candidate file found in `dir`.
///
/// A file named explicitly must load; a discovered file that fails to load is
/// skipped with a warning.
pub fn load_settings(dir: &Path, explicit: Option<&Path>) -> Result<Settings> {
    let provided = explicit.is_some();
    let discovered = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discover_settings(dir),
    };

    let Some(file) = discovered else {
        return extract(Figment::new().merge(env_provider()), Path::new("<environment>"));
    };
    if provided && !file.is_file() {
        return Err(Error::Settings { path: file, message: "file not found".to_string() });
    }

    let loaded =
        file_provider(&file).and_then(|figment| extract(figment.merge(env_provider()), &file));
    match loaded {
        Ok(settings) => Ok(settings),
        Err(e) if provided => Err(e),
        Err(e) => {
            tracing::warn!("Ignoring settings file {}: {}", file.display(), e);
            extract(Figment::new().merge(env_provider()), Path::new("<environment>"))
        }
    }
}

fn discover_settings(dir: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|candidate| dir.join(candidate)).find(|path| path.is_file())
}

fn file_provider(path: &Path) -> Result<Figment> {
    match Format::from_path(path) {
        Some(Format::Toml) => Ok(Figment::from(Toml::file(path))),
        Some(Format::Yaml) => Ok(Figment::from(Yaml::file(path))),
        _ => Err(Error::Settings {
            path: path.to_path_buf(),
            message: "settings must be a .toml, .yaml or .yml file".to_string(),
        }),
    }
}

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).only(&ENV_KEYS)
}

fn extract(figment: Figment, origin: &Path) -> Result<Settings> {
    figment
        .extract()
        .map_err(|e| Error::Settings { path: origin.to_path_buf(), message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_missing() {
        let tmp = TempDir::new().expect("tmp");
        let settings = load_settings(tmp.path(), None).expect("settings");
        assert!(settings.config.is_empty());
        assert!(settings.functions.is_empty());
    }

    #[test]
    fn test_discovers_toml_settings() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(
            tmp.path().join("injinja.toml"),
            "config = ['conf/*.yml']\nprefix = ['APP_']\nschema = 'schema.json'\n",
        )
        .expect("write");

        let settings = load_settings(tmp.path(), None).expect("settings");
        assert_eq!(settings.config, ["conf/*.yml"]);
        assert_eq!(settings.prefix, ["APP_"]);
        assert_eq!(settings.schema.as_deref(), Some("schema.json"));
    }

    #[test]
    fn test_explicit_yaml_settings() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("ci.yml");
        fs::write(&path, "functions:\n  - fns/*.rhai\noutput: config-json\n").expect("write");

        let settings = load_settings(tmp.path(), Some(&path)).expect("settings");
        assert_eq!(settings.functions, ["fns/*.rhai"]);
        assert_eq!(settings.output.as_deref(), Some("config-json"));
    }

    #[test]
    fn test_explicit_invalid_settings_is_an_error() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "config = 123\n").expect("write");

        let result = load_settings(tmp.path(), Some(&path));
        assert!(matches!(result, Err(Error::Settings { .. })));
    }

    #[test]
    fn test_explicit_missing_settings_is_an_error() {
        let tmp = TempDir::new().expect("tmp");
        let result = load_settings(tmp.path(), Some(&tmp.path().join("nope.toml")));
        assert!(matches!(result, Err(Error::Settings { .. })));
    }

    #[test]
    fn test_discovered_invalid_settings_falls_back_to_defaults() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join(".injinja.toml"), "unknown_key = true\n").expect("write");

        let settings = load_settings(tmp.path(), None).expect("should not error on discovery");
        assert!(settings.config.is_empty());
    }
}
