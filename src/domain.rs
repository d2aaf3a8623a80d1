//! Core domain types

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Universal in-memory representation of a configuration document.
///
/// Maps keep first-insertion order (`serde_json` is built with `preserve_order`).
pub type ConfigValue = serde_json::Value;

/// Environment variables gathered from `.env` files, prefixes and inline flags.
pub type EnvironmentMap = BTreeMap<String, String>;

/// Serialization formats understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// Detect the format of a file from its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        Self::from_name(&ext)
    }

    /// Parse a format name as given to `--stdin-format`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the result of an invocation goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputTarget {
    /// Print the rendered template.
    #[default]
    Stdout,
    /// Print the merged configuration as JSON, skipping the template.
    ConfigJson,
    /// Print the merged configuration as YAML, skipping the template.
    ConfigYaml,
    /// Write the rendered template to a file.
    File(PathBuf),
}

impl OutputTarget {
    pub fn parse(value: &str) -> Self {
        match value {
            "stdout" => Self::Stdout,
            "config-json" => Self::ConfigJson,
            "config-yaml" | "config-yml" => Self::ConfigYaml,
            path => Self::File(PathBuf::from(path)),
        }
    }
}
