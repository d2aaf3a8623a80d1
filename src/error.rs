//! Error types shared by every stage of the pipeline

use std::path::{Path, PathBuf};

use crate::domain::Format;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "File type of {} not supported (expected .json, .yaml, .yml or .toml)",
        .path.display()
    )]
    UnsupportedFormat { path: PathBuf },

    #[error("Unsupported stdin format: {0}")]
    UnsupportedStdinFormat(String),

    #[error("Failed to parse {origin} as {format}: {message}")]
    Parse {
        origin: String,
        format: Format,
        message: String,
    },

    #[error("{} UndefinedError: {}", .path.display(), describe_undefined(.names, *.line))]
    UndefinedVariable {
        path: PathBuf,
        names: Vec<String>,
        line: Option<usize>,
        #[source]
        source: minijinja::Error,
    },

    #[error("Failed to render template {}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },

    #[error("{message}")]
    SchemaLoad { message: String },

    #[error("{message}")]
    Validation {
        message: String,
        failures: Vec<String>,
    },

    #[error("Invalid --env value '{0}': expected KEY=VALUE or a path to an .env file")]
    InvalidEnvFlag(String),

    #[error("Invalid line {line} in {}: {message}", .path.display())]
    EnvFile {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to load functions from {}: {message}", .path.display())]
    FunctionLoad { path: PathBuf, message: String },

    #[error("Custom function '{name}' failed: {message}")]
    FunctionCall { name: String, message: String },

    #[error("Invalid settings file {}: {message}", .path.display())]
    Settings { path: PathBuf, message: String },

    #[error("Failed to serialize configuration as {format}: {message}")]
    Serialize { format: Format, message: String },

    #[error("Invalid glob pattern '{pattern}'")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed reading {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn describe_undefined(names: &[String], line: Option<usize>) -> String {
    let described = match names {
        [] => "undefined value".to_string(),
        [name] => format!("'{name}' is undefined"),
        many => {
            let quoted: Vec<String> = many.iter().map(|n| format!("'{n}'")).collect();
            format!("{} are undefined", quoted.join(", "))
        }
    };
    match line {
        Some(line) => format!("{described} (line {line})"),
        None => described,
    }
}

impl Error {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }

    pub(crate) fn schema_load(message: impl Into<String>) -> Self {
        Self::SchemaLoad { message: message.into() }
    }

    /// Whether this error is a schema validation failure (the gate that blocks output).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
