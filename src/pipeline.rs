//! End-to-end invocation
//!
//! environment → functions → config sources (+ stdin) → merge → schema →
//! template → golden-file diff → output. Every step is sequential and any
//! failure stops the invocation before output is written.

use crate::config::{load_sources, merge_values, parse_stdin};
use crate::domain::{ConfigValue, Format, OutputTarget};
use crate::env::resolve_environment;
use crate::error::{Error, Result};
use crate::functions::load_functions;
use crate::render::Renderer;
use crate::schema::validate;
use crate::utils::unified_diff;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Already-parsed inputs for one invocation.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// `KEY=VALUE` pairs or paths to `.env` files.
    pub env: Vec<String>,
    /// Prefixes of OS environment variables to import.
    pub prefix: Vec<String>,
    /// Config file paths or glob patterns, lowest precedence first.
    pub config: Vec<String>,
    pub template: Option<PathBuf>,
    /// Function file paths or glob patterns.
    pub functions: Vec<String>,
    pub output: OutputTarget,
    /// Expected output to diff the rendered template against.
    pub validate: Option<PathBuf>,
    pub schema: Option<String>,
    /// Format of piped config; stdin is ignored when unset.
    pub stdin_format: Option<Format>,
}

/// Result of an invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Rendered template, empty when no template was given.
    pub rendered: String,
    /// The merged configuration.
    pub config: ConfigValue,
    /// Unified diff against the `validate` file, `None` when they match.
    pub diff: Option<String>,
}

/// Resolve, render and write the output.
pub fn run(invocation: &Invocation, stdin: Option<&str>) -> Result<Outcome> {
    let outcome = resolve(invocation, stdin)?;
    let stdout = io::stdout();
    emit(&invocation.output, &outcome, &mut stdout.lock())?;
    Ok(outcome)
}

/// Everything except writing output.
pub fn resolve(invocation: &Invocation, stdin: Option<&str>) -> Result<Outcome> {
    let env = resolve_environment(&invocation.env, &invocation.prefix)?;

    let functions = load_functions(&invocation.functions)?;
    let renderer = Renderer::new(&functions);

    let mut sources = load_sources(&invocation.config, &renderer, &env)?;
    if let (Some(format), Some(content)) = (invocation.stdin_format, stdin) {
        debug!(%format, "reading config from stdin");
        sources.extend(parse_stdin(content, format)?);
    }

    let config = merge_values(sources.into_iter().map(|source| source.value));
    debug!(config = %config, "merged configuration");

    validate(&config, invocation.schema.as_deref())?;

    let rendered = match &invocation.template {
        Some(template) => renderer.render_file(template, &config)?,
        None => String::new(),
    };

    let diff = match &invocation.validate {
        Some(expected) => {
            let expected_text = fs::read_to_string(expected).map_err(|e| Error::io(expected, e))?;
            let diff = unified_diff(&rendered, &expected_text, &expected.display().to_string());
            if let Some(diff) = &diff {
                debug!("{}", diff);
            }
            diff
        }
        None => None,
    };

    Ok(Outcome { rendered, config, diff })
}

/// Write `outcome` to `target`; the stdout-style sinks go to `out`.
pub fn emit<W: Write>(target: &OutputTarget, outcome: &Outcome, out: &mut W) -> Result<()> {
    let stdout_error = |e: io::Error| Error::io(Path::new("<stdout>"), e);

    match target {
        OutputTarget::ConfigJson => {
            let json = serde_json::to_string_pretty(&outcome.config)
                .map_err(|e| Error::Serialize { format: Format::Json, message: e.to_string() })?;
            writeln!(out, "{json}").map_err(stdout_error)
        }
        OutputTarget::ConfigYaml => {
            let yaml = serde_yaml::to_string(&outcome.config)
                .map_err(|e| Error::Serialize { format: Format::Yaml, message: e.to_string() })?;
            write!(out, "{yaml}").map_err(stdout_error)
        }
        OutputTarget::Stdout => writeln!(out, "{}", outcome.rendered).map_err(stdout_error),
        OutputTarget::File(path) => write_file(path, &outcome.rendered),
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| Error::io(path, e))?;
    debug!(path = %path.display(), bytes = content.len(), "wrote output");
    Ok(())
}
