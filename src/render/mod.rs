//! Template rendering
//!
//! Every render in an invocation goes through one [`Renderer`], built from an
//! immutable [`FunctionRegistry`], so custom tests and filters are visible to
//! both the config-file pre-pass and the final template.

use crate::domain::ConfigValue;
use crate::error::{Error, Result};
use crate::functions::FunctionRegistry;
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use std::fs;
use std::path::Path;
use tracing::{debug, error};

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new(functions: &FunctionRegistry) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        // Output is config and text files; `.html`/`.xml` names must not turn on escaping.
        env.set_auto_escape_callback(|_| AutoEscape::None);
        functions.install(&mut env);
        Self { env }
    }

    /// Read `path` and render it with `context`.
    ///
    /// A blank context (null or an empty collection) returns the file untouched.
    pub fn render_file(&self, path: &Path, context: &ConfigValue) -> Result<String> {
        let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        self.render_str(path, &source, context)
    }

    /// Render `source` with `context`; `path` names the template in errors.
    pub fn render_str(&self, path: &Path, source: &str, context: &ConfigValue) -> Result<String> {
        if is_blank(context) {
            debug!(path = %path.display(), "no context, leaving content as-is");
            return Ok(source.to_string());
        }

        let name = path.display().to_string();
        self.env.render_named_str(&name, source, context).map_err(|err| {
            if err.kind() == ErrorKind::UndefinedError {
                let mut names = missing_variables(source, context);
                if names.is_empty() {
                    names.extend(failing_expression(source, &err));
                }
                error!("{} UndefinedError: {}", name, err);
                Error::UndefinedVariable {
                    path: path.to_path_buf(),
                    names,
                    line: err.line(),
                    source: err,
                }
            } else {
                Error::Template { path: path.to_path_buf(), source: err }
            }
        })
    }
}

fn is_blank(context: &ConfigValue) -> bool {
    match context {
        ConfigValue::Null => true,
        ConfigValue::Object(map) => map.is_empty(),
        ConfigValue::Array(items) => items.is_empty(),
        ConfigValue::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Variables referenced by `source` that do not resolve in `context`, sorted.
fn missing_variables(source: &str, context: &ConfigValue) -> Vec<String> {
    let scratch = Environment::new();
    let Ok(template) = scratch.template_from_str(source) else {
        return Vec::new();
    };

    let mut missing: Vec<String> = template
        .undeclared_variables(true)
        .into_iter()
        .filter(|dotted| !resolves(context, dotted))
        .collect();
    missing.sort();
    missing
}

/// Source text of the expression that failed, e.g. `item.port` inside a loop
/// where the loop variable itself is defined.
fn failing_expression(source: &str, err: &minijinja::Error) -> Option<String> {
    let expression = err.range().and_then(|range| source.get(range))?.trim();
    let expression = expression.trim_start_matches("{{").trim_end_matches("}}").trim();
    (!expression.is_empty()).then(|| expression.to_string())
}

fn resolves(context: &ConfigValue, dotted: &str) -> bool {
    let mut current = context;
    for segment in dotted.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}
