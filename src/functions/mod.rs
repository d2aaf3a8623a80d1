//! Custom template functions
//!
//! Function files extend the renderer without touching this tool. Every public
//! script function named `test_<name>` becomes the template test `<name>` and
//! every `filter_<name>` becomes the filter `<name>`. Other functions are
//! ignored. When two files define the same name the file loaded last wins.
//!
//! Loading executes each file's top-level statements, so it is not free of
//! side effects.

pub mod script;

#[cfg(test)]
use crate::domain::ConfigValue;
use crate::error::Result;
use crate::utils::expand_files_or_globs;
use minijinja::value::{Rest, Value};
use minijinja::{Environment, ErrorKind};
use rhai::Engine;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub use script::{ScriptFunction, ScriptModule};

const TEST_PREFIX: &str = "test_";
const FILTER_PREFIX: &str = "filter_";

type CallResult<T> = std::result::Result<T, minijinja::Error>;

/// Tests and filters keyed by their template-visible name.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    tests: BTreeMap<String, ScriptFunction>,
    filters: BTreeMap<String, ScriptFunction>,
}

impl FunctionRegistry {
    pub fn tests(&self) -> &BTreeMap<String, ScriptFunction> {
        &self.tests
    }

    pub fn filters(&self) -> &BTreeMap<String, ScriptFunction> {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty() && self.filters.is_empty()
    }

    /// Register the `test_`/`filter_` functions of `module`, replacing existing names.
    pub fn register_module(&mut self, module: Arc<ScriptModule>) {
        for name in module.function_names() {
            if let Some(short) = name.strip_prefix(TEST_PREFIX) {
                let short = short.to_string();
                self.tests.insert(short, ScriptFunction::new(Arc::clone(&module), name));
            } else if let Some(short) = name.strip_prefix(FILTER_PREFIX) {
                let short = short.to_string();
                self.filters.insert(short, ScriptFunction::new(Arc::clone(&module), name));
            }
        }
    }

    /// Add every test and filter to a template environment.
    pub fn install(&self, env: &mut Environment<'_>) {
        for (name, function) in &self.filters {
            let function = function.clone();
            env.add_filter(
                name.clone(),
                move |value: Value, args: Rest<Value>| -> CallResult<Value> {
                    let args = with_subject(value, args);
                    function
                        .invoke(&args)
                        .map(|result| Value::from_serialize(&result))
                        .map_err(|message| call_error(function.name(), message))
                },
            );
        }

        for (name, function) in &self.tests {
            let function = function.clone();
            env.add_test(
                name.clone(),
                move |value: Value, args: Rest<Value>| -> CallResult<bool> {
                    let args = with_subject(value, args);
                    function
                        .invoke(&args)
                        .and_then(|result| script::as_predicate(&result))
                        .map_err(|message| call_error(function.name(), message))
                },
            );
        }
    }

    /// Look up a filter and apply it outside of a template.
    #[cfg(test)]
    pub(crate) fn apply_filter(
        &self,
        name: &str,
        args: &[ConfigValue],
    ) -> Option<Result<ConfigValue>> {
        self.filters.get(name).map(|function| function.call(args))
    }

    /// Look up a test and evaluate it outside of a template.
    #[cfg(test)]
    pub(crate) fn apply_test(&self, name: &str, args: &[ConfigValue]) -> Option<Result<bool>> {
        self.tests.get(name).map(|function| function.check(args))
    }
}

fn with_subject(value: Value, rest: Rest<Value>) -> Vec<Value> {
    let mut args = Vec::with_capacity(rest.len() + 1);
    args.push(value);
    args.extend(rest.iter().cloned());
    args
}

fn call_error(name: &str, message: String) -> minijinja::Error {
    let detail = format!("custom function '{name}' failed: {message}");
    minijinja::Error::new(ErrorKind::InvalidOperation, detail)
}

/// Expand `patterns` and load every matching function file in order.
///
/// An empty pattern list yields an empty registry.
pub fn load_functions(patterns: &[String]) -> Result<FunctionRegistry> {
    let mut registry = FunctionRegistry::default();
    if patterns.is_empty() {
        return Ok(registry);
    }

    let engine = Arc::new(Engine::new());
    for path in expand_files_or_globs(patterns)? {
        debug!(path = %path.display(), "loading function file");
        let module = Arc::new(ScriptModule::load(Arc::clone(&engine), &path)?);
        registry.register_module(module);
    }

    debug!(
        tests = ?registry.tests.keys().collect::<Vec<_>>(),
        filters = ?registry.filters.keys().collect::<Vec<_>>(),
        "registered custom functions"
    );
    Ok(registry)
}
