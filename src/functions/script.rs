//! Rhai function files
//!
//! A function file is a Rhai script. Loading it compiles the script and runs its
//! top-level statements once; the functions it defines are then callable with
//! configuration values converted through serde.

use crate::domain::ConfigValue;
use crate::error::{Error, Result};
use rhai::{CallFnOptions, Dynamic, Engine, FnAccess, Scope, AST};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A compiled and executed function file.
pub struct ScriptModule {
    path: PathBuf,
    engine: Arc<Engine>,
    ast: AST,
    scope: Scope<'static>,
}

impl ScriptModule {
    /// Compile `path` and run its top-level code.
    pub fn load(engine: Arc<Engine>, path: &Path) -> Result<Self> {
        let load_error =
            |message: String| Error::FunctionLoad { path: path.to_path_buf(), message };

        let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let ast = engine.compile(&source).map_err(|e| load_error(e.to_string()))?;

        let mut scope = Scope::new();
        engine.run_ast_with_scope(&mut scope, &ast).map_err(|e| load_error(e.to_string()))?;

        Ok(Self { path: path.to_path_buf(), engine, ast, scope })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the public functions defined at the top level of the script.
    pub fn function_names(&self) -> Vec<String> {
        self.ast
            .iter_functions()
            .filter(|f| f.access != FnAccess::Private)
            .map(|f| f.name.to_string())
            .collect()
    }

    fn call(&self, name: &str, args: Vec<Dynamic>) -> std::result::Result<Dynamic, String> {
        let mut scope = self.scope.clone();
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        self.engine
            .call_fn_with_options::<Dynamic>(options, &mut scope, &self.ast, name, args)
            .map_err(|e| e.to_string())
    }
}

/// A single callable exported by a [`ScriptModule`].
#[derive(Clone)]
pub struct ScriptFunction {
    module: Arc<ScriptModule>,
    name: String,
}

impl ScriptFunction {
    pub(crate) fn new(module: Arc<ScriptModule>, name: String) -> Self {
        Self { module, name }
    }

    /// Name of the function inside the script, including its `test_`/`filter_` prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Path {
        self.module.path()
    }

    /// Call with any serializable arguments, returning the raw script result.
    pub(crate) fn invoke<T: Serialize>(&self, args: &[T]) -> std::result::Result<Dynamic, String> {
        let args = args
            .iter()
            .map(rhai::serde::to_dynamic)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;
        self.module.call(&self.name, args)
    }

    /// Call as a transform, converting the result back to a configuration value.
    pub fn call(&self, args: &[ConfigValue]) -> Result<ConfigValue> {
        let result = self.invoke(args).map_err(|message| self.call_error(message))?;
        rhai::serde::from_dynamic(&result).map_err(|e| self.call_error(e.to_string()))
    }

    /// Call as a predicate. The script must return a boolean.
    pub fn check(&self, args: &[ConfigValue]) -> Result<bool> {
        let result = self.invoke(args).map_err(|message| self.call_error(message))?;
        as_predicate(&result).map_err(|message| self.call_error(message))
    }

    fn call_error(&self, message: String) -> Error {
        Error::FunctionCall { name: self.name.clone(), message }
    }
}

impl fmt::Debug for ScriptFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptFunction")
            .field("name", &self.name)
            .field("source", &self.module.path)
            .finish()
    }
}

pub(crate) fn as_predicate(result: &Dynamic) -> std::result::Result<bool, String> {
    result.as_bool().map_err(|actual| format!("test functions must return a boolean, got {actual}"))
}
