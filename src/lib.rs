//! injinja: render templates from layered configuration
//!
//! Loads JSON, YAML and TOML configuration sources (optionally templated with
//! environment variables), deep-merges them in order, validates the result
//! against an optional schema and renders a Jinja-style template with it.

pub mod config;
pub mod domain;
pub mod env;
pub mod error;
pub mod functions;
pub mod pipeline;
pub mod render;
pub mod schema;
pub mod utils;

pub use config::{merge_values, parse_str, ConfigSource};
pub use domain::{ConfigValue, EnvironmentMap, Format, OutputTarget};
pub use env::resolve_environment;
pub use error::{Error, Result};
pub use functions::{load_functions, FunctionRegistry};
pub use pipeline::{run, Invocation, Outcome};
pub use render::Renderer;
pub use schema::{validate, SchemaSpec};
