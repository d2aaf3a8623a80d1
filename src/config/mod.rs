//! Configuration loading and merging
//!
//! Sources are parsed from JSON, YAML or TOML and folded together in order,
//! later sources winning (see [`merge`]).

pub mod format;
pub mod loader;
pub mod merge;
pub mod settings;

pub use format::{parse_file, parse_str};
pub use loader::{load_config, load_sources, parse_stdin, ConfigSource};
pub use merge::{merge_value, merge_values};
pub use settings::{load_settings, Settings};
