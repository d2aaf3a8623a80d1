//! Utility functions

pub mod diff;
pub mod paths;

pub use diff::unified_diff;
pub use paths::{expand_file_or_glob, expand_files_or_globs, normalize_path};
