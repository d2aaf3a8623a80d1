//! injinja: render templates from layered configuration
//!
//! Merges JSON, YAML and TOML config files (templated with environment
//! variables), validates the result and renders a Jinja-style template.

use std::process::ExitCode;

mod cli;

/// Exit code when the merged configuration fails schema validation.
const EXIT_VALIDATION: u8 = 2;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            let is_validation =
                err.downcast_ref::<injinja::Error>().is_some_and(injinja::Error::is_validation);
            if is_validation {
                ExitCode::from(EXIT_VALIDATION)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
