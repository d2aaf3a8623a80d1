//! `.env` file parsing
//!
//! Lines are `KEY=VALUE`. Blank lines, `#` comment lines and lines without `=`
//! are skipped. An unquoted `#` anywhere in a value begins a trailing comment.
//! The rest is split like shell words and the words are joined back together,
//! so quotes are removed.

use crate::domain::EnvironmentMap;
use crate::error::{Error, Result};
use shlex::Shlex;
use std::fs;
use std::path::Path;

/// Read a `.env` file into a map. Later lines override earlier ones.
pub fn read_env_file(path: &Path) -> Result<EnvironmentMap> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    let mut vars = EnvironmentMap::new();
    for (index, line) in content.lines().enumerate() {
        match parse_env_line(line) {
            Ok(Some((key, value))) => {
                vars.insert(key, value);
            }
            Ok(None) => {}
            Err(message) => {
                return Err(Error::EnvFile { path: path.to_path_buf(), line: index + 1, message })
            }
        }
    }
    Ok(vars)
}

/// Parse a single line, returning `None` for lines that carry no assignment.
pub fn parse_env_line(line: &str) -> std::result::Result<Option<(String, String)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let Some((key, raw_value)) = line.split_once('=') else {
        return Ok(None);
    };

    let mut lexer = Shlex::new(strip_comment(raw_value));
    let value: String = lexer.by_ref().collect();
    if lexer.had_error {
        return Err(format!("unbalanced quotes or trailing escape in value of '{}'", key.trim()));
    }

    Ok(Some((key.trim().to_string(), value)))
}

/// Cut `value` at the first `#` outside single or double quotes.
fn strip_comment(value: &str) -> &str {
    let mut quote = None;
    let mut escaped = false;
    for (index, ch) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('"'), '\\') | (None, '\\') => escaped = true,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '#') => return &value[..index],
            (None, _) => {}
        }
    }
    value
}
