//! Environment variable resolution
//!
//! Variables come from three sources, merged lowest to highest precedence:
//! 1. `.env` files passed via `--env`
//! 2. OS environment variables matching a `--prefix` (keys upper-cased)
//! 3. inline `--env KEY=VALUE` flags

pub mod dotenv;

use crate::domain::{ConfigValue, EnvironmentMap};
use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;

pub use dotenv::{parse_env_line, read_env_file};

/// Resolve `--env` flags and `--prefix` imports against the process environment.
pub fn resolve_environment(env_flags: &[String], prefixes: &[String]) -> Result<EnvironmentMap> {
    let os_vars = std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
    resolve_with(env_flags, prefixes, os_vars)
}

/// Same as [`resolve_environment`] with an explicit set of OS variables.
pub fn resolve_with<I>(
    env_flags: &[String],
    prefixes: &[String],
    os_vars: I,
) -> Result<EnvironmentMap>
where
    I: IntoIterator<Item = (String, String)>,
{
    let (files, inline): (Vec<&String>, Vec<&String>) =
        env_flags.iter().partition(|flag| Path::new(flag.as_str()).is_file());

    let mut resolved = EnvironmentMap::new();

    for file in &files {
        resolved.extend(read_env_file(Path::new(file.as_str()))?);
    }

    let from_prefixes = vars_with_prefixes(prefixes, os_vars);
    let prefix_count = from_prefixes.len();
    resolved.extend(from_prefixes);

    let from_flags = parse_key_values(&inline)?;
    let flag_count = from_flags.len();
    resolved.extend(from_flags);

    debug!(
        files = files.len(),
        prefixed = prefix_count,
        inline = flag_count,
        total = resolved.len(),
        "resolved environment variables"
    );
    Ok(resolved)
}

/// Collect variables whose name starts with any prefix, compared case-insensitively.
pub fn vars_with_prefixes<I>(prefixes: &[String], os_vars: I) -> EnvironmentMap
where
    I: IntoIterator<Item = (String, String)>,
{
    if prefixes.is_empty() {
        return EnvironmentMap::new();
    }
    let prefixes: Vec<String> = prefixes.iter().map(|p| p.to_lowercase()).collect();

    os_vars
        .into_iter()
        .filter(|(key, _)| {
            let lowered = key.to_lowercase();
            prefixes.iter().any(|prefix| lowered.starts_with(prefix))
        })
        .map(|(key, value)| (key.to_uppercase(), value))
        .collect()
}

fn parse_key_values(flags: &[&String]) -> Result<EnvironmentMap> {
    flags
        .iter()
        .map(|flag| {
            flag.split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| Error::InvalidEnvFlag(flag.to_string()))
        })
        .collect()
}

/// Expose the environment as a template context.
pub fn to_context(env: &EnvironmentMap) -> ConfigValue {
    ConfigValue::Object(
        env.iter().map(|(key, value)| (key.clone(), ConfigValue::String(value.clone()))).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn os(vars: &[(&str, &str)]) -> Vec<(String, String)> {
        vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn flags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_no_sources_yields_empty_map() {
        let resolved = resolve_with(&[], &[], os(&[("HOME", "/root")])).expect("resolve");
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_all_sources_are_merged() {
        let tmp = TempDir::new().expect("tmp");
        let env_file = tmp.path().join(".env");
        fs::write(&env_file, "FILE_KEY=file_value").expect("write");

        let resolved = resolve_with(
            &flags(&["CLI_KEY=cli_value", env_file.to_str().unwrap()]),
            &flags(&["PREFIX_"]),
            os(&[("PREFIX_KEY", "prefix_value"), ("OTHER", "ignored")]),
        )
        .expect("resolve");

        assert_eq!(resolved["CLI_KEY"], "cli_value");
        assert_eq!(resolved["FILE_KEY"], "file_value");
        assert_eq!(resolved["PREFIX_KEY"], "prefix_value");
        assert!(!resolved.contains_key("OTHER"));
    }

    #[test]
    fn test_precedence_is_file_then_prefix_then_inline_flag() {
        let tmp = TempDir::new().expect("tmp");
        let env_file = tmp.path().join(".env");
        fs::write(&env_file, "PREFIX_K=file\nONLY_FILE=file\nPREFIX_SHARED=file\n").expect("write");
        let env_path = env_file.to_str().unwrap();

        let resolved = resolve_with(
            &flags(&["PREFIX_K=cli", env_path]),
            &flags(&["PREFIX_"]),
            os(&[("PREFIX_K", "prefix"), ("PREFIX_SHARED", "prefix")]),
        )
        .expect("resolve");

        assert_eq!(resolved["PREFIX_K"], "cli");
        assert_eq!(resolved["PREFIX_SHARED"], "prefix");
        assert_eq!(resolved["ONLY_FILE"], "file");
    }

    #[test]
    fn test_later_env_files_override_earlier_ones() {
        let tmp = TempDir::new().expect("tmp");
        let first = tmp.path().join("first.env");
        let second = tmp.path().join("second.env");
        fs::write(&first, "K=first\nA=1").expect("write");
        fs::write(&second, "K=second").expect("write");

        let resolved = resolve_with(
            &flags(&[first.to_str().unwrap(), second.to_str().unwrap()]),
            &[],
            os(&[]),
        )
        .expect("resolve");
        assert_eq!(resolved["K"], "second");
        assert_eq!(resolved["A"], "1");
    }

    #[test]
    fn test_prefix_match_is_case_insensitive_and_upper_cases_keys() {
        let vars = vars_with_prefixes(
            &flags(&["myapp_"]),
            os(&[("MyApp_Name", "svc"), ("MYAPP_PORT", "80"), ("OTHERAPP_X", "no")]),
        );
        assert_eq!(vars.len(), 2);
        assert_eq!(vars["MYAPP_NAME"], "svc");
        assert_eq!(vars["MYAPP_PORT"], "80");
    }

    #[test]
    fn test_inline_flags_keep_literal_case() {
        let resolved = resolve_with(&flags(&["lower_key=Value"]), &[], os(&[])).expect("resolve");
        assert_eq!(resolved["lower_key"], "Value");
        assert!(!resolved.contains_key("LOWER_KEY"));
    }

    #[test]
    fn test_inline_flag_splits_on_first_equals() {
        let resolved = resolve_with(&flags(&["DSN=a=b=c"]), &[], os(&[])).expect("resolve");
        assert_eq!(resolved["DSN"], "a=b=c");
    }

    #[test]
    fn test_inline_flag_without_equals_is_rejected() {
        let err = resolve_with(&flags(&["/no/such/file.env"]), &[], os(&[])).unwrap_err();
        assert!(matches!(err, Error::InvalidEnvFlag(ref flag) if flag == "/no/such/file.env"));
    }

    #[test]
    fn test_to_context_builds_string_mapping() {
        let mut env = EnvironmentMap::new();
        env.insert("NAME".into(), "svc".into());
        assert_eq!(to_context(&env), serde_json::json!({"NAME": "svc"}));
    }
}
