//! File and glob expansion

use crate::error::{Error, Result};
use globset::GlobBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

pub fn normalize_path(path: &str) -> String {
    // Convert backslashes to forward slashes and normalize
    path.replace('\\', "/")
}

/// Expand every entry in order; see [`expand_file_or_glob`].
pub fn expand_files_or_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        files.extend(expand_file_or_glob(pattern)?);
    }
    Ok(files)
}

/// An existing file passes through unchanged; anything else is treated as a glob
/// relative to the working directory (or absolute). Matches are sorted
/// lexicographically so merge order is reproducible.
pub fn expand_file_or_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(pattern);
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let normalized = normalize_path(pattern);
    let matcher = GlobBuilder::new(&normalized)
        .literal_separator(true)
        .build()
        .map_err(|source| Error::Glob { pattern: pattern.to_string(), source })?
        .compile_matcher();

    let (base, depth) = split_glob_base(&normalized);
    let root = if base.is_empty() { PathBuf::from(".") } else { PathBuf::from(&base) };
    if !root.is_dir() {
        warn!("No files matched '{}'", pattern);
        return Ok(Vec::new());
    }

    let mut walker = WalkDir::new(&root).follow_links(true);
    if !normalized.contains("**") {
        walker = walker.max_depth(depth);
    }

    let mut matches = Vec::new();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let candidate = if base.is_empty() {
            entry.path().strip_prefix(".").unwrap_or(entry.path())
        } else {
            entry.path()
        };
        if matcher.is_match(normalize_path(&candidate.to_string_lossy())) {
            matches.push(candidate.to_path_buf());
        }
    }
    matches.sort();

    if matches.is_empty() {
        warn!("No files matched '{}'", pattern);
    } else {
        debug!(pattern, count = matches.len(), "expanded glob");
    }
    Ok(matches)
}

/// Split a pattern into its literal leading directory and the number of
/// path components that follow it.
fn split_glob_base(pattern: &str) -> (String, usize) {
    let components: Vec<&str> = pattern.split('/').collect();
    let literal = components.iter().take_while(|c| !c.contains(GLOB_META)).count();
    let base = components[..literal].join("/");
    let base = if base.is_empty() && pattern.starts_with('/') { "/".to_string() } else { base };
    (base, components.len() - literal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x: 1\n").unwrap();
    }

    fn names(root: &Path, paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| normalize_path(&p.strip_prefix(root).unwrap().to_string_lossy()))
            .collect()
    }

    #[test]
    fn test_existing_file_passes_through() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "single.yml");
        let file = tmp.path().join("single.yml");

        let files = expand_file_or_glob(file.to_str().unwrap()).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_glob_matches_are_sorted_lexicographically() {
        let tmp = TempDir::new().unwrap();
        for name in ["c.yml", "a.yml", "b.yml", "skip.json"] {
            touch(tmp.path(), &format!("conf/{name}"));
        }
        let pattern = format!("{}/conf/*.yml", normalize_path(&tmp.path().to_string_lossy()));

        let files = expand_file_or_glob(&pattern).unwrap();
        assert_eq!(names(tmp.path(), &files), ["conf/a.yml", "conf/b.yml", "conf/c.yml"]);
    }

    #[test]
    fn test_single_star_does_not_cross_directories() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "conf/top.yml");
        touch(tmp.path(), "conf/nested/deep.yml");
        let root = normalize_path(&tmp.path().to_string_lossy());

        let shallow = expand_file_or_glob(&format!("{root}/conf/*.yml")).unwrap();
        assert_eq!(names(tmp.path(), &shallow), ["conf/top.yml"]);

        let deep = expand_file_or_glob(&format!("{root}/conf/**/*.yml")).unwrap();
        assert_eq!(names(tmp.path(), &deep), ["conf/nested/deep.yml", "conf/top.yml"]);
    }

    #[test]
    fn test_missing_base_directory_matches_nothing() {
        let files = expand_file_or_glob("/definitely/not/here/*.yml").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_patterns_expand_in_given_order() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a/z.yml");
        touch(tmp.path(), "b/a.yml");
        let root = normalize_path(&tmp.path().to_string_lossy());

        let files =
            expand_files_or_globs(&[format!("{root}/b/*.yml"), format!("{root}/a/*.yml")]).unwrap();
        assert_eq!(names(tmp.path(), &files), ["b/a.yml", "a/z.yml"]);
    }

    #[test]
    fn test_invalid_glob_is_an_error() {
        let err = expand_file_or_glob("conf/[unclosed").unwrap_err();
        assert!(matches!(err, Error::Glob { .. }));
    }

    #[test]
    fn test_split_glob_base() {
        assert_eq!(split_glob_base("conf/*.yml"), ("conf".to_string(), 1));
        assert_eq!(split_glob_base("*.yml"), (String::new(), 1));
        assert_eq!(split_glob_base("/etc/app/**/*.toml"), ("/etc/app".to_string(), 2));
        assert_eq!(split_glob_base("/*.yml"), ("/".to_string(), 1));
    }
}
