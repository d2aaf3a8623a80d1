//! Golden-file comparison

use similar::TextDiff;

/// Unified diff from `rendered` to `expected`, or `None` when they match line for line.
///
/// Comparison is line based, so a missing or extra trailing newline is not a difference.
pub fn unified_diff(rendered: &str, expected: &str, expected_label: &str) -> Option<String> {
    let rendered = normalize_lines(rendered);
    let expected = normalize_lines(expected);
    if rendered == expected {
        return None;
    }

    let diff = TextDiff::from_lines(&rendered, &expected)
        .unified_diff()
        .context_radius(3)
        .header("rendered", expected_label)
        .to_string();
    Some(diff)
}

fn normalize_lines(text: &str) -> String {
    let mut joined = text.lines().collect::<Vec<_>>().join("\n");
    joined.push('\n');
    joined
}
