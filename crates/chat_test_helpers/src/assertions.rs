//! Predicates for chat test output

use predicates::prelude::*;

/// stderr contains none of `values`
///
/// ```rust
/// use chat_test_helpers::assertions::stderr_not_contains;
/// use predicates::prelude::*;
///
/// assert!(stderr_not_contains(&["ERROR", "WARN"]).eval("all good"));
/// ```
pub fn stderr_not_contains(values: &[&str]) -> impl Predicate<str> {
    let owned_values: Vec<String> = values.iter().map(|&s| s.to_string()).collect();
    predicate::function(move |s: &str| !owned_values.iter().any(|v| s.contains(v.as_str())))
}

/// Output is a single line holding a `/`-separated path with no empty
/// segment and no raw `@`
pub fn is_canonical_path() -> impl Predicate<str> {
    predicate::function(|s: &str| {
        let line = s.trim_end_matches('\n');
        !line.is_empty()
            && !line.contains('\n')
            && !line.contains('@')
            && line.split('/').count() >= 2
            && line.split('/').all(|segment| !segment.is_empty())
    })
}

/// Every non-empty line parses as a JSON object
pub fn json_lines() -> impl Predicate<str> {
    predicate::function(|s: &str| {
        s.lines()
            .filter(|line| !line.trim().is_empty())
            .all(|line| {
                serde_json::from_str::<serde_json::Value>(line)
                    .map(|value| value.is_object())
                    .unwrap_or(false)
            })
    })
}
