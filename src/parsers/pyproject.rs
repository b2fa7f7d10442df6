//! Parser for the structured-table dialect (pyproject.toml).
//!
//! Dependency arrays are located by path expression: `build-system.requires`,
//! `project.dependencies`, `project.optional-dependencies.*` and
//! `dependency-groups.*` (PEP 735). Each array element is a requirement
//! string handled by the shared specifier grammar. Spans cover the string
//! content between its original quote characters, so whatever quoting the
//! file used is preserved by construction. Literals are searched only inside
//! the byte range of their owning array, so identical text elsewhere in the
//! document (a description field, a commented-out entry) is never mistaken
//! for a requirement.

use std::collections::HashSet;
use std::ops::Range;

use toml::Value;

use crate::error::FreezeError;
use crate::requirement::{parse_requirement_string, Requirement};

pub fn extract(
    text: &str,
    best_effort: bool,
    warnings: &mut Vec<String>,
) -> Result<Vec<Requirement>, FreezeError> {
    let value: Value = toml::from_str(text)?;

    // Each group is one dependency array plus the byte range of its source
    // text, when that range can be pinned down.
    let mut groups: Vec<(Vec<&str>, Option<Range<usize>>)> = Vec::new();

    if let Some(array) = lookup(&value, &["build-system", "requires"]).and_then(Value::as_array) {
        groups.push((strings(array), array_window(text, "build-system", "requires")));
    }
    if let Some(array) = lookup(&value, &["project", "dependencies"]).and_then(Value::as_array) {
        groups.push((strings(array), array_window(text, "project", "dependencies")));
    }
    if let Some(table) =
        lookup(&value, &["project", "optional-dependencies"]).and_then(Value::as_table)
    {
        for (group, entry) in table {
            if let Some(array) = entry.as_array() {
                groups.push((
                    strings(array),
                    array_window(text, "project.optional-dependencies", group),
                ));
            }
        }
    }
    if let Some(table) = lookup(&value, &["dependency-groups"]).and_then(Value::as_table) {
        for (group, entry) in table {
            if let Some(array) = entry.as_array() {
                // PEP 735 groups may also hold `{include-group = ...}`
                // tables; only plain strings are requirements.
                groups.push((strings(array), array_window(text, "dependency-groups", group)));
            }
        }
    }

    let mut requirements = Vec::new();
    let mut used_spans: HashSet<usize> = HashSet::new();

    for (entries, window) in groups {
        for entry in entries {
            let located = window
                .as_ref()
                .and_then(|w| locate_string_literal(text, w, entry, &used_spans));
            let Some(start) = located else {
                // Escaped or multi-line literal, or an array laid out in a
                // form we cannot address byte-exactly; leave it untouched
                // rather than risk a bad splice.
                warnings
                    .push(format!("could not locate {entry:?} in source, leaving it unchanged"));
                continue;
            };
            used_spans.insert(start);

            match parse_requirement_string(entry, start) {
                Ok(req) => requirements.push(req),
                Err(err) => {
                    if best_effort {
                        warnings.push(format!("skipping unparsable requirement: {err}"));
                    } else {
                        return Err(err);
                    }
                }
            }
        }
    }

    // TOML traversal order is not document order; spans are.
    requirements.sort_by_key(|r| r.span.start);
    Ok(requirements)
}

fn lookup<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(value, |v, key| v.get(key))
}

fn strings(array: &[Value]) -> Vec<&str> {
    array.iter().filter_map(Value::as_str).collect()
}

/// Byte range of the contents of the `key = [ ... ]` array under the
/// `[header]` table, brackets excluded.
fn array_window(text: &str, header: &str, key: &str) -> Option<Range<usize>> {
    let body = table_body(text, header)?;
    let slice = &text[body.clone()];

    let mut pos = 0;
    for line in slice.split_inclusive('\n') {
        let line_start = pos;
        pos += line.len();
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            continue;
        }
        let Some(rest) = strip_key(trimmed, key) else {
            continue;
        };
        let Some(after_eq) = rest.trim_start().strip_prefix('=') else {
            continue;
        };
        // `after_eq` is a suffix of `line`, so its offset falls out of the
        // lengths.
        let abs = body.start + line_start + (line.len() - after_eq.len());
        let open = abs + (text[abs..].len() - text[abs..].trim_start().len());
        if text[open..].starts_with('[') {
            let close = matching_bracket(text, open)?;
            return Some(open + 1..close);
        }
        return None;
    }
    None
}

/// Byte range of the body of `[header]`: everything between its header
/// line and the next table header (or end of input).
fn table_body(text: &str, header: &str) -> Option<Range<usize>> {
    let mut start: Option<usize> = None;

    let mut pos = 0;
    for line in text.split_inclusive('\n') {
        let line_start = pos;
        pos += line.len();
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('[') else {
            continue;
        };
        let rest = rest.trim_start_matches('[');
        let Some(close) = rest.find(']') else {
            continue;
        };
        if let Some(s) = start {
            return Some(s..line_start);
        }
        if rest[..close].trim() == header {
            start = Some(pos);
        }
    }
    start.map(|s| s..text.len())
}

/// Strip `key` (bare or quoted) from the start of a line, requiring a key
/// boundary so `deps` never matches `deps-extra`.
fn strip_key<'a>(trimmed: &'a str, key: &str) -> Option<&'a str> {
    if let Some(rest) = trimmed.strip_prefix(key) {
        if rest.starts_with('=') || rest.starts_with(char::is_whitespace) {
            return Some(rest);
        }
    }
    for quote in ['"', '\''] {
        if let Some(rest) = trimmed
            .strip_prefix(quote)
            .and_then(|t| t.strip_prefix(key))
            .and_then(|t| t.strip_prefix(quote))
        {
            return Some(rest);
        }
    }
    None
}

/// Index of the `]` matching the `[` at `open`, skipping string contents
/// and comments.
fn matching_bracket(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string: Option<u8> = None;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        match in_string {
            Some(quote) => {
                if b == b'\\' && quote == b'"' {
                    i += 1;
                } else if b == quote {
                    in_string = None;
                }
            }
            None => match b {
                b'"' | b'\'' => in_string = Some(b),
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                b'#' => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Find the byte offset of `literal` as a single-line quoted TOML string
/// inside `window`, skipping matches on commented lines and offsets
/// already claimed by an earlier (duplicate) entry.
fn locate_string_literal(
    text: &str,
    window: &Range<usize>,
    literal: &str,
    used: &HashSet<usize>,
) -> Option<usize> {
    let slice = &text[window.clone()];
    for quote in ['"', '\''] {
        let needle = format!("{quote}{literal}{quote}");
        let mut from = 0;
        while let Some(rel) = slice[from..].find(&needle) {
            let match_start = from + rel;
            let content_start = window.start + match_start + quote.len_utf8();
            from = match_start + quote.len_utf8();

            let line_start = slice[..match_start].rfind('\n').map_or(0, |i| i + 1);
            if slice[line_start..match_start].contains('#') {
                continue;
            }
            if !used.contains(&content_start) {
                return Some(content_start);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::RequirementKind;

    fn parse(text: &str) -> Vec<Requirement> {
        let mut warnings = Vec::new();
        extract(text, false, &mut warnings).unwrap()
    }

    const PYPROJECT: &str = r#"
[build-system]
requires = ["setuptools>=61", "wheel"]

[project]
name = "myproject"
dependencies = [
    "requests >=2.28.0",
    "numpy==1.24.0",
    'flask~=2.0.0',
]

[project.optional-dependencies]
dev = [
    "pytest>=7.0.0",
    "black",
]

[dependency-groups]
lint = ["ruff>=0.4"]
"#;

    #[test]
    fn test_collects_all_tables() {
        let reqs = parse(PYPROJECT);
        let names: Vec<&str> = reqs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            ["setuptools", "wheel", "requests", "numpy", "flask", "pytest", "black", "ruff"]
        );
    }

    #[test]
    fn test_spans_sit_inside_quotes() {
        let reqs = parse(PYPROJECT);
        for req in &reqs {
            assert_eq!(&PYPROJECT[req.span.clone()], req.raw_text);
            let before = &PYPROJECT[..req.span.start];
            let quote = before.chars().next_back().unwrap();
            assert!(quote == '"' || quote == '\'');
        }
    }

    #[test]
    fn test_single_quoted_entry() {
        let reqs = parse(PYPROJECT);
        let flask = reqs.iter().find(|r| r.name == "flask").unwrap();
        assert_eq!(flask.raw_text, "flask~=2.0.0");
        assert_eq!(PYPROJECT.as_bytes()[flask.span.start - 1], b'\'');
    }

    #[test]
    fn test_duplicate_strings_get_distinct_spans() {
        let text = "[project]\ndependencies = [\"six\", \"six\"]\n";
        let reqs = parse(text);
        assert_eq!(reqs.len(), 2);
        assert_ne!(reqs[0].span, reqs[1].span);
        assert!(reqs[0].span.start < reqs[1].span.start);
    }

    #[test]
    fn test_literal_in_unrelated_field_not_mislocated() {
        let text = r#"
[project]
name = "demo"
description = "flask>=1.0"
dependencies = [
    "flask>=1.0",
]
"#;
        let reqs = parse(text);
        assert_eq!(reqs.len(), 1);
        let deps_pos = text.find("dependencies").unwrap();
        assert!(reqs[0].span.start > deps_pos);
        assert_eq!(&text[reqs[0].span.clone()], "flask>=1.0");
    }

    #[test]
    fn test_spans_fall_within_their_own_arrays() {
        // The same literal appears in two arrays and twice outside any
        // array; each requirement must land inside its own array's
        // brackets.
        let text = r#"
[build-system]
requires = ["pkg-a>=1"]
build-backend = "pkg-a>=1"

[project]
description = "pkg-a>=1"
dependencies = ["pkg-a>=1"]
"#;
        let reqs = parse(text);
        assert_eq!(reqs.len(), 2);

        let requires_open = text.find("requires = [").unwrap();
        let backend_pos = text.find("build-backend").unwrap();
        assert!(reqs[0].span.start > requires_open);
        assert!(reqs[0].span.end < backend_pos);

        let deps_open = text.find("dependencies = [").unwrap();
        assert!(reqs[1].span.start > deps_open);
    }

    #[test]
    fn test_commented_out_entry_not_matched() {
        let text = r#"
[project]
dependencies = [
    # "flask>=1.0",
    "flask>=1.0",
]
"#;
        let reqs = parse(text);
        assert_eq!(reqs.len(), 1);
        let comment_pos = text.find('#').unwrap();
        assert!(reqs[0].span.start > comment_pos);
        assert_eq!(&text[reqs[0].span.clone()], "flask>=1.0");
    }

    #[test]
    fn test_markers_and_urls_supported() {
        let text = r#"
[project]
dependencies = [
    "tomli>=1.1.0; python_version < '3.11'",
    "pip @ https://example.com/pip.tar.gz",
]
"#;
        let reqs = parse(text);
        assert_eq!(reqs.len(), 2);
        assert!(reqs[0].markers.is_some());
        assert!(matches!(reqs[1].kind, RequirementKind::DirectUrl { .. }));
    }

    #[test]
    fn test_invalid_toml_is_parse_failure() {
        let mut warnings = Vec::new();
        let err = extract("[project\ndependencies = [", false, &mut warnings);
        assert!(matches!(err, Err(FreezeError::Toml(_))));
    }

    #[test]
    fn test_malformed_requirement_best_effort() {
        let text = "[project]\ndependencies = [\"good==1.0\", \"bad===\"]\n";
        let mut warnings = Vec::new();
        assert!(extract(text, false, &mut warnings).is_err());
        let reqs = extract(text, true, &mut warnings).unwrap();
        assert_eq!(reqs.len(), 1);
        assert!(!warnings.is_empty());
    }

    #[test]
    fn test_include_group_entries_ignored() {
        let text = r#"
[dependency-groups]
test = ["pytest>=7"]
all = [{include-group = "test"}]
"#;
        let reqs = parse(text);
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].name, "pytest");
    }

    #[test]
    fn test_unlocatable_array_warns_and_skips() {
        // Dotted-key form has no [project] table body to search.
        let text = "project.dependencies = [\"flask>=1.0\"]\n";
        let mut warnings = Vec::new();
        let reqs = extract(text, false, &mut warnings).unwrap();
        assert!(reqs.is_empty());
        assert_eq!(warnings.len(), 1);
    }
}
