//! Parser for the line-oriented pinned-file dialect (requirements.txt).

use crate::error::FreezeError;
use crate::requirement::{parse_requirement_string, Requirement, RequirementKind};

/// Extract located requirements from requirements.txt text.
///
/// Handles `#` comments, backslash line continuation, `-e`/`--editable`
/// lines (yielding an editable-path requirement) and skips every other
/// `-`/`--` directive, including `-r` includes — following those is the
/// caller's business.
pub fn extract(
    text: &str,
    best_effort: bool,
    warnings: &mut Vec<String>,
) -> Result<Vec<Requirement>, FreezeError> {
    let mut requirements = Vec::new();

    for logical in logical_lines(text) {
        let raw = &text[logical.clone()];
        // Continuations become spaces in the working copy; byte-for-byte the
        // same length, so every offset maps straight back into `raw`.
        let clean = flatten_continuations(raw);

        let effective = strip_comment(&clean);
        let trimmed = effective.trim();
        if trimmed.is_empty() {
            continue;
        }

        let item_start = logical.start + (effective.len() - effective.trim_start().len());
        let item_end = item_start + trimmed.len();

        if let Some(path) = editable_target(trimmed) {
            requirements.push(Requirement {
                raw_name: String::new(),
                name: String::new(),
                extras: Vec::new(),
                markers: None,
                specifiers: Vec::new(),
                kind: RequirementKind::EditablePath {
                    path: path.to_string(),
                },
                raw_text: text[item_start..item_end].to_string(),
                span: item_start..item_end,
                spec_span: 0..0,
            });
            continue;
        }

        // Remaining pip options (-r includes, --index-url, ...) are not
        // requirements and round-trip untouched.
        if trimmed.starts_with('-') {
            continue;
        }

        match parse_requirement_string(&clean[item_start - logical.start..item_end - logical.start], item_start) {
            Ok(mut req) => {
                // Keep the original bytes (continuations included); the
                // spans computed on the flattened copy still hold.
                req.raw_text = text[item_start..item_end].to_string();
                requirements.push(req);
            }
            Err(err) => {
                if best_effort {
                    warnings.push(format!("skipping unparsable requirement: {err}"));
                } else {
                    return Err(err);
                }
            }
        }
    }

    Ok(requirements)
}

/// Byte ranges of logical lines: physical lines joined while the previous
/// one ends with a backslash. Ranges exclude the final line terminator.
fn logical_lines(text: &str) -> Vec<std::ops::Range<usize>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut continued = false;

    let mut pos = 0;
    for line in text.split_inclusive('\n') {
        let line_start = pos;
        pos += line.len();
        let body = line.trim_end_matches(['\n', '\r']);

        if !continued {
            start = line_start;
        }
        continued = body.ends_with('\\');
        if !continued {
            out.push(start..line_start + body.len());
        }
    }
    if continued {
        // Trailing backslash on the last line: close the logical line anyway.
        out.push(start..text.trim_end_matches(['\n', '\r']).len());
    }
    out
}

fn flatten_continuations(raw: &str) -> String {
    raw.chars()
        .map(|c| if matches!(c, '\\' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

/// Cut a trailing comment: `#` at line start or preceded by whitespace.
fn strip_comment(line: &str) -> &str {
    let mut prev_is_space = true;
    for (idx, ch) in line.char_indices() {
        if ch == '#' && prev_is_space {
            return &line[..idx];
        }
        prev_is_space = ch.is_whitespace();
    }
    line
}

fn editable_target(line: &str) -> Option<&str> {
    for prefix in ["--editable", "-e"] {
        if let Some(rest) = line.strip_prefix(prefix) {
            let rest = rest.trim_start_matches('=').trim();
            if !rest.is_empty() {
                return Some(rest);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::Operator;

    fn parse(text: &str) -> Vec<Requirement> {
        let mut warnings = Vec::new();
        extract(text, false, &mut warnings).unwrap()
    }

    #[test]
    fn test_simple_lines() {
        let reqs = parse("requests==2.28.0\nnumpy>=1.24.0\nflask\n");
        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[0].name, "requests");
        assert_eq!(reqs[1].name, "numpy");
        assert_eq!(reqs[2].name, "flask");
        assert!(reqs[2].specifiers.is_empty());
    }

    #[test]
    fn test_comments_preserved_outside_span() {
        let text = "# header\nflask>=1.0  # web framework\n";
        let reqs = parse(text);
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].raw_text, "flask>=1.0");
        assert_eq!(&text[reqs[0].span.clone()], "flask>=1.0");
    }

    #[test]
    fn test_hash_in_middle_without_space_kept() {
        // pip only treats whitespace-preceded hashes as comments
        let reqs = parse("https://example.com/x.whl#sha256=abc\n");
        assert_eq!(reqs.len(), 1);
        assert!(matches!(
            &reqs[0].kind,
            RequirementKind::DirectUrl { url } if url.ends_with("#sha256=abc")
        ));
    }

    #[test]
    fn test_directives_skipped() {
        let text = "--index-url https://pypi.org/simple\n-r other.txt\nrequests==2.28.0\n";
        let reqs = parse(text);
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].name, "requests");
    }

    #[test]
    fn test_editable_line() {
        let reqs = parse("-e ./pkgs/mylib\nrequests==2.0\n");
        assert_eq!(reqs.len(), 2);
        assert!(matches!(
            &reqs[0].kind,
            RequirementKind::EditablePath { path } if path == "./pkgs/mylib"
        ));
    }

    #[test]
    fn test_line_continuation() {
        let text = "requests \\\n    >=2.28.0,<3\nflask\n";
        let reqs = parse(text);
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].name, "requests");
        assert_eq!(reqs[0].specifiers.len(), 2);
        // Raw text keeps the continuation bytes
        assert!(reqs[0].raw_text.contains('\\'));
        assert_eq!(reqs[1].name, "flask");
    }

    #[test]
    fn test_markers_round_trip() {
        let reqs = parse("dataclasses>=0.6; python_version < '3.7'\n");
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].markers.as_deref(), Some("python_version < '3.7'"));
    }

    #[test]
    fn test_vcs_and_url_lines() {
        let reqs = parse("git+https://github.com/pypa/pip.git\nhttps://example.com/x.whl\n");
        assert_eq!(reqs.len(), 2);
        assert!(matches!(reqs[0].kind, RequirementKind::Vcs { .. }));
        assert!(matches!(reqs[1].kind, RequirementKind::DirectUrl { .. }));
    }

    #[test]
    fn test_malformed_line_fails_file() {
        let mut warnings = Vec::new();
        let err = extract("requests==2.0\nbroken===\n", false, &mut warnings);
        assert!(err.is_err());
    }

    #[test]
    fn test_malformed_line_best_effort() {
        let mut warnings = Vec::new();
        let reqs = extract("requests==2.0\nbroken===\n", true, &mut warnings).unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_operator_parsing() {
        let reqs = parse("a~=1.4\nb!=2.0\nc===1.0\n");
        assert_eq!(reqs[0].specifiers[0].op, Operator::Compatible);
        assert_eq!(reqs[1].specifiers[0].op, Operator::NotEqual);
        assert_eq!(reqs[2].specifiers[0].op, Operator::Arbitrary);
    }
}
