//! Parser for the section-based dialect (setup.cfg / tox.ini).
//!
//! Requirement lists live under named sections: `[options]`
//! `install_requires`, every key of `[options.extras_require]`, `deps` in
//! any tox section and `requires` under `[tox]`. Values are newline- or
//! comma-separated requirement strings run through the shared grammar.

use crate::error::FreezeError;
use crate::requirement::{parse_requirement_string, Requirement};

pub fn extract(
    text: &str,
    best_effort: bool,
    warnings: &mut Vec<String>,
) -> Result<Vec<Requirement>, FreezeError> {
    let mut requirements = Vec::new();
    let mut section = String::new();
    let mut in_requirement_key = false;

    let mut pos = 0;
    for line in text.split_inclusive('\n') {
        let line_start = pos;
        pos += line.len();
        let body = line.trim_end_matches(['\n', '\r']);
        let trimmed = body.trim_start();
        let indent = body.len() - trimmed.len();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if indent == 0 {
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                section = trimmed[1..trimmed.len() - 1].trim().to_lowercase();
                in_requirement_key = false;
                continue;
            }
            if let Some(sep) = body.find(['=', ':']) {
                let key = body[..sep].trim().to_lowercase();
                in_requirement_key = is_requirement_key(&section, &key);
                if in_requirement_key {
                    extract_items(
                        text,
                        line_start + sep + 1,
                        line_start + body.len(),
                        best_effort,
                        warnings,
                        &mut requirements,
                    )?;
                }
            } else {
                in_requirement_key = false;
            }
            continue;
        }

        // Indented continuation of the current key's value
        if in_requirement_key {
            extract_items(
                text,
                line_start + indent,
                line_start + body.len(),
                best_effort,
                warnings,
                &mut requirements,
            )?;
        }
    }

    Ok(requirements)
}

fn is_requirement_key(section: &str, key: &str) -> bool {
    (section == "options" && key == "install_requires")
        || section == "options.extras_require"
        || key == "deps"
        || (section == "tox" && key == "requires")
}

/// Pull the requirement items out of one physical line of a value.
fn extract_items(
    text: &str,
    start: usize,
    end: usize,
    best_effort: bool,
    warnings: &mut Vec<String>,
    out: &mut Vec<Requirement>,
) -> Result<(), FreezeError> {
    for item in split_items(&text[start..end]) {
        let raw = &text[start + item.start..start + item.end];
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        // tox directives (-rrequirements.txt) pass through untouched
        if trimmed.starts_with('-') {
            continue;
        }

        let item_start = start + item.start + (raw.len() - raw.trim_start().len());
        // tox factor conditions: "py312: pytest>=7" constrains the factor,
        // the requirement begins after the colon.
        let req_text = strip_factor_prefix(trimmed);
        let req_start = item_start + (trimmed.len() - req_text.len());

        match parse_requirement_string(req_text, req_start) {
            Ok(req) => out.push(req),
            Err(err) => {
                if best_effort {
                    warnings.push(format!("skipping unparsable requirement: {err}"));
                } else {
                    return Err(err);
                }
            }
        }
    }
    Ok(())
}

/// Split one value line on the commas that separate requirements.
///
/// A comma only starts a new item when what follows looks like the start of
/// a distribution name; `requests>=2,<3` keeps its second specifier.
fn split_items(line: &str) -> Vec<std::ops::Range<usize>> {
    let mut items = Vec::new();
    let mut item_start = 0;
    let mut depth = 0usize;

    let bytes = line.as_bytes();
    for (idx, &b) in bytes.iter().enumerate() {
        match b {
            b'[' | b'(' => depth += 1,
            b']' | b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                let rest = line[idx + 1..].trim_start();
                if rest.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
                    items.push(item_start..idx);
                    item_start = idx + 1;
                }
            }
            _ => {}
        }
    }
    items.push(item_start..line.len());
    items
}

fn strip_factor_prefix(item: &str) -> &str {
    if let Some(colon) = item.find(':') {
        let (prefix, rest) = item.split_at(colon);
        let is_factor = !prefix.is_empty()
            && prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ',' | '.' | '!'))
            && rest[1..].starts_with(char::is_whitespace);
        if is_factor {
            return rest[1..].trim_start();
        }
    }
    item
}
