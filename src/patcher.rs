//! Byte-exact splicing of replacement spans into configuration files.

use std::fs;
use std::ops::Range;
use std::path::Path;

/// One replacement: the bytes at `span` in the original text become
/// `replacement`.
#[derive(Debug, Clone)]
pub struct Edit {
    pub span: Range<usize>,
    pub replacement: String,
}

/// Apply `edits` to `text`. Spans must be non-overlapping; they are sorted
/// into document order first, so callers may collect them in any order.
/// Every byte outside an edited span is carried over untouched. Returns
/// `None` when the result is identical to the input.
pub fn patch_document(text: &str, edits: &[Edit]) -> Option<String> {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by_key(|e| e.span.start);
    debug_assert!(
        ordered.windows(2).all(|w| w[0].span.end <= w[1].span.start),
        "edit spans must not overlap"
    );

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for edit in ordered {
        out.push_str(&text[cursor..edit.span.start]);
        out.push_str(&edit.replacement);
        cursor = edit.span.end;
    }
    out.push_str(&text[cursor..]);

    if out == text { None } else { Some(out) }
}

/// Write `content` to `path` only when it differs from what is on disk.
///
/// The write goes through a temp file in the same directory followed by a
/// rename, so a crash mid-write never leaves a truncated file behind.
/// Returns whether anything was written.
pub fn write_if_changed(path: &Path, content: &str) -> std::io::Result<bool> {
    if let Ok(existing) = fs::read_to_string(path) {
        if existing == content {
            return Ok(false);
        }
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let tmp = dir.join(format!(".{file_name}.tmp"));

    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(true)
}
