pub mod pyproject;
pub mod requirements_txt;
pub mod setup_cfg;

use std::path::{Path, PathBuf};

use crate::error::FreezeError;
use crate::requirement::Requirement;

/// The supported declarative file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// requirements.txt and friends: one requirement per logical line
    PinnedFile,
    /// pyproject.toml: requirement strings inside TOML arrays
    StructuredTable,
    /// setup.cfg / tox.ini: requirement lists under named sections
    SectionBased,
}

impl Dialect {
    /// Pick a dialect from the file name, the way the original tooling
    /// recognizes configuration files.
    pub fn detect(path: &Path) -> Option<Dialect> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name == "setup.cfg" || name == "tox.ini" {
            return Some(Dialect::SectionBased);
        }
        if name.ends_with(".toml") {
            return Some(Dialect::StructuredTable);
        }
        if name.ends_with(".cfg") || name.ends_with(".ini") {
            return Some(Dialect::SectionBased);
        }
        if name.ends_with(".txt") || name.ends_with(".in") {
            return Some(Dialect::PinnedFile);
        }
        None
    }
}

/// A parsed configuration file: the untouched text plus the located
/// requirements. Splicing replacement spans back into `text` in order
/// reproduces a valid document of the same dialect.
#[derive(Debug)]
pub struct Document {
    pub path: PathBuf,
    pub dialect: Dialect,
    pub text: String,
    /// Requirements in document order (spans are ascending, non-overlapping)
    pub requirements: Vec<Requirement>,
    /// Best-effort mode: entries left untouched because they did not parse
    pub warnings: Vec<String>,
}

/// Parse `text` as the dialect matching `path`.
///
/// A malformed requirement fails the whole file unless `best_effort` is
/// set, in which case the offending entry is skipped and reported in
/// `warnings`.
pub fn parse_document(
    path: &Path,
    text: String,
    best_effort: bool,
) -> Result<Document, FreezeError> {
    let dialect =
        Dialect::detect(path).ok_or_else(|| FreezeError::UnknownDialect(path.to_path_buf()))?;

    let mut warnings = Vec::new();
    let requirements = match dialect {
        Dialect::PinnedFile => requirements_txt::extract(&text, best_effort, &mut warnings)?,
        Dialect::StructuredTable => pyproject::extract(&text, best_effort, &mut warnings)?,
        Dialect::SectionBased => setup_cfg::extract(&text, best_effort, &mut warnings)?,
    };

    debug_assert!(
        requirements
            .windows(2)
            .all(|w| w[0].span.end <= w[1].span.start),
        "requirement spans must be ascending and disjoint"
    );

    Ok(Document {
        path: path.to_path_buf(),
        dialect,
        text,
        requirements,
        warnings,
    })
}
