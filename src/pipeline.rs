//! End-to-end run over a set of configuration files: parse everything,
//! resolve the union of names once, then patch each file independently.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FreezeError;
use crate::freeze;
use crate::parsers::{parse_document, Document};
use crate::patcher::{patch_document, write_if_changed, Edit};
use crate::requirement::{
    render_specifiers, specifiers_satisfiable, Operator, RequirementKind,
};
use crate::resolver::{QueryResult, ResolveFailure, Resolver};

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Operator for the frozen specifier, `==` unless overridden
    pub operator: Operator,
    /// Treat unresolved or timed-out versioned requirements as failures
    pub strict: bool,
    /// Skip unparsable entries instead of failing the file
    pub best_effort: bool,
    /// Compute and report everything but write nothing
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            operator: Operator::Equal,
            strict: false,
            best_effort: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Every requirement already matched its resolution
    Unchanged,
    Written,
    /// Dry run: the file would have been rewritten
    WouldWrite,
    Failed(String),
}

/// One requirement that was (or would be) rewritten.
#[derive(Debug, Clone)]
pub struct Change {
    pub name: String,
    pub before: String,
    pub after: String,
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    pub changes: Vec<Change>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.files
            .iter()
            .any(|f| matches!(f.outcome, FileOutcome::Failed(_)))
    }

    pub fn total_changes(&self) -> usize {
        self.files.iter().map(|f| f.changes.len()).sum()
    }
}

/// Freeze every file in `paths`.
///
/// Files are parsed up front so the union of their distribution names can
/// be resolved in one pass; one file failing to parse or to write never
/// blocks the others.
pub async fn run(paths: &[PathBuf], resolver: &Resolver, options: &RunOptions) -> RunReport {
    let mut report = RunReport::default();
    let mut documents: Vec<Document> = Vec::new();

    for path in paths {
        match fs::read_to_string(path) {
            Ok(text) => match parse_document(path, text, options.best_effort) {
                Ok(doc) => documents.push(doc),
                Err(err) => report.files.push(failed(path, err.to_string())),
            },
            Err(err) => report.files.push(failed(path, format!("cannot read file: {err}"))),
        }
    }

    let names: Vec<String> = documents
        .iter()
        .flat_map(|d| d.requirements.iter())
        .filter(|r| matches!(r.kind, RequirementKind::Versioned))
        .map(|r| r.name.clone())
        .collect();
    let results = resolver.resolve_all(&names).await;

    for doc in documents {
        report.files.push(freeze_document(doc, resolver, &results, options));
    }
    report
}

fn failed(path: &Path, message: String) -> FileReport {
    FileReport {
        path: path.to_path_buf(),
        outcome: FileOutcome::Failed(message),
        changes: Vec::new(),
        warnings: Vec::new(),
    }
}

fn freeze_document(
    doc: Document,
    resolver: &Resolver,
    results: &HashMap<String, QueryResult>,
    options: &RunOptions,
) -> FileReport {
    let mut edits: Vec<Edit> = Vec::new();
    let mut changes: Vec<Change> = Vec::new();

    for req in &doc.requirements {
        if !matches!(req.kind, RequirementKind::Versioned) {
            continue;
        }
        let Some(result) = results.get(&req.name) else {
            continue;
        };

        if options.strict
            && result.resolved.is_none()
            && !resolver.is_excluded(&req.name)
        {
            let message = match &result.failure {
                Some(ResolveFailure::TimedOut) => {
                    FreezeError::ResolutionTimeout(req.name.clone()).to_string()
                }
                Some(failure @ ResolveFailure::Index(_)) => failure.to_string(),
                None => FreezeError::Unresolved(req.name.clone()).to_string(),
            };
            return FileReport {
                path: doc.path,
                outcome: FileOutcome::Failed(message),
                changes: Vec::new(),
                warnings: doc.warnings,
            };
        }

        if !specifiers_satisfiable(&req.specifiers) {
            let err = FreezeError::ConflictingSpecifiers {
                name: req.name.clone(),
                rendered: render_specifiers(&req.specifiers),
            };
            return FileReport {
                path: doc.path,
                outcome: FileOutcome::Failed(err.to_string()),
                changes: Vec::new(),
                warnings: doc.warnings,
            };
        }

        if let Some(specs) = freeze::apply(req, result, options.operator) {
            let replacement = req.render_with_specifiers(&specs);
            changes.push(Change {
                name: req.name.clone(),
                before: req.raw_text.clone(),
                after: replacement.clone(),
            });
            edits.push(Edit {
                span: req.span.clone(),
                replacement,
            });
        }
    }

    let outcome = match patch_document(&doc.text, &edits) {
        None => FileOutcome::Unchanged,
        Some(_) if options.dry_run => FileOutcome::WouldWrite,
        Some(patched) => match write_if_changed(&doc.path, &patched) {
            Ok(_) => FileOutcome::Written,
            Err(err) => FileOutcome::Failed(format!("cannot write file: {err}")),
        },
    };

    FileReport {
        path: doc.path,
        outcome,
        changes,
        warnings: doc.warnings,
    }
}
