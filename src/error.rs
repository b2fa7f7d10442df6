use thiserror::Error;

use crate::version::VersionError;

/// Errors produced by the freeze pipeline.
///
/// Parse and patch errors are file-scoped: a multi-file run reports them per
/// file and keeps going. Nothing here ever leaves a partially written file
/// behind.
#[derive(Error, Debug)]
pub enum FreezeError {
    #[error("invalid requirement {text:?} at byte {offset}")]
    Parse { text: String, offset: usize },

    #[error("could not resolve a version for {0}")]
    Unresolved(String),

    #[error("resolving {0} timed out")]
    ResolutionTimeout(String),

    #[error("conflicting specifiers for {name}: {rendered}")]
    ConflictingSpecifiers { name: String, rendered: String },

    #[error("{0} is not a recognized type of configuration file")]
    UnknownDialect(std::path::PathBuf),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FreezeError {
    pub(crate) fn parse(text: impl Into<String>, offset: usize) -> Self {
        Self::Parse {
            text: text.into(),
            offset,
        }
    }
}
