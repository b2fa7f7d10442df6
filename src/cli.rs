use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use crate::requirement::Operator;
use crate::resolver::parse_override;
use crate::version::Version;

/// Freeze dependency version constraints in Python configuration files
#[derive(Parser, Debug, Clone)]
#[command(name = "pyfreeze")]
#[command(author, version, long_about = None)]
pub struct Args {
    /// Configuration files to freeze (requirements.txt, pyproject.toml,
    /// setup.cfg, tox.ini)
    #[arg(value_name = "FILE", required = true)]
    pub paths: Vec<PathBuf>,

    /// Freeze to the latest published versions instead of the installed ones
    #[arg(short, long)]
    pub latest: bool,

    /// Operator for frozen specifiers
    #[arg(short, long, default_value = "==", value_parser = Operator::from_str)]
    pub operator: Operator,

    /// Never pin names matching this glob pattern (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Pin a name to an explicit version, NAME==VERSION (repeatable)
    #[arg(long = "pin", value_name = "NAME==VERSION", value_parser = parse_override)]
    pub pins: Vec<(String, Version)>,

    /// Include pre-release versions when querying the index
    #[arg(short, long)]
    pub pre_release: bool,

    /// Fail when a versioned requirement cannot be resolved
    #[arg(short, long)]
    pub strict: bool,

    /// Skip unparsable entries instead of failing the file
    #[arg(short, long)]
    pub best_effort: bool,

    /// Report what would change without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Per-request timeout for index lookups, in seconds
    #[arg(long, default_value_t = 10, value_name = "SECONDS")]
    pub timeout: u64,

    /// Maximum concurrent index lookups
    #[arg(long, default_value_t = 10, value_name = "N")]
    pub concurrency: usize,

    /// Base URL of the package index JSON API
    #[arg(long, default_value = "https://pypi.org/pypi", value_name = "URL")]
    pub index_url: String,
}
