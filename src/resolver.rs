//! Resolution of distribution names to concrete versions.
//!
//! Each distinct normalized name is resolved once per run, either against
//! the installed environment snapshot or against the package index. A name
//! whose resolution comes back absent simply keeps its declared specifiers.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio::sync::Semaphore;

use crate::environment::InstalledSnapshot;
use crate::pypi::PyPiClient;
use crate::requirement::normalize_name;
use crate::version::Version;

/// Distributions that must never be pinned: backport shims whose pinned
/// presence breaks environments where the stdlib version is used instead.
const DO_NOT_PIN: [&str; 2] = ["importlib-metadata", "importlib-resources"];

/// Where concrete versions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Versions of distributions installed in the active environment
    Installed,
    /// Latest published versions from the package index
    Latest,
}

/// Why an attempted resolution produced no version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveFailure {
    /// The lookup outlived the per-request timeout
    TimedOut,
    /// Index error: unknown name, network failure, no usable versions
    Index(String),
}

impl std::fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveFailure::TimedOut => f.write_str("index lookup timed out"),
            ResolveFailure::Index(message) => f.write_str(message),
        }
    }
}

/// The answer for one normalized distribution name.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Concrete version to freeze to; `None` leaves the requirement alone
    pub resolved: Option<Version>,
    /// Published versions, newest first (index mode only)
    pub available: Vec<Version>,
    /// Set when resolution was attempted but failed. Absence by exclusion
    /// is not a failure.
    pub failure: Option<ResolveFailure>,
}

pub struct Resolver {
    mode: ResolveMode,
    snapshot: InstalledSnapshot,
    client: PyPiClient,
    overrides: HashMap<String, Version>,
    exclusions: Vec<Regex>,
    include_prerelease: bool,
    timeout: Duration,
    concurrency: usize,
}

impl Resolver {
    pub fn new(mode: ResolveMode, snapshot: InstalledSnapshot, client: PyPiClient) -> Self {
        Self {
            mode,
            snapshot,
            client,
            overrides: HashMap::new(),
            exclusions: Vec::new(),
            include_prerelease: false,
            timeout: Duration::from_secs(10),
            concurrency: 10,
        }
    }

    /// Pin `name` to `version` regardless of mode or what is installed.
    pub fn with_override(mut self, name: &str, version: Version) -> Self {
        self.overrides.insert(normalize_name(name), version);
        self
    }

    /// Exclude names matching a shell-style glob pattern (`*` and `?`).
    /// Patterns are matched against normalized names.
    pub fn with_exclusion(mut self, pattern: &str) -> Self {
        self.exclusions.push(glob_to_regex(pattern));
        self
    }

    pub fn with_prerelease(mut self, include: bool) -> Self {
        self.include_prerelease = include;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// True when `name` (normalized) is excluded from freezing, either by a
    /// user pattern or by the built-in do-not-pin set.
    pub fn is_excluded(&self, name: &str) -> bool {
        DO_NOT_PIN.contains(&name) || self.exclusions.iter().any(|re| re.is_match(name))
    }

    /// Resolve every distinct normalized name in `names` once.
    ///
    /// Index lookups run concurrently behind a permit limit; a lookup that
    /// outlives the per-request timeout yields an absent resolution with a
    /// recorded failure rather than aborting the run.
    pub async fn resolve_all(&self, names: &[String]) -> HashMap<String, QueryResult> {
        let distinct: HashSet<String> = names.iter().map(|n| normalize_name(n)).collect();

        let mut results = HashMap::new();
        let mut remote: Vec<String> = Vec::new();

        for name in distinct {
            if let Some(version) = self.overrides.get(&name) {
                results.insert(
                    name,
                    QueryResult {
                        resolved: Some(version.clone()),
                        ..QueryResult::default()
                    },
                );
            } else if self.is_excluded(&name) {
                results.insert(name, QueryResult::default());
            } else {
                match self.mode {
                    ResolveMode::Installed => {
                        let resolved = self.snapshot.get(&name).cloned();
                        results.insert(
                            name,
                            QueryResult {
                                resolved,
                                ..QueryResult::default()
                            },
                        );
                    }
                    ResolveMode::Latest => remote.push(name),
                }
            }
        }

        if !remote.is_empty() {
            results.extend(self.resolve_remote(remote).await);
        }
        results
    }

    async fn resolve_remote(&self, names: Vec<String>) -> HashMap<String, QueryResult> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = Vec::with_capacity(names.len());

        for name in names {
            let client = self.client.clone();
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.timeout;
            let include_prerelease = self.include_prerelease;

            tasks.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return (name, QueryResult::default());
                };

                let outcome =
                    tokio::time::timeout(timeout, client.available_versions(&name)).await;
                let result = match outcome {
                    Ok(Ok(mut available)) => {
                        if !include_prerelease {
                            available.retain(|v| !v.is_prerelease());
                        }
                        QueryResult {
                            resolved: available.first().cloned(),
                            failure: if available.is_empty() {
                                Some(ResolveFailure::Index(format!(
                                    "no suitable versions for '{name}'"
                                )))
                            } else {
                                None
                            },
                            available,
                        }
                    }
                    Ok(Err(err)) => QueryResult {
                        failure: Some(ResolveFailure::Index(err.to_string())),
                        ..QueryResult::default()
                    },
                    Err(_) => QueryResult {
                        failure: Some(ResolveFailure::TimedOut),
                        ..QueryResult::default()
                    },
                };
                (name, result)
            }));
        }

        let mut results = HashMap::new();
        for task in tasks {
            if let Ok((name, result)) = task.await {
                results.insert(name, result);
            }
        }
        results
    }
}

/// Translate a shell-style glob into an anchored regex. `*` matches any
/// run of characters, `?` exactly one; everything else is literal.
fn glob_to_regex(pattern: &str) -> Regex {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            _ => source.push_str(&regex::escape(&ch.to_string())),
        }
    }
    source.push('$');
    // Escaped literals cannot produce an invalid pattern
    Regex::new(&source).unwrap_or_else(|_| Regex::new("^$").unwrap())
}

/// Parse a `name==version` override argument.
pub fn parse_override(arg: &str) -> Result<(String, Version), String> {
    let (name, version) = arg
        .split_once("==")
        .ok_or_else(|| format!("expected NAME==VERSION, got '{arg}'"))?;
    let version = Version::from_str(version.trim()).map_err(|e| e.to_string())?;
    Ok((name.trim().to_string(), version))
}
