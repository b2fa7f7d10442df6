use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version string: {0}")]
    InvalidVersion(String),
}

/// A parsed package version (PEP 440 subset).
///
/// Enough structure for ordering and pre-release detection; the original
/// string is retained so display never reformats what a file or an index
/// gave us.
#[derive(Debug, Clone)]
pub struct Version {
    pub epoch: u64,
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: Option<String>,
    /// Local version segment (after `+`)
    pub local: Option<String>,
    /// Original string representation
    pub original: String,
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.epoch == other.epoch
            && self.major == other.major
            && self.minor == other.minor
            && self.patch == other.patch
            && self.pre_release == other.pre_release
    }
}

impl Eq for Version {}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            epoch: 0,
            major,
            minor,
            patch,
            pre_release: None,
            local: None,
            original: format!("{major}.{minor}.{patch}"),
        }
    }

    /// Check if this is a pre-release version (dev/alpha/beta/rc).
    ///
    /// Post-releases count as releases.
    pub fn is_prerelease(&self) -> bool {
        match &self.pre_release {
            Some(tag) => !is_post_tag(tag),
            None => false,
        }
    }
}

fn is_post_tag(tag: &str) -> bool {
    tag.trim_start_matches(['.', '-']).starts_with("post")
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let original = s.trim();
        let mut rest = original;

        // Epoch separator (rare): "1!2.0"
        let epoch = if let Some(idx) = rest.find('!') {
            let epoch = rest[..idx]
                .parse()
                .map_err(|_| VersionError::InvalidVersion(original.to_string()))?;
            rest = &rest[idx + 1..];
            epoch
        } else {
            0
        };

        // Local version separator: "1.2.3+cu118"
        let (version_part, local) = if let Some(idx) = rest.find('+') {
            (&rest[..idx], Some(rest[idx + 1..].to_string()))
        } else {
            (rest, None)
        };

        let (base_part, pre_release) = split_release_tag(version_part);
        if base_part.is_empty() {
            return Err(VersionError::InvalidVersion(original.to_string()));
        }

        let mut parts = base_part.split('.');

        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| VersionError::InvalidVersion(original.to_string()))?;
        let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);

        Ok(Version {
            epoch,
            major,
            minor,
            patch,
            pre_release,
            local,
            original: original.to_string(),
        })
    }
}

/// Split "1.2.3rc1" into ("1.2.3", Some("rc1")).
///
/// The release tag starts at the first alphabetic character or hyphen that
/// is not part of the dotted numeric release segment.
fn split_release_tag(s: &str) -> (&str, Option<String>) {
    for (idx, ch) in s.char_indices() {
        if ch.is_ascii_alphabetic() || ch == '-' {
            if idx == 0 {
                return (s, None);
            }
            // Strip a trailing dot separator: "1.2.3.dev1"
            let base = s[..idx].trim_end_matches('.');
            return (base, Some(s[idx..].to_string()));
        }
    }
    (s, None)
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.major.cmp(&other.major) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.minor.cmp(&other.minor) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.patch.cmp(&other.patch) {
            Ordering::Equal => {}
            ord => return ord,
        }

        // Pre-releases sort below the release, post-releases above it.
        fn rank(tag: &Option<String>) -> u8 {
            match tag {
                None => 1,
                Some(t) if is_post_tag(t) => 2,
                Some(_) => 0,
            }
        }
        match rank(&self.pre_release).cmp(&rank(&other.pre_release)) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match (&self.pre_release, &other.pre_release) {
            (Some(a), Some(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}
