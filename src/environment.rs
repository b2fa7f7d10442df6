//! Snapshot of the active Python environment's installed distributions.

use std::collections::HashMap;
use std::process::Command;
use std::str::FromStr;

use serde::Deserialize;

use crate::requirement::normalize_name;
use crate::version::Version;

/// Installed distributions keyed by normalized name. Taken once per run and
/// treated as immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct InstalledSnapshot {
    packages: HashMap<String, Version>,
}

#[derive(Deserialize)]
struct PipListEntry {
    name: String,
    version: String,
}

impl InstalledSnapshot {
    /// Query the active environment via `pip list --format=json`.
    ///
    /// An empty snapshot (no Python, no pip) is not an error: every lookup
    /// simply comes back absent and the policy leaves those requirements
    /// alone.
    pub fn discover() -> Self {
        let commands: [(&str, &[&str]); 3] = [
            ("python3", &["-m", "pip", "list", "--format=json"]),
            ("python", &["-m", "pip", "list", "--format=json"]),
            ("pip", &["list", "--format=json"]),
        ];

        for (cmd, args) in commands {
            let Ok(output) = Command::new(cmd).args(args).output() else {
                continue;
            };
            if !output.status.success() {
                continue;
            }
            if let Ok(entries) = serde_json::from_slice::<Vec<PipListEntry>>(&output.stdout) {
                return Self::from_entries(entries);
            }
        }

        Self::default()
    }

    fn from_entries(entries: Vec<PipListEntry>) -> Self {
        let mut packages = HashMap::new();
        for entry in entries {
            if let Ok(version) = Version::from_str(&entry.version) {
                packages.insert(normalize_name(&entry.name), version);
            }
        }
        Self { packages }
    }

    /// Build a snapshot from a plain name → version mapping.
    pub fn from_map(map: HashMap<String, String>) -> Self {
        let mut packages = HashMap::new();
        for (name, version) in map {
            if let Ok(version) = Version::from_str(&version) {
                packages.insert(normalize_name(&name), version);
            }
        }
        Self { packages }
    }

    /// Look up an installed version by (already normalized) name.
    pub fn get(&self, name: &str) -> Option<&Version> {
        self.packages.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }
}
