use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::version::Version;

/// Client for the PyPI JSON API (or a compatible index).
#[derive(Clone)]
pub struct PyPiClient {
    client: reqwest::Client,
    base_url: String,
}

/// PyPI JSON API response structure
#[derive(Debug, Deserialize)]
struct PyPiResponse {
    releases: HashMap<String, Vec<PyPiRelease>>,
}

#[derive(Debug, Deserialize)]
struct PyPiRelease {
    yanked: Option<bool>,
}

impl PyPiClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("pyfreeze/", env!("CARGO_PKG_VERSION")))
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: "https://pypi.org/pypi".to_string(),
        }
    }

    pub fn with_index_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch every published, non-yanked version of a distribution,
    /// newest first.
    pub async fn available_versions(&self, name: &str) -> Result<Vec<Version>> {
        let url = format!("{}/{name}/json", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to fetch package '{name}'"))?;

        if !response.status().is_success() {
            if response.status() == 404 {
                return Err(anyhow!("package '{name}' not found on the index"));
            }
            return Err(anyhow!(
                "index request for '{name}' failed with status {}",
                response.status()
            ));
        }

        let data: PyPiResponse = response
            .json()
            .await
            .with_context(|| format!("failed to parse index response for '{name}'"))?;

        let mut versions: Vec<Version> = Vec::new();
        for (version_str, releases) in &data.releases {
            // Skip yanked releases (empty release list or all files yanked)
            if releases.is_empty() {
                continue;
            }
            if releases.iter().all(|r| r.yanked.unwrap_or(false)) {
                continue;
            }
            if let Ok(version) = Version::from_str(version_str) {
                versions.push(version);
            }
        }

        if versions.is_empty() {
            return Err(anyhow!("no valid versions found for package '{name}'"));
        }

        versions.sort();
        versions.reverse();
        Ok(versions)
    }
}

impl Default for PyPiClient {
    fn default() -> Self {
        Self::new()
    }
}
