use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a temporary project directory
pub struct TempProject {
    pub dir: TempDir,
}

impl TempProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a file in the project with the given content
    pub fn create_file(&self, relative_path: &str, content: &str) {
        let file_path = self.dir.path().join(relative_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write file");
    }

    pub fn file_path(&self, relative_path: &str) -> PathBuf {
        self.dir.path().join(relative_path)
    }

    pub fn read_file(&self, relative_path: &str) -> String {
        fs::read_to_string(self.file_path(relative_path)).expect("Failed to read file")
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}

// Fixture names are deliberately fake so no lookup against the real
// environment ever resolves them.

pub fn sample_requirements_txt() -> &'static str {
    r#"# application dependencies
alpha-pkg>=1.0,<2
beta_pkg==0.9.0  # pinned for the demo
gamma-pkg
--index-url https://pypi.org/simple
-e ./pkgs/local-lib
"#
}

pub fn sample_pyproject_toml() -> &'static str {
    r#"[build-system]
requires = ["setuptools>=61.0"]
build-backend = "setuptools.build_meta"

[project]
name = "test-project"
version = "0.1.0"
dependencies = [
    "alpha-pkg>=1.0,<2",
    'beta-pkg',
]

[project.optional-dependencies]
dev = [
    "gamma-pkg>=0.5",
]
"#
}

pub fn sample_setup_cfg() -> &'static str {
    r#"[metadata]
name = test-project

[options]
python_requires = >=3.8
install_requires =
    alpha-pkg>=1.0
    beta-pkg

[options.extras_require]
dev =
    gamma-pkg>=0.5
"#
}

pub fn sample_tox_ini() -> &'static str {
    r#"[tox]
envlist = py311
requires =
    alpha-pkg>=1

[testenv]
deps =
    beta-pkg>=0.5
commands = pytest
"#
}
