mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn pyfreeze() -> Command {
    Command::cargo_bin("pyfreeze").unwrap()
}

/// Test that --help flag works
#[test]
fn test_help_flag() {
    pyfreeze()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Freeze dependency version constraints"))
        .stdout(predicate::str::contains("--latest"))
        .stdout(predicate::str::contains("--operator"))
        .stdout(predicate::str::contains("--exclude"))
        .stdout(predicate::str::contains("--dry-run"));
}

/// Test that --version flag works
#[test]
fn test_version_flag() {
    pyfreeze()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pyfreeze"));
}

/// Test that a file path is required
#[test]
fn test_requires_path() {
    pyfreeze().assert().failure();
}

#[test]
fn test_freeze_requirements_txt_with_pins() {
    let project = common::TempProject::new();
    project.create_file("requirements.txt", common::sample_requirements_txt());

    pyfreeze()
        .arg(project.file_path("requirements.txt"))
        .args(["--pin", "alpha-pkg==1.5.0"])
        .args(["--pin", "beta-pkg==0.9.0"])
        .args(["--pin", "gamma-pkg==3.2.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("written"));

    assert_eq!(
        project.read_file("requirements.txt"),
        r#"# application dependencies
alpha-pkg==1.5.0
beta_pkg==0.9.0  # pinned for the demo
gamma-pkg==3.2.1
--index-url https://pypi.org/simple
-e ./pkgs/local-lib
"#
    );
}

#[test]
fn test_freeze_pyproject_preserves_quoting() {
    let project = common::TempProject::new();
    project.create_file("pyproject.toml", common::sample_pyproject_toml());

    pyfreeze()
        .arg(project.file_path("pyproject.toml"))
        .args(["--pin", "alpha-pkg==1.5.0"])
        .args(["--pin", "beta-pkg==0.9.0"])
        .args(["--pin", "gamma-pkg==3.2.1"])
        .args(["--pin", "setuptools==69.0.0"])
        .assert()
        .success();

    let content = project.read_file("pyproject.toml");
    assert!(content.contains("requires = [\"setuptools==69.0.0\"]"));
    assert!(content.contains("\"alpha-pkg==1.5.0\","));
    assert!(content.contains("'beta-pkg==0.9.0',"));
    assert!(content.contains("\"gamma-pkg==3.2.1\","));
    // Unrelated tables survive byte for byte
    assert!(content.contains("build-backend = \"setuptools.build_meta\""));
}

#[test]
fn test_freeze_setup_cfg_and_tox_ini() {
    let project = common::TempProject::new();
    project.create_file("setup.cfg", common::sample_setup_cfg());
    project.create_file("tox.ini", common::sample_tox_ini());

    pyfreeze()
        .arg(project.file_path("setup.cfg"))
        .arg(project.file_path("tox.ini"))
        .args(["--pin", "alpha-pkg==1.5.0"])
        .args(["--pin", "beta-pkg==0.9.0"])
        .args(["--pin", "gamma-pkg==3.2.1"])
        .assert()
        .success();

    let cfg = project.read_file("setup.cfg");
    assert!(cfg.contains("    alpha-pkg==1.5.0\n"));
    assert!(cfg.contains("    beta-pkg==0.9.0\n"));
    assert!(cfg.contains("    gamma-pkg==3.2.1\n"));
    assert!(cfg.contains("python_requires = >=3.8"));

    let tox = project.read_file("tox.ini");
    assert!(tox.contains("    alpha-pkg==1.5.0\n"));
    assert!(tox.contains("    beta-pkg==0.9.0\n"));
    assert!(tox.contains("commands = pytest"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let project = common::TempProject::new();
    project.create_file("requirements.txt", common::sample_requirements_txt());
    let before = project.read_file("requirements.txt");

    pyfreeze()
        .arg(project.file_path("requirements.txt"))
        .args(["--dry-run", "--pin", "alpha-pkg==1.5.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would write"));

    assert_eq!(project.read_file("requirements.txt"), before);
}

#[test]
fn test_second_run_reports_unchanged() {
    let project = common::TempProject::new();
    project.create_file("requirements.txt", "alpha-pkg>=1.0\n");
    let pin = ["--pin", "alpha-pkg==1.5.0"];

    pyfreeze()
        .arg(project.file_path("requirements.txt"))
        .args(pin)
        .assert()
        .success()
        .stdout(predicate::str::contains("written"));

    pyfreeze()
        .arg(project.file_path("requirements.txt"))
        .args(pin)
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"));

    assert_eq!(project.read_file("requirements.txt"), "alpha-pkg==1.5.0\n");
}

#[test]
fn test_custom_operator() {
    let project = common::TempProject::new();
    project.create_file("requirements.txt", "alpha-pkg\n");

    pyfreeze()
        .arg(project.file_path("requirements.txt"))
        .args(["--operator", ">=", "--pin", "alpha-pkg==1.5.0"])
        .assert()
        .success();

    assert_eq!(project.read_file("requirements.txt"), "alpha-pkg>=1.5.0\n");
}

#[test]
fn test_exclusion_pattern_leaves_requirement() {
    let project = common::TempProject::new();
    project.create_file("requirements.txt", "internal-tool>=1.0\nalpha-pkg\n");

    pyfreeze()
        .arg(project.file_path("requirements.txt"))
        .args(["-x", "internal-*", "--pin", "alpha-pkg==1.5.0"])
        .assert()
        .success();

    assert_eq!(
        project.read_file("requirements.txt"),
        "internal-tool>=1.0\nalpha-pkg==1.5.0\n"
    );
}

#[test]
fn test_strict_mode_fails_on_unresolved() {
    let project = common::TempProject::new();
    project.create_file("requirements.txt", "surely-not-installed-pkg>=1.0\n");
    let before = project.read_file("requirements.txt");

    pyfreeze()
        .arg(project.file_path("requirements.txt"))
        .arg("--strict")
        .assert()
        .failure()
        .stdout(predicate::str::contains("failed"));

    assert_eq!(project.read_file("requirements.txt"), before);
}

#[test]
fn test_missing_file_fails() {
    pyfreeze()
        .arg("/nonexistent/requirements.txt")
        .assert()
        .failure()
        .stdout(predicate::str::contains("failed"));
}

#[test]
fn test_unrecognized_file_fails() {
    let project = common::TempProject::new();
    project.create_file("setup.py", "from setuptools import setup\n");

    pyfreeze()
        .arg(project.file_path("setup.py"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("not a recognized type"));
}

#[test]
fn test_best_effort_skips_bad_entry() {
    let project = common::TempProject::new();
    project.create_file("requirements.txt", "alpha-pkg>=1.0\nbroken===\n");

    // Without --best-effort the file fails
    pyfreeze()
        .arg(project.file_path("requirements.txt"))
        .args(["--pin", "alpha-pkg==1.5.0"])
        .assert()
        .failure();

    pyfreeze()
        .arg(project.file_path("requirements.txt"))
        .args(["--best-effort", "--pin", "alpha-pkg==1.5.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("warning"));

    assert_eq!(
        project.read_file("requirements.txt"),
        "alpha-pkg==1.5.0\nbroken===\n"
    );
}

#[test]
fn test_one_failure_does_not_block_other_files() {
    let project = common::TempProject::new();
    project.create_file("requirements.txt", "alpha-pkg>=1.0\n");

    pyfreeze()
        .arg(project.file_path("missing.txt"))
        .arg(project.file_path("requirements.txt"))
        .args(["--pin", "alpha-pkg==1.5.0"])
        .assert()
        .failure();

    assert_eq!(project.read_file("requirements.txt"), "alpha-pkg==1.5.0\n");
}
