//! xcpatch CLI Integration Tests
//!
//! ## Exit Codes
//! - 0: Files added / diff printed
//! - 1: Patch failure
//! - 2: Configuration or usage error

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const TEST12: &str = include_str!("../../testdata/Test12.pbxproj");
const CONFIRMATION: &str = "Files added to Xcode project successfully\n";

/// xcpatch command isolated from the user's config and environment
fn xcpatch_command(cwd: &Path) -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("xcpatch")?;
    cmd.current_dir(cwd);
    cmd.env("HOME", cwd);
    cmd.env("XDG_CONFIG_HOME", cwd.join(".config"));
    cmd.env_remove("RUST_LOG");
    for key in [
        "XCPATCH_PROJECT",
        "XCPATCH_GROUP",
        "XCPATCH_TARGET",
        "XCPATCH_BUILD_PHASE",
        "XCPATCH_STRICT",
    ] {
        cmd.env_remove(key);
    }
    Ok(cmd)
}

/// Scratch directory holding `Test12.xcodeproj/project.pbxproj`
fn scratch_project() -> Result<(TempDir, PathBuf)> {
    let dir = tempfile::tempdir()?;
    let bundle = dir.path().join("Test12.xcodeproj");
    fs::create_dir(&bundle)?;
    let descriptor = bundle.join("project.pbxproj");
    fs::write(&descriptor, TEST12)?;
    Ok((dir, descriptor))
}

#[test]
fn adds_files_to_discovered_project() -> Result<()> {
    let (dir, descriptor) = scratch_project()?;

    xcpatch_command(dir.path())?
        .args(["User.swift", "Model.swift"])
        .assert()
        .success()
        .stdout(CONFIRMATION);

    let patched = fs::read_to_string(&descriptor)?;
    assert_eq!(patched.matches("/* User.swift in Sources */").count(), 2);
    assert_eq!(patched.matches("/* Model.swift */").count(), 3);
    assert_eq!(patched.lines().count(), TEST12.lines().count() + 8);
    Ok(())
}

#[test]
fn explicit_project_path_and_selectors() -> Result<()> {
    let (dir, descriptor) = scratch_project()?;

    xcpatch_command(dir.path())?
        .args([
            "--project",
            "Test12.xcodeproj",
            "--group",
            "F1C41758CE68463E8CB18870",
            "--build-phase",
            "3EA678BEFCB54B688ADE0265",
            "Model=Shared/Model.swift",
        ])
        .assert()
        .success()
        .stdout(CONFIRMATION);

    let patched = fs::read_to_string(&descriptor)?;
    assert!(patched.contains("name = \"Model\"; path = \"Shared/Model.swift\";"));
    Ok(())
}

#[test]
fn dry_run_prints_diff_and_keeps_file() -> Result<()> {
    let (dir, descriptor) = scratch_project()?;

    xcpatch_command(dir.path())?
        .args(["--dry-run", "User.swift"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--- a/Test12.xcodeproj/project.pbxproj")
                .and(predicate::str::contains("/* User.swift in Sources */"))
                .and(predicate::str::contains("Files added").not()),
        );

    assert_eq!(fs::read_to_string(&descriptor)?, TEST12);
    Ok(())
}

#[test]
fn files_from_config_file() -> Result<()> {
    let (dir, descriptor) = scratch_project()?;
    fs::write(
        dir.path().join("xcpatch.toml"),
        r#"
project = "Test12.xcodeproj"
target = "Test12"

[[files]]
name = "Config.swift"

[[files]]
name = "Shader"
path = "Shaders/Shader.metal"
"#,
    )?;

    xcpatch_command(dir.path())?
        .assert()
        .success()
        .stdout(CONFIRMATION);

    let patched = fs::read_to_string(&descriptor)?;
    assert!(patched.contains("/* Config.swift in Sources */"));
    assert!(patched.contains("lastKnownFileType = sourcecode.metal; name = \"Shader\";"));
    Ok(())
}

#[test]
fn missing_project_exits_1() -> Result<()> {
    let dir = tempfile::tempdir()?;

    xcpatch_command(dir.path())?
        .arg("User.swift")
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("No .xcodeproj found"));
    Ok(())
}

#[test]
fn missing_group_exits_1_and_keeps_file() -> Result<()> {
    let (dir, descriptor) = scratch_project()?;

    xcpatch_command(dir.path())?
        .args(["--group", "Nowhere", "User.swift"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no group named `Nowhere`"));

    assert_eq!(fs::read_to_string(&descriptor)?, TEST12);
    Ok(())
}

#[test]
fn allow_missing_patches_remaining_regions() -> Result<()> {
    let (dir, descriptor) = scratch_project()?;

    xcpatch_command(dir.path())?
        .args(["--allow-missing", "--group", "Nowhere", "User.swift"])
        .assert()
        .success()
        .stdout(CONFIRMATION);

    let patched = fs::read_to_string(&descriptor)?;
    assert_eq!(patched.lines().count(), TEST12.lines().count() + 3);
    Ok(())
}

#[test]
fn bad_entry_syntax_exits_2() -> Result<()> {
    let (dir, descriptor) = scratch_project()?;

    xcpatch_command(dir.path())?
        .arg("=Orphan.swift")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("empty name"));

    assert_eq!(fs::read_to_string(&descriptor)?, TEST12);
    Ok(())
}

#[test]
fn invalid_build_phase_exits_2() -> Result<()> {
    let (dir, _descriptor) = scratch_project()?;

    xcpatch_command(dir.path())?
        .args(["--build-phase", "sources", "User.swift"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("build_phase"));
    Ok(())
}

#[test]
fn flag_overrides_invalid_config_value() -> Result<()> {
    let (dir, descriptor) = scratch_project()?;
    fs::write(dir.path().join("xcpatch.toml"), "build_phase = \"sources\"\n")?;

    xcpatch_command(dir.path())?
        .args(["--build-phase", "3EA678BEFCB54B688ADE0265", "User.swift"])
        .assert()
        .success()
        .stdout(CONFIRMATION);

    let patched = fs::read_to_string(&descriptor)?;
    assert_eq!(patched.matches("/* User.swift in Sources */").count(), 2);
    Ok(())
}

#[test]
fn invalid_config_value_without_override_exits_2() -> Result<()> {
    let (dir, descriptor) = scratch_project()?;
    fs::write(dir.path().join("xcpatch.toml"), "build_phase = \"sources\"\n")?;

    xcpatch_command(dir.path())?
        .arg("User.swift")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("`sources`"));

    assert_eq!(fs::read_to_string(&descriptor)?, TEST12);
    Ok(())
}

#[test]
fn malformed_group_id_exits_2() -> Result<()> {
    let (dir, descriptor) = scratch_project()?;

    xcpatch_command(dir.path())?
        .args(["--group", "f1c41758ce68463e8cb18870", "User.swift"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("`group`"));

    assert_eq!(fs::read_to_string(&descriptor)?, TEST12);
    Ok(())
}

#[test]
fn missing_config_file_exits_2() -> Result<()> {
    let (dir, _descriptor) = scratch_project()?;

    xcpatch_command(dir.path())?
        .args(["--config", "absent.toml", "User.swift"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("absent.toml does not exist"));
    Ok(())
}

#[test]
fn demo_config_registers_app_sources() -> Result<()> {
    let (dir, descriptor) = scratch_project()?;
    let config = Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/Test12.toml");

    xcpatch_command(dir.path())?
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(CONFIRMATION);

    let patched = fs::read_to_string(&descriptor)?;
    assert_eq!(patched.lines().count(), TEST12.lines().count() + 14 * 4);
    assert_eq!(patched.matches("/* TodoStore.swift in Sources */").count(), 2);
    Ok(())
}
