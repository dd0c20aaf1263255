//! End-to-end tests of the `toolshed` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

/// `toolshed` confined to `root`, with a package manager that never works.
fn toolshed(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("toolshed").unwrap();
    cmd.env("TOOLSHED_CONFIG_DIR", root.join("config"))
        .env("TOOLSHED_CACHE_DIR", root.join("cache"))
        .env("TOOLSHED_TOOLS_DIR", root.join("tools"))
        .env("TOOLSHED_BINARIES_DIR", root.join("binaries"))
        .env("TOOLSHED_TMPDIR", root)
        .env("TOOLSHED_CONDA", root.join("no-such-conda"))
        .env_remove("TOOLSHED_CONFIG")
        .env_remove("RUST_LOG")
        .current_dir(root);
    cmd
}

#[test]
fn test_help() {
    let dir = tempfile::tempdir().unwrap();
    toolshed(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tool"))
        .stdout(predicate::str::contains("annex"))
        .stdout(predicate::str::contains("rmdup"));
}

#[test]
fn test_tool_list() {
    let dir = tempfile::tempdir().unwrap();
    toolshed(dir.path())
        .args(["tool", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("git-annex 7.20181105"))
        .stdout(predicate::str::contains("mvicuna 1.0"))
        .stdout(predicate::str::contains("novoalign 3.07.00"))
        .stdout(predicate::str::contains("samtools 1.9"))
        .stdout(predicate::str::contains("conda-forge::git-annex=7.20181105"));
}

#[test]
fn test_unknown_tool() {
    let dir = tempfile::tempdir().unwrap();
    toolshed(dir.path())
        .args(["tool", "path", "bwa"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown tool 'bwa'"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "no_such_key = 1\n").unwrap();
    toolshed(dir.path())
        .args(["--config", config.to_str().unwrap(), "tool", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_json_log_format() {
    let dir = tempfile::tempdir().unwrap();
    toolshed(dir.path())
        .args(["--format", "json", "--level", "debug", "tool", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("\"level\":\"DEBUG\""))
        .stderr(predicate::str::contains("Loaded settings"));
}

#[test]
fn test_log_filter_overrides_level() {
    let dir = tempfile::tempdir().unwrap();
    toolshed(dir.path())
        .args(["--level", "error", "--log-filter", "toolshed=debug", "tool", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Loaded settings"));

    toolshed(dir.path())
        .args(["--level", "error", "tool", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Loaded settings").not());
}

#[test]
fn test_initremote_rejects_bad_attribute() {
    let dir = tempfile::tempdir().unwrap();
    toolshed(dir.path())
        .args(["annex", "initremote", "backup", "directory", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected key=value"));
}

#[test]
fn test_annex_get_requires_symlink() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("plain.bam"), "x").unwrap();
    toolshed(dir.path())
        .args(["annex", "get", "plain.bam"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a symlink"));
}

#[cfg(target_os = "linux")]
mod bundled {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    /// Install a stand-in mvicuna where the bundled binary is expected.
    fn bundle_mvicuna(root: &Path) -> PathBuf {
        let dir = root.join("binaries/mvicuna/linux64");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("mvicuna");
        let script = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    -ipfq) inp=$2 ;;
    -opfq) op=$2 ;;
    -osfq) os=$2 ;;
    -drm_op) drm=$2 ;;
  esac
  shift 2
done
cp "${inp%%,*}" "${drm%%,*}"
cp "${inp#*,}" "${drm#*,}"
: > "$os"
mv "${drm%%,*}" "${op%%,*}"
mv "${drm#*,}" "${op#*,}"
"#;
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_tool_path_falls_back_to_bundled_binary() {
        let dir = tempfile::tempdir().unwrap();
        let bundled = bundle_mvicuna(dir.path());
        toolshed(dir.path())
            .args(["tool", "path", "mvicuna"])
            .assert()
            .success()
            .stdout(format!("{}\n", bundled.display()));
    }

    #[test]
    fn test_rmdup_with_bundled_binary() {
        let dir = tempfile::tempdir().unwrap();
        bundle_mvicuna(dir.path());
        std::fs::write(dir.path().join("r1.fq"), "@a\nAC\n+\nII\n").unwrap();
        std::fs::write(dir.path().join("r2.fq"), "@a\nGT\n+\nII\n").unwrap();

        toolshed(dir.path())
            .args(["rmdup", "r1.fq", "r2.fq", "o1.fq", "o2.fq"])
            .assert()
            .success();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("o1.fq")).unwrap(),
            "@a\nAC\n+\nII\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("o2.fq")).unwrap(),
            "@a\nGT\n+\nII\n"
        );
    }

    #[test]
    fn test_unavailable_tool_lists_attempts() {
        let dir = tempfile::tempdir().unwrap();
        toolshed(dir.path())
            .args(["tool", "path", "mvicuna"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("is unavailable"));
    }
}
