//! AnnexStore against a stand-in git-annex script.

#![cfg(unix)]

use std::os::unix::fs::{PermissionsExt, symlink};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use toolshed_annex::{AnnexStore, GitAnnexTool, StoreLayout};
use toolshed_core::Error;
use toolshed_core::tools::{InstallMethod, PreexistingBinary, ToolHandle, ToolSpec};

const OBJECT: &str = "../.store/objects/ab/cdef123";

/// Stand-in for git-annex: `get` writes content through the link, `drop`
/// deletes it, and every call is logged as `<cwd name> <args>`.
const FAKE_ANNEX: &str = r#"
echo "$(basename "$PWD") $*" >> "$ANNEX_LOG"
case "$1" in
  get)
    target=$(readlink "$2")
    mkdir -p "$(dirname "$target")"
    printf 'fetched content\n' > "$target"
    ;;
  drop)
    rm -f "$(readlink "$2")"
    ;;
esac
"#;

struct Fixture {
    dir: TempDir,
    log: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("annex.log");
        std::fs::create_dir_all(dir.path().join("repo/data")).unwrap();
        symlink(OBJECT, dir.path().join("repo/data/sample.bam")).unwrap();
        Self { dir, log }
    }

    fn repo(&self) -> PathBuf {
        self.dir.path().join("repo")
    }

    fn link(&self) -> PathBuf {
        self.repo().join("data/sample.bam")
    }

    fn object(&self) -> PathBuf {
        self.repo().join(".store/objects/ab/cdef123")
    }

    /// Write the stand-in with the log path baked in.
    fn annex_script(&self, body: &str) -> PathBuf {
        let path = self.dir.path().join("git-annex");
        let script = format!(
            "#!/bin/sh\nANNEX_LOG='{}'\n{body}\n",
            self.log.display()
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn annex(&self, body: &str) -> GitAnnexTool {
        let script = self.annex_script(body);
        GitAnnexTool::from_handle(ToolHandle::new(
            ToolSpec::unversioned("git-annex"),
            vec![InstallMethod::preexisting(PreexistingBinary::new(script))],
        ))
        .in_work_tree(self.repo())
    }

    fn store(&self) -> AnnexStore {
        AnnexStore::new(self.annex(FAKE_ANNEX), StoreLayout::new(".store/objects"))
    }

    fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }
}

fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata()
        .is_ok_and(|meta| meta.file_type().is_symlink())
}

#[test]
fn test_get_materializes_object() {
    let fx = Fixture::new();
    let store = fx.store();
    let cwd = std::env::current_dir().unwrap();

    assert!(!fx.object().is_file());
    store.get(&fx.link()).unwrap();

    assert!(fx.object().is_file());
    assert!(is_symlink(&fx.link()));
    assert_eq!(std::fs::read_link(fx.link()).unwrap(), PathBuf::from(OBJECT));
    assert_eq!(std::fs::read_to_string(fx.link()).unwrap(), "fetched content\n");
    assert_eq!(fx.calls(), vec!["data get sample.bam"]);
    // The working directory only applied to the child
    assert_eq!(std::env::current_dir().unwrap(), cwd);
}

#[test]
fn test_get_twice_fetches_once() {
    let fx = Fixture::new();
    let store = fx.store();

    store.get(&fx.link()).unwrap();
    store.get(&fx.link()).unwrap();

    assert_eq!(fx.calls(), vec!["data get sample.bam"]);
}

#[test]
fn test_get_then_drop_restores_state() {
    let fx = Fixture::new();
    let store = fx.store();

    store.get(&fx.link()).unwrap();
    store.drop(&fx.link()).unwrap();

    assert!(is_symlink(&fx.link()));
    assert_eq!(std::fs::read_link(fx.link()).unwrap(), PathBuf::from(OBJECT));
    assert!(!fx.object().is_file());
    assert!(!fx.link().is_file());
    assert_eq!(fx.calls(), vec!["data get sample.bam", "data drop sample.bam"]);
}

#[test]
fn test_drop_when_absent_is_noop() {
    let fx = Fixture::new();
    fx.store().drop(&fx.link()).unwrap();
    assert!(fx.calls().is_empty());
}

#[test]
fn test_get_through_intermediate_link() {
    let fx = Fixture::new();
    std::fs::create_dir_all(fx.repo().join("results")).unwrap();
    let alias = fx.repo().join("results/input.bam");
    symlink("../data/sample.bam", &alias).unwrap();

    fx.store().get(&alias).unwrap();

    assert!(fx.object().is_file());
    assert!(is_symlink(&alias));
    // git-annex ran next to the link that points into the store
    assert_eq!(fx.calls(), vec!["data get sample.bam"]);
}

#[test]
fn test_non_symlink_is_rejected_without_running() {
    let fx = Fixture::new();
    let plain = fx.repo().join("data/plain.txt");
    std::fs::write(&plain, "x").unwrap();
    let store = fx.store();

    assert!(matches!(store.get(&plain), Err(Error::BrokenReference { .. })));
    assert!(matches!(store.drop(&plain), Err(Error::BrokenReference { .. })));
    assert!(fx.calls().is_empty());
}

#[test]
fn test_dangling_chain_outside_store_is_rejected_without_running() {
    let fx = Fixture::new();
    let link = fx.repo().join("data/a.bam");
    symlink("missing_dir/other.bam", &link).unwrap();
    let store = fx.store();

    let err = store.get(&link).unwrap_err();
    assert!(matches!(err, Error::BrokenReference { .. }));
    assert!(err.to_string().contains("chain ends outside the store"));
    assert!(matches!(store.drop(&link), Err(Error::BrokenReference { .. })));
    assert!(fx.calls().is_empty());
}

#[test]
fn test_get_that_fetches_nothing_is_an_error() {
    let fx = Fixture::new();
    let store = AnnexStore::new(
        fx.annex(r#"echo "$(basename "$PWD") $*" >> "$ANNEX_LOG""#),
        StoreLayout::new(".store/objects"),
    );

    let err = store.get(&fx.link()).unwrap_err();
    assert!(matches!(err, Error::BrokenReference { .. }));
    assert!(err.to_string().contains("still absent"));
}

#[test]
fn test_failing_get_reports_command() {
    let fx = Fixture::new();
    let store = AnnexStore::new(fx.annex("exit 1"), StoreLayout::new(".store/objects"));

    match store.get(&fx.link()).unwrap_err() {
        Error::ProcessFailure { command, code } => {
            assert_eq!(code, Some(1));
            assert!(command.ends_with("git-annex get sample.bam"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_init_remote_defaults_encryption() {
    let fx = Fixture::new();
    let store = fx.store();

    store
        .init_remote("backup", "directory", [("directory", "/mnt/backup")])
        .unwrap();
    store
        .init_remote("cloud", "S3", [("encryption", "shared"), ("bucket", "b")])
        .unwrap();

    assert_eq!(
        fx.calls(),
        vec![
            "repo initremote backup type=directory directory=/mnt/backup encryption=none",
            "repo initremote cloud type=S3 bucket=b encryption=shared",
        ]
    );
}

#[test]
fn test_repository_commands() {
    let fx = Fixture::new();
    let store = fx.store();

    store.annex().init(Some("lab copy")).unwrap();
    store.annex().init(None).unwrap();
    store.annex().add(Path::new("data/new.bam")).unwrap();
    store.move_to(Path::new("data/sample.bam"), "backup").unwrap();

    assert_eq!(
        fx.calls(),
        vec![
            "repo init lab copy",
            "repo init",
            "repo add data/new.bam",
            "repo move data/sample.bam --to backup",
        ]
    );
}

#[test]
fn test_absolute_paths_are_passed_unchanged() {
    let fx = Fixture::new();
    let store = fx.store();
    let absolute = fx.link();

    store.annex().add(&absolute).unwrap();

    assert_eq!(fx.calls(), vec![format!("repo add {}", absolute.display())]);
}
