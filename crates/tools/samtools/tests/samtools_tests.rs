#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use toolshed_core::Error;
use toolshed_core::tools::{InstallMethod, PreexistingBinary, ToolHandle, ToolSpec};
use toolshed_tools_samtools::SamtoolsTool;

fn fake_samtools(dir: &Path, count_output: &str) -> (SamtoolsTool, PathBuf) {
    let log = dir.join("samtools.log");
    let script = dir.join("samtools");
    let body = format!(
        "#!/bin/sh\necho \"$*\" >> '{}'\nif [ \"$1\" = view ] && [ \"$2\" = -c ]; then echo '{count_output}'; fi\n",
        log.display()
    );
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let handle = ToolHandle::new(
        ToolSpec::unversioned("samtools"),
        vec![InstallMethod::preexisting(PreexistingBinary::new(script))],
    );
    (SamtoolsTool::from_handle(handle, dir), log)
}

fn calls(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn test_argument_vectors() {
    let dir = tempfile::tempdir().unwrap();
    let (samtools, log) = fake_samtools(dir.path(), "0");

    samtools
        .view(["-b", "-q", "5"], Path::new("in.sam"), Path::new("out.bam"), &[])
        .unwrap();
    samtools
        .view(Vec::<String>::new(), Path::new("in.bam"), Path::new("out.sam"), &["chr1:1-100"])
        .unwrap();
    samtools.sort(Path::new("in.bam"), Path::new("sorted.bam")).unwrap();
    samtools.index(Path::new("sorted.bam"), None).unwrap();
    samtools
        .index(Path::new("sorted.bam"), Some(Path::new("sorted.bai")))
        .unwrap();

    assert_eq!(
        calls(&log),
        vec![
            "view -b -q 5 -o out.bam in.sam",
            "view -o out.sam in.bam chr1:1-100",
            "sort -o sorted.bam in.bam",
            "index sorted.bam",
            "index sorted.bam sorted.bai",
        ]
    );
}

#[test]
fn test_count_parses_output() {
    let dir = tempfile::tempdir().unwrap();
    let (samtools, log) = fake_samtools(dir.path(), "1234");

    assert_eq!(samtools.count(Path::new("reads.bam")).unwrap(), 1234);
    assert_eq!(calls(&log), vec!["view -c reads.bam"]);
}

#[test]
fn test_count_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let (samtools, _log) = fake_samtools(dir.path(), "not a number");

    let err = samtools.count(Path::new("reads.bam")).unwrap_err();
    assert!(matches!(err, Error::UnexpectedOutput { .. }));
    assert!(err.to_string().contains("not a number"));
}
