use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

const NEW_INDEX: &str = "\
Package: a
Filename: pool/a/a.deb
Size: 100
MD5sum: 00
SHA256: aa

Package: b
Filename: pool/b/b.deb
Size: 200
SHA256: bb
";

const OLD_INDEX: &str = "\
Package: a
Filename: /pool/a/a.deb
Size: 100
SHA256: aa

Package: gone
Size: 4
SHA256: dd
";

fn write_index(path: &Path, text: &str) {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    std::fs::write(path, encoder.finish().unwrap()).unwrap();
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(old_text: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("new")).unwrap();
        write_index(&dir.path().join("new").join("Packages.gz"), NEW_INDEX);
        write_index(&dir.path().join("OLD_Packages.gz"), old_text);
        std::fs::write(dir.path().join("config.toml"), "").unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("debdiff_core").unwrap();
        cmd.current_dir(self.dir.path())
            .arg("--config")
            .arg(self.path("config.toml"));
        cmd
    }
}

#[test]
fn reports_all_categories_with_totals() {
    let fixture = Fixture::new(OLD_INDEX);
    let output = fixture
        .command()
        .args(["--new", "new", "--old", "OLD_Packages.gz"])
        .args(["--repo", "dists/Debian11.2/main/binary-amd64"])
        .args(["--show-added", "--show-removed", "--show-common"])
        .arg("--summary")
        .arg(fixture.path("summary.json"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[1], "# new: new/Packages.gz old: OLD_Packages.gz");
    assert_eq!(lines[3], "{sha256}bb 200 dists/Debian11.2/pool/b/b.deb");
    assert_eq!(lines[4], "{sha256}aa 100 dists/Debian11.2/pool/a/a.deb");
    assert_eq!(lines[5], "# added: 1 packages, 200 B (200 bytes)");
    assert_eq!(lines[6], "# common: 1 packages, 100 B (100 bytes)");
    assert_eq!(lines[7], "# removed: 0 packages, 0 B (0 bytes)");
    assert_eq!(lines.len(), 8);

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(fixture.path("summary.json")).unwrap())
            .unwrap();
    assert_eq!(summary["metadata"]["new_records"], 2);
    assert_eq!(summary["metadata"]["old_records"], 1);
    assert_eq!(summary["totals"]["common"]["bytes"], 100);
}

#[test]
fn writes_report_to_output_file() {
    let fixture = Fixture::new(OLD_INDEX);
    fixture
        .command()
        .args(["--new", "new", "--old", "", "--show-added"])
        .arg("--output")
        .arg(fixture.path("report.txt"))
        .assert()
        .success()
        .stdout("");

    let report = std::fs::read_to_string(fixture.path("report.txt")).unwrap();
    assert!(report.contains("{sha256}aa 100 dists/Debian11.2/pool/a/a.deb\n"));
    assert!(report.contains("# added: 2 packages, 300 B (300 bytes)\n"));
}

#[test]
fn corrupt_size_names_failing_side() {
    let fixture = Fixture::new("Filename: pool/x.deb\nSize: lots\n");
    let output = fixture
        .command()
        .args(["--new", "new", "--old", "OLD_Packages.gz", "--show-added"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(42));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("old index OLD_Packages.gz"));
    assert!(stderr.contains("`Size`"));
}

#[test]
fn missing_index_is_fatal() {
    let fixture = Fixture::new(OLD_INDEX);
    let output = fixture
        .command()
        .args(["--new", "absent.gz", "--old", "OLD_Packages.gz"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(40));
    assert!(String::from_utf8(output.stderr).unwrap().contains("new index absent.gz"));
}

#[test]
fn strict_mode_drops_short_paths() {
    let fixture = Fixture::new("Filename: a.deb\nSize: 1\nSHA1: 01\n");
    let output = fixture
        .command()
        .args(["--new", "", "--old", "OLD_Packages.gz", "--show-removed", "--strict"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("# removed: 0 packages"));
}
