#[path = "../src/backup.rs"]
mod backup;

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn fake_sqlite(tag: &str) -> Vec<u8> {
    let mut bytes = b"SQLite format 3\0".to_vec();
    bytes.extend_from_slice(tag.as_bytes());
    bytes
}

#[test]
fn zip_export_and_import_roundtrip() {
    let workspace = temp_dir("rosterd-backup-src");
    let workspace2 = temp_dir("rosterd-backup-dst");
    let out_dir = temp_dir("rosterd-backup-out");

    let bytes = fake_sqlite("roundtrip");
    std::fs::write(workspace.join("roster.sqlite3"), &bytes).expect("write source db");
    std::fs::write(workspace2.join("roster.sqlite3"), b"old contents").expect("write old db");

    let bundle_path = out_dir.join("nested").join("workspace.zip");
    let export = backup::export_workspace_bundle(&workspace, &bundle_path).expect("export bundle");
    assert_eq!(export.bundle_format, backup::BUNDLE_FORMAT_V1);
    assert_eq!(export.entry_count, 2);
    assert_eq!(export.db_sha256.len(), 64);

    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    assert!(manifest.contains(backup::BUNDLE_FORMAT_V1));
    assert!(manifest.contains(&export.db_sha256));
    archive
        .by_name("db/roster.sqlite3")
        .expect("database entry in bundle");

    let import = backup::import_workspace_bundle(&bundle_path, &workspace2).expect("import bundle");
    assert_eq!(import.bundle_format_detected, backup::BUNDLE_FORMAT_V1);
    let restored = std::fs::read(workspace2.join("roster.sqlite3")).expect("read restored db");
    assert_eq!(restored, bytes);
    assert!(!workspace2.join("roster.sqlite3.importing").exists());

    let _ = std::fs::remove_dir_all(workspace);
    let _ = std::fs::remove_dir_all(workspace2);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn tampered_bundle_is_rejected() {
    let out_dir = temp_dir("rosterd-backup-tamper");
    let workspace = temp_dir("rosterd-backup-tamper-dst");
    std::fs::write(workspace.join("roster.sqlite3"), b"keep me").expect("write db");

    let bundle_path = out_dir.join("tampered.zip");
    {
        let f = File::create(&bundle_path).expect("create bundle");
        let mut zip = zip::ZipWriter::new(f);
        let opts = zip::write::FileOptions::default();
        zip.start_file("manifest.json", opts).expect("manifest");
        zip.write_all(
            format!(
                "{{\"format\":\"{}\",\"dbSha256\":\"{}\"}}",
                backup::BUNDLE_FORMAT_V1,
                "0".repeat(64)
            )
            .as_bytes(),
        )
        .expect("write manifest");
        zip.start_file("db/roster.sqlite3", opts).expect("db entry");
        zip.write_all(&fake_sqlite("tampered")).expect("write db entry");
        zip.finish().expect("finish");
    }

    let e = backup::import_workspace_bundle(&bundle_path, &workspace).unwrap_err();
    assert!(e.to_string().contains("checksum mismatch"), "{e}");
    let kept = std::fs::read(workspace.join("roster.sqlite3")).expect("read db");
    assert_eq!(kept, b"keep me");

    let _ = std::fs::remove_dir_all(out_dir);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn plain_sqlite_restore_is_supported_and_other_files_are_not() {
    let out_dir = temp_dir("rosterd-backup-plain");
    let workspace = temp_dir("rosterd-backup-plain-dst");

    let plain = out_dir.join("copy.sqlite3");
    let bytes = fake_sqlite("plain");
    std::fs::write(&plain, &bytes).expect("write plain sqlite file");
    let import = backup::import_workspace_bundle(&plain, &workspace).expect("import plain sqlite");
    assert_eq!(import.bundle_format_detected, backup::PLAIN_SQLITE_FORMAT);
    assert_eq!(
        std::fs::read(workspace.join("roster.sqlite3")).expect("read restored"),
        bytes
    );

    let junk = out_dir.join("notes.txt");
    std::fs::write(&junk, b"hello").expect("write junk");
    assert!(backup::import_workspace_bundle(&junk, &workspace).is_err());

    let _ = std::fs::remove_dir_all(out_dir);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn export_without_database_fails() {
    let workspace = temp_dir("rosterd-backup-empty");
    let out = workspace.join("b.zip");
    assert!(backup::export_workspace_bundle(&workspace, &out).is_err());
    let _ = std::fs::remove_dir_all(workspace);
}
