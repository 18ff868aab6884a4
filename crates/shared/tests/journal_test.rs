mod common;

use std::fs;
use std::path::Path;

use common::{write_journal, FakeDecrypter, RecordingLog};
use shared::config::JournalSettings;
use shared::journal::ENTRY_ERROR_MARKER;
use shared::{BriefError, JournalContent, JournalEntry, JournalLocator, JournalReader};

fn settings(dir: &Path, passphrase: Option<&str>) -> JournalSettings {
    JournalSettings {
        dir: dir.to_path_buf(),
        passphrase: passphrase.map(str::to_string),
        ..JournalSettings::default()
    }
}

fn entry<'a>(content: &'a JournalContent, id: &str) -> &'a JournalEntry {
    content
        .entries
        .iter()
        .find(|e| e.id == id)
        .unwrap_or_else(|| panic!("no entry {}", id))
}

fn ids(files: &[shared::JournalFile]) -> Vec<&str> {
    files.iter().map(|f| f.id.as_str()).collect()
}

#[test]
fn plaintext_only_directory_is_sorted_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    write_journal(dir.path(), "monday.txt", b"mon", 1_000);
    write_journal(dir.path(), "wednesday.txt", b"wed", 3_000);
    write_journal(dir.path(), "tuesday.txt", b"tue", 2_000);
    write_journal(dir.path(), "notes.md", b"ignored", 4_000);

    let locator = JournalLocator::new(&settings(dir.path(), None), RecordingLog::new());
    let files = locator.locate(10).unwrap();

    assert_eq!(ids(&files), vec!["wednesday.txt", "tuesday.txt", "monday.txt"]);
    assert!(files.iter().all(|f| !f.encrypted));
    assert!(files.iter().all(|f| f.path.is_absolute()));
}

#[test]
fn encrypted_files_take_priority_as_a_class() {
    let dir = tempfile::tempdir().unwrap();
    write_journal(dir.path(), "old.txt.gpg", b"LOCKED:old", 1_000);
    // newer, but plaintext loses to any encrypted file
    write_journal(dir.path(), "fresh.txt", b"fresh", 9_000);

    let locator = JournalLocator::new(&settings(dir.path(), None), RecordingLog::new());
    let files = locator.locate(5).unwrap();

    assert_eq!(ids(&files), vec!["old.txt.gpg"]);
    assert!(files[0].encrypted);
}

#[test]
fn result_is_truncated_to_limit() {
    let dir = tempfile::tempdir().unwrap();
    for day in 1..=5u64 {
        write_journal(dir.path(), &format!("day{}.txt", day), b"x", day * 100);
    }

    let locator = JournalLocator::new(&settings(dir.path(), None), RecordingLog::new());
    let files = locator.locate(2).unwrap();

    assert_eq!(ids(&files), vec!["day5.txt", "day4.txt"]);
}

#[test]
fn directories_are_not_journal_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("archive.txt")).unwrap();

    let locator = JournalLocator::new(&settings(dir.path(), None), RecordingLog::new());
    let err = locator.locate(2).unwrap_err();

    assert!(matches!(err, BriefError::NotFound { .. }));
    assert!(err.is_fatal());
}

#[test]
fn empty_directory_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let locator = JournalLocator::new(&settings(dir.path(), None), RecordingLog::new());

    let err = locator.locate(2).unwrap_err();
    assert!(matches!(err, BriefError::NotFound { .. }));
}

#[test]
fn missing_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let locator = JournalLocator::new(&settings(&missing, None), RecordingLog::new());

    let err = locator.locate(2).unwrap_err();
    assert!(matches!(err, BriefError::JournalDir { .. }));
    assert!(err.is_fatal());
}

#[test]
fn without_passphrase_encrypted_suffix_is_read_as_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_journal(dir.path(), "armored.txt.gpg", b"-----BEGIN PGP MESSAGE-----", 1);
    let decrypter = FakeDecrypter::new("secret");

    let reader = JournalReader::new(
        &settings(dir.path(), None),
        decrypter.clone(),
        RecordingLog::new(),
    );

    assert_eq!(reader.read_path(&path).unwrap(), "-----BEGIN PGP MESSAGE-----");
    assert_eq!(decrypter.calls(), 0);
}

#[test]
fn passphrase_decrypts_encrypted_files_only() {
    let dir = tempfile::tempdir().unwrap();
    let locked = write_journal(dir.path(), "a.txt.gpg", b"LOCKED:dear diary", 1);
    let plain = write_journal(dir.path(), "b.txt", b"LOCKED:stays as is", 2);
    let decrypter = FakeDecrypter::new("secret");

    let reader = JournalReader::new(
        &settings(dir.path(), Some("secret")),
        decrypter.clone(),
        RecordingLog::new(),
    );

    assert_eq!(reader.read_path(&locked).unwrap(), "dear diary");
    assert_eq!(reader.read_path(&plain).unwrap(), "LOCKED:stays as is");
    assert_eq!(decrypter.calls(), 1);
}

#[test]
fn wrong_passphrase_is_decryption_failed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_journal(dir.path(), "a.txt.gpg", b"LOCKED:dear diary", 1);

    let reader = JournalReader::new(
        &settings(dir.path(), Some("guess")),
        FakeDecrypter::new("secret"),
        RecordingLog::new(),
    );

    match reader.read_path(&path).unwrap_err() {
        BriefError::DecryptionFailed { status, .. } => assert_eq!(status, "bad passphrase"),
        other => panic!("expected DecryptionFailed, got {:?}", other),
    }
}

#[test]
fn invalid_utf8_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_journal(dir.path(), "binary.txt", &[0xff, 0xfe, 0x00], 1);

    let reader = JournalReader::new(
        &settings(dir.path(), None),
        FakeDecrypter::new("secret"),
        RecordingLog::new(),
    );

    assert!(matches!(
        reader.read_path(&path),
        Err(BriefError::InvalidUtf8 { .. })
    ));
}

#[test]
fn batch_keeps_going_after_one_failure() {
    let dir = tempfile::tempdir().unwrap();
    write_journal(dir.path(), "one.txt.gpg", b"LOCKED:first entry", 3);
    write_journal(dir.path(), "two.txt.gpg", b"corrupted bytes", 2);
    write_journal(dir.path(), "three.txt.gpg", b"LOCKED:third entry", 1);

    let journal = settings(dir.path(), Some("secret"));
    let log = RecordingLog::new();
    let files = JournalLocator::new(&journal, log.clone()).locate(10).unwrap();
    let reader = JournalReader::new(&journal, FakeDecrypter::new("secret"), log.clone());

    let content = reader.read_all(&files);

    assert_eq!(content.len(), 3);
    assert_eq!(content.failures(), 1);

    let with_marker: Vec<&str> = content
        .entries
        .iter()
        .filter(|e| e.display_text().contains(ENTRY_ERROR_MARKER))
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(with_marker, vec!["two.txt.gpg"]);

    assert_eq!(entry(&content, "one.txt.gpg").display_text(), "first entry");
    assert_eq!(entry(&content, "three.txt.gpg").display_text(), "third entry");
    assert_eq!(log.errors().len(), 1);
    assert!(log.errors()[0].contains("two.txt.gpg"));
    assert!(log
        .infos()
        .contains(&"Read 3 journal entries (1 unreadable)".to_string()));
}

#[test]
fn batch_records_files_that_vanished() {
    let dir = tempfile::tempdir().unwrap();
    write_journal(dir.path(), "kept.txt", b"still here", 2);
    let gone = write_journal(dir.path(), "gone.txt", b"soon deleted", 1);

    let journal = settings(dir.path(), None);
    let files = JournalLocator::new(&journal, RecordingLog::new())
        .locate(10)
        .unwrap();
    fs::remove_file(gone).unwrap();

    let reader = JournalReader::new(&journal, FakeDecrypter::new("secret"), RecordingLog::new());
    let content = reader.read_all(&files);

    assert_eq!(content.len(), 2);
    assert!(entry(&content, "kept.txt").is_ok());
    assert!(matches!(
        entry(&content, "gone.txt").text,
        Err(BriefError::Read { .. })
    ));
}
