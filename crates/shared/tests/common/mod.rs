#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use shared::{BriefLog, DecryptOutcome, Decrypter};

/// Keeps every message so tests can assert on what was logged.
#[derive(Default)]
pub struct RecordingLog {
    pub infos: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl BriefLog for RecordingLog {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// "Ciphertext" is `LOCKED:<plaintext>`; anything else fails, as does a wrong passphrase.
pub struct FakeDecrypter {
    pub passphrase: String,
    pub calls: AtomicUsize,
}

impl FakeDecrypter {
    pub fn new(passphrase: &str) -> Arc<Self> {
        Arc::new(Self {
            passphrase: passphrase.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decrypter for FakeDecrypter {
    fn decrypt(&self, ciphertext: &[u8], passphrase: &str) -> DecryptOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if passphrase != self.passphrase {
            return DecryptOutcome::failed("bad passphrase");
        }
        match ciphertext.strip_prefix(b"LOCKED:") {
            Some(plaintext) => DecryptOutcome {
                ok: true,
                status: "decryption ok".to_string(),
                plaintext: plaintext.to_vec(),
            },
            None => DecryptOutcome::failed("no valid OpenPGP data found"),
        }
    }
}

/// Write `content` to `dir/name` and set its mtime to `secs` after the epoch.
pub fn write_journal(dir: &Path, name: &str, content: &[u8], secs: u64) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
    path
}
