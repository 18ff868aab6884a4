use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::JournalSettings;
use crate::error::{BriefError, BriefResult};
use crate::gpg::Decrypter;
use crate::logging::BriefLog;

/// Prefix of the text that stands in for an entry that could not be read.
pub const ENTRY_ERROR_MARKER: &str = "Error reading journal entry";

/// A journal file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalFile {
    /// File name, used as the entry heading.
    pub id: String,
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
    pub encrypted: bool,
}

pub struct JournalLocator {
    dir: PathBuf,
    encrypted_suffix: String,
    plaintext_suffix: String,
    log: Arc<dyn BriefLog>,
}

impl JournalLocator {
    pub fn new(settings: &JournalSettings, log: Arc<dyn BriefLog>) -> Self {
        Self {
            dir: settings.dir.clone(),
            encrypted_suffix: settings.encrypted_suffix.clone(),
            plaintext_suffix: settings.plaintext_suffix.clone(),
            log,
        }
    }

    /// Return up to `limit` journal files, newest first.
    ///
    /// Encrypted files win as a class: plaintext files are only considered
    /// when the directory holds no encrypted ones at all.
    pub fn locate(&self, limit: usize) -> BriefResult<Vec<JournalFile>> {
        let candidates = self.list_files()?;

        let mut files: Vec<JournalFile> = candidates
            .iter()
            .filter(|f| f.id.ends_with(&self.encrypted_suffix))
            .cloned()
            .map(|f| JournalFile {
                encrypted: true,
                ..f
            })
            .collect();

        if files.is_empty() {
            files = candidates
                .into_iter()
                .filter(|f| f.id.ends_with(&self.plaintext_suffix))
                .collect();
        }

        if files.is_empty() {
            return Err(BriefError::NotFound {
                dir: self.dir.clone(),
            });
        }

        // Sort by modification time (newest first), name as tie-breaker
        files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.id.cmp(&b.id)));
        files.truncate(limit);

        self.log.info(&format!(
            "Found {} journal file(s) in {}",
            files.len(),
            self.dir.display()
        ));

        Ok(files)
    }

    fn list_files(&self) -> BriefResult<Vec<JournalFile>> {
        let dir_error = |source| BriefError::JournalDir {
            dir: self.dir.clone(),
            source,
        };

        let dir = fs::canonicalize(&self.dir).map_err(dir_error)?;
        let entries = fs::read_dir(&dir).map_err(dir_error)?;

        let files = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                let metadata = fs::metadata(&path).ok()?;
                if !metadata.is_file() {
                    return None;
                }
                let id = path.file_name()?.to_str()?.to_string();
                let modified = metadata.modified().ok()?;
                Some(JournalFile {
                    id,
                    path,
                    modified: modified.into(),
                    encrypted: false,
                })
            })
            .collect();

        Ok(files)
    }
}

/// One entry of a batch read: the text, or why it could not be produced.
#[derive(Debug)]
pub struct JournalEntry {
    pub id: String,
    pub text: BriefResult<String>,
}

impl JournalEntry {
    /// The entry text, or an inline error placeholder.
    pub fn display_text(&self) -> Cow<'_, str> {
        match &self.text {
            Ok(text) => Cow::Borrowed(text),
            Err(e) => Cow::Owned(format!("{}: {}", ENTRY_ERROR_MARKER, e)),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.text.is_ok()
    }
}

/// Journal text for one run, in the order the files were located.
#[derive(Debug, Default)]
pub struct JournalContent {
    pub entries: Vec<JournalEntry>,
}

impl JournalContent {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_ok()).count()
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("=== {} ===\n{}", entry.id, entry.display_text()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct JournalReader {
    passphrase: Option<String>,
    encrypted_suffix: String,
    decrypter: Arc<dyn Decrypter>,
    log: Arc<dyn BriefLog>,
}

impl JournalReader {
    pub fn new(
        settings: &JournalSettings,
        decrypter: Arc<dyn Decrypter>,
        log: Arc<dyn BriefLog>,
    ) -> Self {
        Self {
            passphrase: settings.passphrase.clone(),
            encrypted_suffix: settings.encrypted_suffix.clone(),
            decrypter,
            log,
        }
    }

    /// Read a single path, deciding from its suffix whether it is encrypted.
    pub fn read_path(&self, path: &Path) -> BriefResult<String> {
        let encrypted = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.ends_with(&self.encrypted_suffix))
            .unwrap_or(false);
        self.decode(path, encrypted)
    }

    pub fn read(&self, file: &JournalFile) -> BriefResult<String> {
        self.decode(&file.path, file.encrypted)
    }

    /// Read every file. A failure is recorded against that file only.
    pub fn read_all(&self, files: &[JournalFile]) -> JournalContent {
        let entries = files
            .iter()
            .map(|file| {
                let text = self.read(file);
                match &text {
                    Ok(_) => self.log.info(&format!("Read journal entry {}", file.id)),
                    Err(e) => self
                        .log
                        .error(&format!("Could not read journal entry {}: {}", file.id, e)),
                }
                JournalEntry {
                    id: file.id.clone(),
                    text,
                }
            })
            .collect();

        let content = JournalContent { entries };
        self.log.info(&format!(
            "Read {} journal entries ({} unreadable)",
            content.len(),
            content.failures()
        ));
        content
    }

    fn decode(&self, path: &Path, encrypted: bool) -> BriefResult<String> {
        let raw = fs::read(path).map_err(|source| BriefError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let bytes = match (&self.passphrase, encrypted) {
            (Some(passphrase), true) => {
                let outcome = self.decrypter.decrypt(&raw, passphrase);
                if !outcome.ok {
                    return Err(BriefError::DecryptionFailed {
                        path: path.to_path_buf(),
                        status: outcome.status,
                    });
                }
                outcome.plaintext
            }
            _ => raw,
        };

        String::from_utf8(bytes).map_err(|_| BriefError::InvalidUtf8 {
            path: path.to_path_buf(),
        })
    }
}
