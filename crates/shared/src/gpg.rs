use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

/// Result of one decryption attempt, mirroring what `gpg` reports.
#[derive(Debug, Clone, Default)]
pub struct DecryptOutcome {
    pub ok: bool,
    pub status: String,
    pub plaintext: Vec<u8>,
}

impl DecryptOutcome {
    pub fn failed(status: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: status.into(),
            plaintext: Vec::new(),
        }
    }
}

/// Symmetric or key-based decryption of a journal payload.
pub trait Decrypter: Send + Sync {
    fn decrypt(&self, ciphertext: &[u8], passphrase: &str) -> DecryptOutcome;
}

/// Shells out to GnuPG in batch mode.
#[derive(Debug, Clone)]
pub struct GpgDecrypter {
    program: String,
    homedir: Option<PathBuf>,
}

impl GpgDecrypter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            homedir: None,
        }
    }

    /// Use a keyring other than the user's default.
    pub fn with_homedir(mut self, homedir: impl Into<PathBuf>) -> Self {
        self.homedir = Some(homedir.into());
        self
    }
}

impl Default for GpgDecrypter {
    fn default() -> Self {
        Self::new("gpg")
    }
}

impl Decrypter for GpgDecrypter {
    fn decrypt(&self, ciphertext: &[u8], passphrase: &str) -> DecryptOutcome {
        let mut command = Command::new(&self.program);
        if let Some(homedir) = &self.homedir {
            command.arg("--homedir").arg(homedir);
        }

        let child = command
            .args([
                "--batch",
                "--yes",
                "--quiet",
                "--pinentry-mode",
                "loopback",
                "--passphrase-fd",
                "0",
                "--decrypt",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                return DecryptOutcome::failed(format!(
                    "failed to launch {}: {}",
                    self.program, e
                ))
            }
        };

        // gpg reads the passphrase line first, then the message, from the same fd.
        // Feed stdin from its own thread so a large plaintext can't deadlock on a full pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let mut input = Vec::with_capacity(passphrase.len() + 1 + ciphertext.len());
            input.extend_from_slice(passphrase.as_bytes());
            input.push(b'\n');
            input.extend_from_slice(ciphertext);
            thread::spawn(move || stdin.write_all(&input))
        });

        let output = match child.wait_with_output() {
            Ok(output) => output,
            Err(e) => return DecryptOutcome::failed(format!("gpg did not finish: {}", e)),
        };

        if let Some(handle) = writer {
            match handle.join() {
                Ok(Err(e)) if output.status.success() => {
                    return DecryptOutcome::failed(format!("failed to write to gpg: {}", e));
                }
                _ => {}
            }
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() {
            DecryptOutcome {
                ok: true,
                status: if stderr.is_empty() {
                    "decryption ok".to_string()
                } else {
                    stderr
                },
                plaintext: output.stdout,
            }
        } else {
            let status = if stderr.is_empty() {
                format!("gpg exited with {}", output.status)
            } else {
                stderr
            };
            DecryptOutcome::failed(status)
        }
    }
}
