//! Logging for the brief pipeline.
//!
//! Components never call `tracing` directly. They hold an `Arc<dyn BriefLog>`
//! so the sink can be swapped (tests record messages instead of printing).

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// The two log levels the pipeline reports at.
pub trait BriefLog: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to the global `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl TracingLog {
    pub fn shared() -> Arc<dyn BriefLog> {
        Arc::new(Self)
    }
}

impl BriefLog for TracingLog {
    fn info(&self, message: &str) {
        tracing::info!(target: "daily_brief", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "daily_brief", "{}", message);
    }
}

/// Console logging to stderr, filtered by `RUST_LOG` (default `info`).
///
/// Stdout is left alone so the brief itself can be piped.
pub fn init_cli() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
