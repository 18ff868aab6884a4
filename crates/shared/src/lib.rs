// Public modules
pub mod composer;
pub mod config;
pub mod error;
pub mod gpg;
pub mod journal;
pub mod logging;
pub mod news;

// Re-export commonly used types
pub use composer::{compose_message, BriefComposer, ClaudeGenerator, NarrativeGenerator};
pub use config::Config;
pub use error::{BriefError, BriefResult};
pub use gpg::{DecryptOutcome, Decrypter, GpgDecrypter};
pub use journal::{JournalContent, JournalEntry, JournalFile, JournalLocator, JournalReader};
pub use logging::{BriefLog, TracingLog};
pub use news::{HackerNewsClient, NewsSummary, RankingPolicy, Story};
