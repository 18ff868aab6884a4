use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "daily-brief";

pub const DEFAULT_FEED_URL: &str = "https://hacker-news.firebaseio.com/v0";
pub const DEFAULT_GENERATOR_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

pub const MISSING_API_KEY: &str = "ANTHROPIC_API_KEY not found. \
    Add ANTHROPIC_API_KEY=your_key_here to ~/.config/daily-brief/.env \
    (get one from https://console.anthropic.com/settings/keys)";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JournalSettings {
    pub dir: PathBuf,
    pub limit: usize,
    pub encrypted_suffix: String,
    pub plaintext_suffix: String,
    pub gpg_program: String,
    /// Passed to gpg as `--homedir`; gpg's own default when unset.
    pub gpg_homedir: Option<PathBuf>,
    /// Only ever read from the environment.
    #[serde(skip)]
    pub passphrase: Option<String>,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("~/Journal"),
            limit: 2,
            encrypted_suffix: ".gpg".to_string(),
            plaintext_suffix: ".txt".to_string(),
            gpg_program: "gpg".to_string(),
            gpg_homedir: None,
            passphrase: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    pub feed_url: String,
    pub fetch_limit: usize,
    pub min_score: Option<u64>,
    pub max_stories: Option<usize>,
    pub concurrency: usize,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            fetch_limit: 20,
            min_score: None,
            max_stories: None,
            concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GENERATOR_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 32_000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub journal: JournalSettings,
    pub goals: Vec<String>,
    pub news: NewsSettings,
    pub generator: GeneratorSettings,
    #[serde(skip)]
    pub anthropic_api_key: Option<String>,
}

impl Config {
    /// Load settings from `path`, or from `~/.config/daily-brief/config.toml`
    /// when no path is given, then pick up secrets from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::try_load_dotenv();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(default_path) if default_path.exists() => Self::from_file(&default_path)?,
                _ => Self::default(),
            },
        };

        config.apply_env();
        config.journal.dir = expand_home(&config.journal.dir);
        config.journal.gpg_homedir = config.journal.gpg_homedir.as_deref().map(expand_home);

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration TOML")
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    fn apply_env(&mut self) {
        self.anthropic_api_key = non_empty_var("ANTHROPIC_API_KEY");
        self.journal.passphrase = non_empty_var("JOURNAL_PASSPHRASE");
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/daily-brief/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join(APP_DIR).join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
