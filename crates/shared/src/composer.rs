use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{GeneratorSettings, MISSING_API_KEY};
use crate::error::{BriefError, BriefResult};
use crate::journal::JournalContent;
use crate::logging::BriefLog;

pub const BRIEFER_PERSONA: &str = r#"You are a supportive friend who writes personalized daily briefings. You read someone's recent journal entries, look over the tech and startup news they were sent, and help them focus on what matters for their goals.

Tone:
- Warm and encouraging, like a message from a good friend
- Substantive and focused
- Practical and actionable
- Honest but motivating
- No generic advice: everything comes from their actual content
- No meta wording such as "Based on your journal entries I notice..."

Use this structure:

🌅 **Good morning!**
[A personal greeting reflecting the themes, mood or concerns of their recent journaling]

📖 **What I noticed from your recent thoughts:**
[Specific observations from the journal: patterns, worries, wins, progress, decisions in flight]

🎯 **Today's focus areas aligned with your goals:**
[Concrete things to work on today, each explicitly tied to one of their stated goals]

🔥 **Tech/startup news that caught my eye for you:**
[Stories from the HACKER NEWS SUMMARY section that fit their goals or interests, formatted as:
1. Title (420 points)
   - Link: https://example.com/
   - Discussion: https://news.ycombinator.com/item?id=123]

💪 **Daily motivation:**
[A closing note tying their goals, recent reflections and today's opportunities together]

Rules:
- Reference their real projects, concerns, wins and decisions. Never invent them.
- Only include URLs that appear in the provided data.
- Never advertise or add unrelated links."#;

pub const APOLOGY_PREFIX: &str = "Sorry, I couldn't generate your daily brief today. Error:";

/// The language model that turns the prepared material into prose.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, persona: &str, message: &str, max_tokens: u32) -> BriefResult<String>;
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

pub struct ClaudeGenerator {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl ClaudeGenerator {
    pub fn new(settings: &GeneratorSettings, api_key: String) -> BriefResult<Self> {
        // Long briefs take a while to stream out
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| {
                BriefError::GeneratorFailed(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_url: settings.api_url.clone(),
            api_key,
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl NarrativeGenerator for ClaudeGenerator {
    async fn generate(&self, persona: &str, message: &str, max_tokens: u32) -> BriefResult<String> {
        let request = ClaudeRequest {
            model: &self.model,
            max_tokens,
            system: persona,
            messages: vec![Message {
                role: "user",
                content: message,
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                BriefError::GeneratorFailed(format!("Failed to send request to Claude API: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(BriefError::GeneratorFailed(format!(
                "Claude API error ({}): {}",
                status, error_text
            )));
        }

        let claude_response = response.json::<ClaudeResponse>().await.map_err(|e| {
            BriefError::GeneratorFailed(format!("Failed to parse Claude API response: {}", e))
        })?;

        let text: String = claude_response
            .content
            .iter()
            .filter(|c| c.kind == "text")
            .map(|c| c.text.as_str())
            .collect();

        if text.trim().is_empty() {
            return Err(BriefError::GeneratorFailed(
                "Claude API returned no text".to_string(),
            ));
        }

        Ok(text)
    }
}

/// Build the single message handed to the generator.
pub fn compose_message(journal: &JournalContent, goals: &[String], news_summary: &str) -> String {
    let goals_text = goals
        .iter()
        .map(|goal| format!("- {}", goal))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Here's the data for today's brief:\n\n\
         RECENT JOURNAL ENTRIES:\n{}\n\n\
         PERSONAL GOALS:\n{}\n\n\
         HACKER NEWS SUMMARY:\n{}\n\n\
         Please generate a personalized daily brief based on this information.",
        journal.render(),
        goals_text,
        news_summary
    )
}

pub struct BriefComposer {
    /// Holds the setup error when no generator could be built.
    generator: BriefResult<Arc<dyn NarrativeGenerator>>,
    max_tokens: u32,
    log: Arc<dyn BriefLog>,
}

impl BriefComposer {
    pub fn new(
        generator: Arc<dyn NarrativeGenerator>,
        max_tokens: u32,
        log: Arc<dyn BriefLog>,
    ) -> Self {
        Self {
            generator: Ok(generator),
            max_tokens,
            log,
        }
    }

    /// Composer backed by Claude. A missing key or client setup failure is
    /// kept and reported through the apology when the brief is requested.
    pub fn with_claude(
        settings: &GeneratorSettings,
        api_key: Option<&str>,
        log: Arc<dyn BriefLog>,
    ) -> Self {
        let generator = match api_key {
            Some(key) => ClaudeGenerator::new(settings, key.to_string())
                .map(|g| Arc::new(g) as Arc<dyn NarrativeGenerator>),
            None => Err(BriefError::GeneratorFailed(MISSING_API_KEY.to_string())),
        };

        Self {
            generator,
            max_tokens: settings.max_tokens,
            log,
        }
    }

    /// One attempt at the brief. A generator failure becomes an apology, not an error.
    pub async fn generate_brief(
        &self,
        journal: &JournalContent,
        goals: &[String],
        news_summary: &str,
    ) -> String {
        let message = compose_message(journal, goals, news_summary);

        let result = match &self.generator {
            Ok(generator) => {
                generator
                    .generate(BRIEFER_PERSONA, &message, self.max_tokens)
                    .await
            }
            Err(e) => Err(BriefError::GeneratorFailed(e.to_string())),
        };

        match result {
            Ok(brief) => {
                self.log.info("Daily brief generated successfully");
                brief
            }
            Err(e) => {
                self.log.error(&format!("Error generating daily brief: {}", e));
                format!("{} {}", APOLOGY_PREFIX, e)
            }
        }
    }
}
