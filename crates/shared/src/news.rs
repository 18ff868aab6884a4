use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::NewsSettings;
use crate::error::{BriefError, BriefResult};
use crate::logging::BriefLog;

const DISCUSSION_BASE: &str = "https://news.ycombinator.com/item?id=";

#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    pub id: u64,
    pub title: String,
    pub url: Option<String>,
    pub score: u64,
    pub by: Option<String>,
    pub time: Option<i64>,
    /// Comment count
    pub descendants: u64,
    pub text: String,
}

impl Story {
    pub fn discussion_url(&self) -> String {
        format!("{}{}", DISCUSSION_BASE, self.id)
    }
}

/// Raw item as served by the feed. Every field but `id` may be absent.
#[derive(Debug, Deserialize)]
struct FeedItem {
    id: u64,
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    url: Option<String>,
    score: Option<u64>,
    by: Option<String>,
    time: Option<i64>,
    descendants: Option<u64>,
    text: Option<String>,
}

impl FeedItem {
    fn into_story(self) -> Option<Story> {
        if self.kind.as_deref() != Some("story") {
            return None;
        }
        Some(Story {
            id: self.id,
            title: self.title.unwrap_or_default(),
            url: self.url.filter(|u| !u.is_empty()),
            score: self.score.unwrap_or(0),
            by: self.by,
            time: self.time,
            descendants: self.descendants.unwrap_or(0),
            text: self.text.unwrap_or_default(),
        })
    }
}

/// How fetched stories are narrowed down before display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankingPolicy {
    pub min_score: Option<u64>,
    pub max_stories: Option<usize>,
}

impl RankingPolicy {
    /// Keep everything, ranked.
    pub fn all() -> Self {
        Self::default()
    }

    /// Only popular stories, at most 15 of them.
    pub fn curated() -> Self {
        Self {
            min_score: Some(50),
            max_stories: Some(15),
        }
    }
}

/// Filter by threshold, sort by score descending, cap. Equal scores keep
/// their feed order.
pub fn rank_stories(stories: Vec<Story>, policy: RankingPolicy) -> Vec<Story> {
    let mut ranked: Vec<Story> = match policy.min_score {
        Some(min) => stories.into_iter().filter(|s| s.score >= min).collect(),
        None => stories,
    };

    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    if let Some(max) = policy.max_stories {
        ranked.truncate(max);
    }

    ranked
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsSummary {
    pub stories: Vec<Story>,
}

impl NewsSummary {
    pub fn new(stories: Vec<Story>, policy: RankingPolicy) -> Self {
        Self {
            stories: rank_stories(stories, policy),
        }
    }

    pub fn average_score(&self) -> f64 {
        if self.stories.is_empty() {
            return 0.0;
        }
        let total: u64 = self.stories.iter().map(|s| s.score).sum();
        total as f64 / self.stories.len() as f64
    }

    pub fn render(&self) -> String {
        if self.stories.is_empty() {
            return "No Hacker News posts available.".to_string();
        }

        let blocks: Vec<String> = self
            .stories
            .iter()
            .enumerate()
            .map(|(i, story)| {
                let mut block = match &story.url {
                    Some(url) => format!(
                        "{}. [{}]({}) ({} points)\n- Link: {}",
                        i + 1,
                        story.title,
                        url,
                        story.score,
                        url
                    ),
                    None => format!("{}. {} ({} points)", i + 1, story.title, story.score),
                };
                block.push_str(&format!("\n- Discussion: {}", story.discussion_url()));
                block
            })
            .collect();

        format!(
            "({} posts, avg score: {:.0}):\n\n{}",
            self.stories.len(),
            self.average_score(),
            blocks.join("\n")
        )
    }
}

pub struct HackerNewsClient {
    client: Client,
    base_url: String,
    concurrency: usize,
    log: Arc<dyn BriefLog>,
}

impl HackerNewsClient {
    pub fn new(settings: &NewsSettings, log: Arc<dyn BriefLog>) -> BriefResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| BriefError::FetchFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.feed_url.trim_end_matches('/').to_string(),
            concurrency: settings.concurrency.max(1),
            log,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> BriefResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BriefError::FetchFailed(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BriefError::FetchFailed(format!("{} returned {}", url, status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BriefError::FetchFailed(format!("Failed to parse {}: {}", url, e)))
    }

    pub async fn fetch_top_story_ids(&self) -> BriefResult<Vec<u64>> {
        self.get_json(&format!("{}/topstories.json", self.base_url)).await
    }

    /// `None` for deleted items and anything that is not a story.
    pub async fn fetch_story(&self, id: u64) -> BriefResult<Option<Story>> {
        let item: Option<FeedItem> = self
            .get_json(&format!("{}/item/{}.json", self.base_url, id))
            .await?;
        Ok(item.and_then(FeedItem::into_story))
    }

    /// Fetch the first `limit` top stories, in feed order.
    pub async fn fetch_top_stories(&self, limit: usize) -> BriefResult<Vec<Story>> {
        let mut ids = self.fetch_top_story_ids().await?;
        ids.truncate(limit);

        let results: Vec<(u64, BriefResult<Option<Story>>)> = stream::iter(ids.iter().copied())
            .map(|id| async move { (id, self.fetch_story(id).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        // Completion order is arbitrary; pair back up by id
        let mut by_id: HashMap<u64, Story> = HashMap::new();
        for (id, result) in results {
            if let Some(story) = result? {
                by_id.insert(id, story);
            }
        }

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    pub async fn summary(&self, limit: usize, policy: RankingPolicy) -> BriefResult<NewsSummary> {
        let stories = self.fetch_top_stories(limit).await?;
        Ok(NewsSummary::new(stories, policy))
    }

    /// Formatted summary for the brief. Never fails: errors come back as text.
    pub async fn summary_text(&self, limit: usize, policy: RankingPolicy) -> String {
        self.log.info(&format!("Fetching top {} Hacker News posts", limit));

        match self.summary(limit, policy).await {
            Ok(summary) => {
                self.log.info(&format!(
                    "Successfully formatted {} interesting posts",
                    summary.stories.len()
                ));
                summary.render()
            }
            Err(e) => {
                self.log.error(&format!("Error fetching Hacker News posts: {}", e));
                format!("Error fetching Hacker News posts: {}", e)
            }
        }
    }
}
