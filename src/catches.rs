//! Catch outcomes read from a published CSV feed.

use async_trait::async_trait;

use crate::random::{self, SelectError};

pub const REWARD_MARKER: &str = "touchdown";
pub const DEFAULT_COLUMN: &str = "catch";

#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("failed to fetch feed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("feed returned status {0}")]
    Status(u16),
    #[error("malformed feed: {0}")]
    Parse(#[from] csv::Error),
}

/// Touchdown outcomes are the reward pool of the weighted roll.
pub fn is_reward(entry: &str) -> bool {
    entry.to_lowercase().contains(REWARD_MARKER)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CatchMode {
    #[default]
    Normal,
    /// Big-game mode: touchdowns come up at the configured reward rate.
    Sb,
}

impl CatchMode {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(|m| m.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("normal") => Some(CatchMode::Normal),
            Some("sb") => Some(CatchMode::Sb),
            Some(_) => None,
        }
    }
}

pub fn pick_catch(
    entries: &[String],
    mode: CatchMode,
    reward_rate: f64,
) -> Result<&String, SelectError> {
    match mode {
        CatchMode::Normal => random::uniform(entries),
        CatchMode::Sb => random::weighted_reward_pick(entries, |e| is_reward(e), reward_rate),
    }
}

/// Trimmed, non-empty values of `column` in row order. Header matching
/// ignores case and surrounding whitespace; an absent column yields nothing.
pub fn parse_column(text: &str, column: &str) -> Result<Vec<String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(text.as_bytes());
    let wanted = column.trim();
    let Some(idx) = reader
        .headers()?
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(wanted))
    else {
        return Ok(Vec::new());
    };

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(v) = record.get(idx).map(str::trim).filter(|v| !v.is_empty()) {
            values.push(v.to_string());
        }
    }
    Ok(values)
}

/// Fetch `source` and return the values of `column`.
pub async fn fetch_column(
    http: &reqwest::Client,
    source: &str,
    column: &str,
) -> Result<Vec<String>, FeedError> {
    let resp = http.get(source).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FeedError::Status(status.as_u16()));
    }
    let text = resp.text().await?;
    Ok(parse_column(&text, column)?)
}

#[async_trait]
pub trait CatchFeed: Send + Sync {
    async fn catches(&self) -> Result<Vec<String>, FeedError>;
}

pub struct CsvFeed {
    http: reqwest::Client,
    url: String,
    column: String,
}

impl CsvFeed {
    pub fn new(http: reqwest::Client, url: impl Into<String>, column: impl Into<String>) -> Self {
        Self { http, url: url.into(), column: column.into() }
    }
}

#[async_trait]
impl CatchFeed for CsvFeed {
    async fn catches(&self) -> Result<Vec<String>, FeedError> {
        let values = fetch_column(&self.http, &self.url, &self.column).await?;
        tracing::debug!(count = values.len(), column = %self.column, "fetched catch feed");
        Ok(values)
    }
}

/// Fixed list of outcomes, for tests and offline runs.
pub struct StaticFeed(pub Vec<String>);

#[async_trait]
impl CatchFeed for StaticFeed {
    async fn catches(&self) -> Result<Vec<String>, FeedError> {
        Ok(self.0.clone())
    }
}
