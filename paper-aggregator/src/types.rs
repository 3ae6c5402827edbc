use chrono::{DateTime, Utc};
use std::time::Duration;

pub use interfaces::defs::{
    BilingualSummary, Paper, ProgressReporter, SummaryStatus, TokenUsage, PUBLISHED_FORMAT,
    SUMMARY_NOT_AVAILABLE_EN, SUMMARY_NOT_AVAILABLE_ZH,
};

/// HTTP client settings for one remote source.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub accept: Option<String>,
    pub timeout_seconds: u64,
    /// Pause honored around requests to respect the source's rate expectations.
    pub request_delay: Duration,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("paper-pulse/{}", env!("CARGO_PKG_VERSION")),
            accept: None,
            timeout_seconds: 30,
            request_delay: Duration::from_secs(3),
            max_redirects: 5,
        }
    }
}

#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub id: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub authors: Vec<String>,
    pub links: Vec<ParsedLink>,
    pub categories: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ParsedLink {
    pub href: String,
    pub title: Option<String>,
    pub rel: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("XML write error: {0}")]
    Xml(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Summarizer error: {0}")]
    Summarizer(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
