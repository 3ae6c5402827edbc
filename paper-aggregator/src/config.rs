//! Run configuration.
//!
//! Loaded from, in increasing priority:
//! - serde defaults (an empty configuration is valid)
//! - a TOML/YAML/JSON file (`config.toml` in the working directory, or `--config`)
//! - environment variables prefixed with `PAPER_PULSE__`,
//!   e.g. `PAPER_PULSE__GENERAL__DAYS_BACK=3`
//!
//! Secrets never live in the file: the summarizer key comes from
//! `DASHSCOPE_API_KEY` and the SMTP password from `SMTP_PASSWORD`.

use crate::types::{AggregatorError, FetchConfig, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_ENV: &str = "DASHSCOPE_API_KEY";
pub const SMTP_PASSWORD_ENV: &str = "SMTP_PASSWORD";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub arxiv: ArxivConfig,
    #[serde(default)]
    pub iacr: IacrConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub rss: RssConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

/// How per-paper progress is shown while summarizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    Bar,
    Log,
    None,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Lookback window for fetching, in days
    #[serde(default = "default_days_back")]
    pub days_back: i64,

    /// Papers published before `today - retention_days` are pruned
    #[serde(default = "default_days_back")]
    pub retention_days: i64,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_papers_file")]
    pub papers_file: String,

    #[serde(default = "default_failed_file")]
    pub failed_file: String,

    #[serde(default = "default_keywords_file")]
    pub keywords_file: PathBuf,

    #[serde(default = "default_progress")]
    pub progress: ProgressMode,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArxivConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_arxiv_api_url")]
    pub api_url: String,

    #[serde(default = "default_arxiv_categories")]
    pub categories: Vec<String>,

    /// Results requested per page
    #[serde(default = "default_arxiv_batch_size")]
    pub batch_size: usize,

    /// Upper bound on results walked per category
    #[serde(default = "default_arxiv_max_results")]
    pub max_results: usize,

    /// arXiv asks for three seconds between calls
    #[serde(default = "default_arxiv_delay")]
    pub delay_secs: f64,

    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IacrConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_iacr_rss_url")]
    pub rss_url: String,

    /// ePrint answers non-browser agents with its robots.txt instead of the feed
    #[serde(default = "default_browser_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_iacr_delay")]
    pub delay_secs: f64,

    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_summarizer_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_summarizer_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_summarizer_timeout")]
    pub timeout_secs: u64,

    /// Attempts per paper before it is recorded as failed
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: f64,

    /// Pause between consecutive papers
    #[serde(default = "default_rate_limit_delay")]
    pub rate_limit_delay_secs: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RssConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_feed_file")]
    pub output_file: String,

    /// Public site URL; enables the self-referencing atom link when set
    #[serde(default)]
    pub site_url: String,

    #[serde(default = "default_feed_title")]
    pub title: String,

    #[serde(default = "default_feed_description")]
    pub description: String,

    #[serde(default = "default_feed_max_items")]
    pub max_items: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_report_file")]
    pub report_file: String,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_user: Option<String>,

    #[serde(default, skip_serializing)]
    pub smtp_password: Option<String>,

    #[serde(default)]
    pub from: Option<String>,

    #[serde(default)]
    pub to: Vec<String>,

    #[serde(default = "default_subject")]
    pub subject: String,
}

// Default value functions
fn default_days_back() -> i64 { 7 }
fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_papers_file() -> String { "papers.json".to_string() }
fn default_failed_file() -> String { "failed.json".to_string() }
fn default_keywords_file() -> PathBuf { PathBuf::from("keywords.txt") }
fn default_progress() -> ProgressMode { ProgressMode::Bar }
fn default_enabled() -> bool { true }
fn default_arxiv_api_url() -> String { "http://export.arxiv.org/api/query".to_string() }
fn default_arxiv_categories() -> Vec<String> {
    ["cs.CR", "cs.AI", "cs.LG", "cs.CL"].iter().map(|c| c.to_string()).collect()
}
fn default_arxiv_batch_size() -> usize { 100 }
fn default_arxiv_max_results() -> usize { 500 }
fn default_arxiv_delay() -> f64 { 3.0 }
fn default_fetch_timeout() -> u64 { 30 }
fn default_iacr_rss_url() -> String { "https://eprint.iacr.org/rss/rss.xml".to_string() }
fn default_browser_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0".to_string()
}
fn default_iacr_delay() -> f64 { 2.0 }
fn default_summarizer_api_url() -> String {
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation".to_string()
}
fn default_summarizer_model() -> String { "qwen-plus".to_string() }
fn default_max_tokens() -> u32 { 500 }
fn default_temperature() -> f64 { 0.7 }
fn default_summarizer_timeout() -> u64 { 60 }
fn default_max_retries() -> u32 { 3 }
fn default_retry_delay() -> f64 { 5.0 }
fn default_rate_limit_delay() -> f64 { 1.0 }
fn default_feed_file() -> String { "feed.xml".to_string() }
fn default_feed_title() -> String { "Paper Pulse".to_string() }
fn default_feed_description() -> String {
    "Keyword-based research paper aggregation from arXiv and IACR".to_string()
}
fn default_feed_max_items() -> usize { 50 }
fn default_report_file() -> String { "email_report.md".to_string() }
fn default_smtp_host() -> String { "smtp.gmail.com".to_string() }
fn default_smtp_port() -> u16 { 465 }
fn default_subject() -> String { "Paper Pulse digest".to_string() }

fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            days_back: default_days_back(),
            retention_days: default_days_back(),
            data_dir: default_data_dir(),
            papers_file: default_papers_file(),
            failed_file: default_failed_file(),
            keywords_file: default_keywords_file(),
            progress: default_progress(),
        }
    }
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            api_url: default_arxiv_api_url(),
            categories: default_arxiv_categories(),
            batch_size: default_arxiv_batch_size(),
            max_results: default_arxiv_max_results(),
            delay_secs: default_arxiv_delay(),
            timeout_secs: default_fetch_timeout(),
        }
    }
}

impl Default for IacrConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            rss_url: default_iacr_rss_url(),
            user_agent: default_browser_user_agent(),
            delay_secs: default_iacr_delay(),
            timeout_secs: default_fetch_timeout(),
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_url: default_summarizer_api_url(),
            api_key: None,
            model: default_summarizer_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_summarizer_timeout(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
            rate_limit_delay_secs: default_rate_limit_delay(),
        }
    }
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            output_file: default_feed_file(),
            site_url: String::new(),
            title: default_feed_title(),
            description: default_feed_description(),
            max_items: default_feed_max_items(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            report_file: default_report_file(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_user: None,
            smtp_password: None,
            from: None,
            to: Vec::new(),
            subject: default_subject(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("config").required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("PAPER_PULSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app: AppConfig = config.try_deserialize()?;
        app.resolve_secrets();
        Ok(app)
    }

    /// Fill secrets that were not set explicitly from their environment variables
    pub fn resolve_secrets(&mut self) {
        if self.summarizer.api_key.is_none() {
            self.summarizer.api_key = non_empty_env(API_KEY_ENV);
        }
        if self.email.smtp_password.is_none() {
            self.email.smtp_password = non_empty_env(SMTP_PASSWORD_ENV);
        }
    }

    /// The summarizer key. A run must not start without it.
    pub fn api_key(&self) -> Result<&str> {
        self.summarizer
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AggregatorError::MissingSetting(API_KEY_ENV.to_string()))
    }

    pub fn papers_path(&self) -> PathBuf {
        self.general.data_dir.join(&self.general.papers_file)
    }

    pub fn failed_path(&self) -> PathBuf {
        self.general.data_dir.join(&self.general.failed_file)
    }

    pub fn feed_path(&self) -> PathBuf {
        self.general.data_dir.join(&self.rss.output_file)
    }

    pub fn report_path(&self) -> PathBuf {
        self.general.data_dir.join(&self.email.report_file)
    }
}

impl ArxivConfig {
    pub fn delay(&self) -> Duration {
        seconds(self.delay_secs)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout_seconds: self.timeout_secs,
            request_delay: self.delay(),
            ..FetchConfig::default()
        }
    }
}

impl IacrConfig {
    pub fn delay(&self) -> Duration {
        seconds(self.delay_secs)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            user_agent: self.user_agent.clone(),
            accept: Some("application/rss+xml, application/xml, text/xml, */*".to_string()),
            timeout_seconds: self.timeout_secs,
            request_delay: self.delay(),
            ..FetchConfig::default()
        }
    }
}

impl SummarizerConfig {
    pub fn retry_delay(&self) -> Duration {
        seconds(self.retry_delay_secs)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        seconds(self.rate_limit_delay_secs)
    }
}

impl EmailConfig {
    /// SMTP delivery needs a host, credentials, a sender and at least one recipient
    pub fn smtp_ready(&self) -> bool {
        !self.smtp_host.is_empty()
            && self.smtp_user.as_deref().is_some_and(|u| !u.is_empty())
            && self.smtp_password.as_deref().is_some_and(|p| !p.is_empty())
            && self.sender().is_some()
            && !self.to.is_empty()
    }

    /// Explicit sender, falling back to the SMTP login
    pub fn sender(&self) -> Option<&str> {
        self.from
            .as_deref()
            .or(self.smtp_user.as_deref())
            .filter(|s| !s.is_empty())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
