use crate::config::IacrConfig;
use crate::fetcher::Fetcher;
use crate::parser::FeedParser;
use crate::traits::PaperSource;
use crate::types::{ParsedEntry, Paper, Result};
use crate::utils::{text, time};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

pub const IACR_SOURCE: &str = "IACR";

/// IACR ePrint archive, read through its single RSS document
pub struct IacrSource {
    fetcher: Fetcher,
    config: IacrConfig,
    days_back: i64,
}

impl IacrSource {
    pub fn new(config: IacrConfig, days_back: i64) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetch_config())?;
        Ok(Self {
            fetcher,
            config,
            days_back,
        })
    }

    async fn fetch_feed(&self, cutoff: DateTime<Utc>) -> Result<Vec<Paper>> {
        let content = self.fetcher.fetch_text(&self.config.rss_url, &[]).await?;
        if !FeedParser::is_valid_feed_content(&content) {
            warn!("IACR response does not look like a feed; check the user agent");
        }

        let feed = FeedParser::parse_feed(&content)?;
        let total = feed.entries.len();
        let papers: Vec<Paper> = feed
            .entries
            .into_iter()
            .filter_map(|entry| convert_entry(entry, cutoff))
            .collect();

        debug!("IACR feed: kept {} of {} entries", papers.len(), total);
        Ok(papers)
    }
}

#[async_trait]
impl PaperSource for IacrSource {
    fn source_name(&self) -> String {
        IACR_SOURCE.to_string()
    }

    async fn fetch(&self) -> Result<Vec<Paper>> {
        info!("Fetching from IACR ePrint archive");
        let cutoff = time::cutoff(Utc::now(), self.days_back);

        let papers = match self.fetch_feed(cutoff).await {
            Ok(papers) => {
                info!("Fetched {} papers from IACR", papers.len());
                papers
            }
            Err(e) => {
                error!("Error fetching from IACR: {}", e);
                Vec::new()
            }
        };

        self.fetcher.pause().await;
        Ok(papers)
    }
}

/// Normalize an RSS item. `None` for items without a date or link, and for items older than `cutoff`.
pub fn convert_entry(entry: ParsedEntry, cutoff: DateTime<Utc>) -> Option<Paper> {
    let Some(published_at) = entry.published_at.or(entry.updated_at) else {
        debug!("Skipping IACR entry without a date: {}", entry.id);
        return None;
    };
    if published_at < cutoff {
        return None;
    }

    let Some(link) = entry.links.first().map(|l| l.href.trim().to_string()) else {
        warn!("Skipping IACR entry without a link: {}", entry.id);
        return None;
    };
    let eprint_id = eprint_id_from_link(&link)?;

    let mut title = text::normalize_whitespace(entry.title.as_deref().unwrap_or_default());
    let mut authors: Vec<String> = entry
        .authors
        .iter()
        .flat_map(|a| a.split(','))
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();

    // Items without an author element carry them in the title: "Title by A, B"
    if authors.is_empty() {
        let parts: Vec<&str> = title.split(" by ").collect();
        if parts.len() == 2 {
            authors = parts[1]
                .split(',')
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect();
            title = parts[0].trim().to_string();
        }
    }

    let abstract_text = entry
        .summary
        .as_deref()
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    Some(Paper {
        id: format!("iacr_{}", eprint_id),
        pdf_link: Some(format!("https://eprint.iacr.org/{}.pdf", eprint_id)),
        iacr_id: Some(eprint_id),
        title,
        authors,
        abstract_text,
        published: time::to_published(published_at),
        source: IACR_SOURCE.to_string(),
        url: link,
        categories: vec!["Cryptography".to_string()],
        published_official: true,
        ..Paper::default()
    })
}

/// `https://eprint.iacr.org/2024/123` -> `2024/123`
pub fn eprint_id_from_link(link: &str) -> Option<String> {
    let path = match url::Url::parse(link) {
        Ok(url) => url.path().trim_matches('/').to_string(),
        Err(_) => link.rsplit('/').next().unwrap_or_default().to_string(),
    };
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}
