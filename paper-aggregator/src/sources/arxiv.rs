use crate::config::ArxivConfig;
use crate::fetcher::Fetcher;
use crate::parser::FeedParser;
use crate::traits::PaperSource;
use crate::types::{ParsedEntry, Paper, Result};
use crate::utils::{text, time};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{error, info, warn};

pub const ARXIV_SOURCE: &str = "arXiv";

/// arXiv export API source, one paginated query per category
pub struct ArxivSource {
    fetcher: Fetcher,
    config: ArxivConfig,
    days_back: i64,
}

impl ArxivSource {
    pub fn new(config: ArxivConfig, days_back: i64) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetch_config())?;
        Ok(Self {
            fetcher,
            config,
            days_back,
        })
    }

    /// Walk one category newest-first until the cutoff or the result cap.
    ///
    /// Errors end this category only; whatever was collected so far is kept.
    async fn fetch_category(
        &self,
        category: &str,
        cutoff: DateTime<Utc>,
        first_request: &mut bool,
    ) -> Vec<Paper> {
        let batch_size = self.config.batch_size.max(1);
        let mut papers = Vec::new();
        let mut start = 0usize;

        loop {
            if !std::mem::take(first_request) {
                self.fetcher.pause().await;
            }

            let query = [
                ("search_query", format!("cat:{}", category)),
                ("start", start.to_string()),
                ("max_results", batch_size.to_string()),
                ("sortBy", "submittedDate".to_string()),
                ("sortOrder", "descending".to_string()),
            ];

            let body = match self.fetcher.fetch_text(&self.config.api_url, &query).await {
                Ok(body) => body,
                Err(e) => {
                    error!("Error fetching from arXiv category {}: {}", category, e);
                    break;
                }
            };

            let feed = match FeedParser::parse_feed(&body) {
                Ok(feed) => feed,
                Err(e) => {
                    error!("Error parsing arXiv response for {}: {}", category, e);
                    break;
                }
            };

            if feed.entries.is_empty() {
                break;
            }

            for entry in feed.entries {
                let Some(published_at) = entry.published_at else {
                    warn!("Skipping malformed arXiv entry (missing published date)");
                    continue;
                };
                let Some(paper) = convert_entry(entry, published_at) else {
                    warn!("Skipping malformed arXiv entry (missing required fields)");
                    continue;
                };

                // Results are sorted by submission date, so everything after this is older
                if published_at < cutoff {
                    return papers;
                }

                papers.push(paper);
            }

            start += batch_size;
            if start >= self.config.max_results {
                break;
            }
        }

        papers
    }
}

#[async_trait]
impl PaperSource for ArxivSource {
    fn source_name(&self) -> String {
        ARXIV_SOURCE.to_string()
    }

    async fn fetch(&self) -> Result<Vec<Paper>> {
        let cutoff = time::cutoff(Utc::now(), self.days_back);
        let mut all_papers = Vec::new();
        let mut first_request = true;

        for category in &self.config.categories {
            info!("Fetching from arXiv category: {}", category);
            let papers = self.fetch_category(category, cutoff, &mut first_request).await;
            info!("arXiv category {} yielded {} papers", category, papers.len());
            all_papers.extend(papers);
        }

        let unique = dedup_by_id(all_papers);
        info!("Fetched {} unique papers from arXiv", unique.len());
        Ok(unique)
    }
}

/// Papers are listed under every category they are cross-posted to; keep the first copy
pub fn dedup_by_id(papers: Vec<Paper>) -> Vec<Paper> {
    let mut seen = HashSet::new();
    papers
        .into_iter()
        .filter(|paper| seen.insert(paper.id.clone()))
        .collect()
}

/// Normalize an Atom entry. `None` when id, title or abstract is missing.
pub fn convert_entry(entry: ParsedEntry, published_at: DateTime<Utc>) -> Option<Paper> {
    let raw_id = entry.id.trim();
    if raw_id.is_empty() {
        return None;
    }
    let title = text::normalize_whitespace(entry.title.as_deref()?);
    let abstract_text = text::normalize_whitespace(entry.summary.as_deref()?);
    if title.is_empty() {
        return None;
    }

    let arxiv_id = raw_id.rsplit("/abs/").next().unwrap_or(raw_id).to_string();

    let pdf_link = entry
        .links
        .iter()
        .find(|link| link.title.as_deref() == Some("pdf"))
        .map(|link| link.href.clone());

    let mut categories: Vec<String> = Vec::new();
    for term in entry.categories {
        if !term.is_empty() && !categories.contains(&term) {
            categories.push(term);
        }
    }

    Some(Paper {
        id: format!("arxiv_{}", arxiv_id),
        url: format!("https://arxiv.org/abs/{}", arxiv_id),
        arxiv_id: Some(arxiv_id),
        title,
        authors: entry.authors,
        abstract_text,
        published: time::to_published(published_at),
        source: ARXIV_SOURCE.to_string(),
        pdf_link,
        categories,
        published_official: true,
        ..Paper::default()
    })
}
