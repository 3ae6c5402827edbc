#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use paper_aggregator::summarizer::SummarizerSettings;
use paper_aggregator::{AggregatorError, Completion, LlmAdapter, Paper, PaperSource, Result, TokenUsage};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Serve `app` on an ephemeral local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

pub fn published_days_ago(days: i64) -> String {
    days_ago(days).format("%Y-%m-%d").to_string()
}

pub fn paper(id: &str, title: &str, abstract_text: &str, published: &str) -> Paper {
    Paper {
        id: id.to_string(),
        title: title.to_string(),
        abstract_text: abstract_text.to_string(),
        published: published.to_string(),
        source: "arXiv".to_string(),
        url: format!("https://example.org/{}", id),
        ..Paper::default()
    }
}

/// Summarizer settings without any sleeping
pub fn fast_settings(max_retries: u32) -> SummarizerSettings {
    SummarizerSettings {
        max_tokens: 500,
        max_retries,
        retry_delay: std::time::Duration::ZERO,
        rate_limit_delay: std::time::Duration::ZERO,
    }
}

pub fn bilingual_reply(zh: &str, en: &str) -> String {
    format!("[中文摘要]\n{}\n\n[English Summary]\n{}", zh, en)
}

pub struct AtomEntry {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
    pub published: DateTime<Utc>,
}

impl AtomEntry {
    pub fn new(arxiv_id: &str, title: &str, published: DateTime<Utc>) -> Self {
        Self {
            id: arxiv_id.to_string(),
            title: title.to_string(),
            summary: format!("Abstract of {}", title),
            authors: vec!["Alice Smith".to_string(), "Bob Jones".to_string()],
            categories: vec!["cs.CR".to_string()],
            published,
        }
    }

    fn to_xml(&self) -> String {
        let authors: String = self
            .authors
            .iter()
            .map(|a| format!("<author><name>{}</name></author>", a))
            .collect();
        let categories: String = self
            .categories
            .iter()
            .map(|c| format!("<category term=\"{}\" scheme=\"http://arxiv.org/schemas/atom\"/>", c))
            .collect();
        let stamp = self.published.to_rfc3339();
        format!(
            "<entry>\
             <id>http://arxiv.org/abs/{id}</id>\
             <updated>{stamp}</updated>\
             <published>{stamp}</published>\
             <title>{title}</title>\
             <summary>{summary}</summary>\
             {authors}\
             <link href=\"http://arxiv.org/abs/{id}\" rel=\"alternate\" type=\"text/html\"/>\
             <link title=\"pdf\" href=\"http://arxiv.org/pdf/{id}\" rel=\"related\" type=\"application/pdf\"/>\
             {categories}\
             </entry>",
            id = self.id,
            stamp = stamp,
            title = self.title,
            summary = self.summary,
            authors = authors,
            categories = categories,
        )
    }
}

pub fn atom_feed(entries: &[AtomEntry]) -> String {
    let body: String = entries.iter().map(AtomEntry::to_xml).collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <feed xmlns=\"http://www.w3.org/2005/Atom\">\
         <id>http://arxiv.org/api/query</id>\
         <title>arXiv Query</title>\
         <updated>{}</updated>\
         {}\
         </feed>",
        Utc::now().to_rfc3339(),
        body
    )
}

pub struct RssItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: Option<String>,
    pub pub_date: Option<DateTime<Utc>>,
}

impl RssItem {
    pub fn new(eprint_id: &str, title: &str, pub_date: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            link: format!("https://eprint.iacr.org/{}", eprint_id),
            description: format!("Abstract of {}", title),
            author: None,
            pub_date: Some(pub_date),
        }
    }

    fn to_xml(&self) -> String {
        let author = self
            .author
            .as_ref()
            .map(|a| format!("<author>{}</author>", a))
            .unwrap_or_default();
        let pub_date = self
            .pub_date
            .map(|d| format!("<pubDate>{}</pubDate>", d.to_rfc2822()))
            .unwrap_or_default();
        format!(
            "<item><title>{}</title><link>{}</link><description>{}</description>{}{}</item>",
            self.title, self.link, self.description, author, pub_date
        )
    }
}

pub fn rss_feed(items: &[RssItem]) -> String {
    let body: String = items.iter().map(RssItem::to_xml).collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <rss version=\"2.0\"><channel>\
         <title>Cryptology ePrint Archive</title>\
         <link>https://eprint.iacr.org</link>\
         <description>Recent papers</description>\
         {}\
         </channel></rss>",
        body
    )
}

/// Adapter answering from a fixed script; an exhausted script answers with an error.
#[derive(Clone)]
pub struct ScriptedAdapter {
    replies: Arc<Mutex<VecDeque<Result<Completion>>>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedAdapter {
    pub fn new(replies: Vec<Result<Completion>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn reply(text: &str) -> Result<Completion> {
    Ok(Completion {
        text: Some(text.to_string()),
        usage: TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
            total_tokens: 150,
        },
    })
}

pub fn api_failure() -> Result<Completion> {
    Err(AggregatorError::Summarizer("HTTP 500: Internal Server Error".to_string()))
}

#[async_trait]
impl LlmAdapter for ScriptedAdapter {
    fn adapter_name(&self) -> String {
        "scripted".to_string()
    }

    async fn complete(&self, prompt: &str) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AggregatorError::Summarizer("script exhausted".to_string())))
    }
}

/// Source returning a fixed list, or an error
pub struct StaticSource {
    pub name: String,
    pub papers: Option<Vec<Paper>>,
}

#[async_trait]
impl PaperSource for StaticSource {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    async fn fetch(&self) -> Result<Vec<Paper>> {
        self.papers
            .clone()
            .ok_or_else(|| AggregatorError::General(format!("{} is down", self.name)))
    }
}
