use crate::types::{AggregatorError, Paper, Result};
use crate::utils::time;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;
use tracing::info;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const MAX_KEYWORD_CATEGORIES: usize = 5;

#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Public site URL; empty disables the self link
    pub site_url: String,
    pub title: String,
    pub description: String,
    pub max_items: usize,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            title: "Paper Pulse".to_string(),
            description: "Keyword-based research paper aggregation from arXiv and IACR".to_string(),
            max_items: 50,
        }
    }
}

impl From<&crate::config::RssConfig> for FeedOptions {
    fn from(config: &crate::config::RssConfig) -> Self {
        Self {
            site_url: config.site_url.clone(),
            title: config.title.clone(),
            description: config.description.clone(),
            max_items: config.max_items,
        }
    }
}

/// Render an RSS 2.0 document. `papers` is expected newest first.
pub fn render_feed(papers: &[Paper], options: &FeedOptions, built_at: DateTime<Utc>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    let site_url = options.site_url.trim();

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    if !site_url.is_empty() {
        rss.push_attribute(("xmlns:atom", ATOM_NS));
    }
    emit(&mut writer, Event::Start(rss))?;
    emit(&mut writer, Event::Start(BytesStart::new("channel")))?;

    text_element(&mut writer, "title", &options.title)?;
    text_element(
        &mut writer,
        "link",
        if site_url.is_empty() { "https://github.com" } else { site_url },
    )?;
    text_element(&mut writer, "description", &options.description)?;
    text_element(&mut writer, "lastBuildDate", &built_at.to_rfc2822())?;

    if !site_url.is_empty() {
        let feed_url = format!("{}/feed.xml", site_url.trim_end_matches('/'));
        let mut link = BytesStart::new("atom:link");
        link.push_attribute(("href", feed_url.as_str()));
        link.push_attribute(("rel", "self"));
        link.push_attribute(("type", "application/rss+xml"));
        emit(&mut writer, Event::Empty(link))?;
    }

    for paper in papers.iter().take(options.max_items) {
        write_item(&mut writer, paper, built_at)?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("channel")))?;
    emit(&mut writer, Event::End(BytesEnd::new("rss")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| AggregatorError::Xml(e.to_string()))
}

pub fn write_feed(path: &Path, papers: &[Paper], options: &FeedOptions) -> Result<()> {
    let xml = render_feed(papers, options, Utc::now())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, xml)?;
    info!(
        "Generated RSS feed at {} ({} items)",
        path.display(),
        papers.len().min(options.max_items)
    );
    Ok(())
}

/// English summary, then the generic summary, then the abstract
pub fn item_description(paper: &Paper) -> &str {
    [paper.summary_en.as_deref(), paper.summary.as_deref()]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or(paper.abstract_text.as_str())
}

fn write_item(writer: &mut Writer<Cursor<Vec<u8>>>, paper: &Paper, built_at: DateTime<Utc>) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new("item")))?;

    let title = if paper.title.is_empty() { "Untitled" } else { paper.title.as_str() };
    text_element(writer, "title", title)?;
    text_element(writer, "link", &paper.url)?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "true"));
    emit(writer, Event::Start(guid))?;
    emit(writer, Event::Text(BytesText::new(&paper.url)))?;
    emit(writer, Event::End(BytesEnd::new("guid")))?;

    text_element(writer, "description", item_description(paper))?;

    if !paper.published.is_empty() {
        let pub_date = time::published_to_rfc2822(&paper.published)
            .unwrap_or_else(|| built_at.to_rfc2822());
        text_element(writer, "pubDate", &pub_date)?;
    }

    if !paper.source.is_empty() {
        text_element(writer, "category", &paper.source)?;
    }
    for keyword in paper.keywords.iter().take(MAX_KEYWORD_CATEGORIES) {
        text_element(writer, "category", keyword)?;
    }

    emit(writer, Event::End(BytesEnd::new("item")))
}

fn text_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn emit(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| AggregatorError::Xml(e.to_string()))
}
