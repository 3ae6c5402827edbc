use crate::types::{AggregatorError, ParsedEntry, ParsedFeed, ParsedLink, Result};
use feed_rs::parser;
use tracing::debug;

/// Atom/RSS parsing for both sources; feed-rs handles either dialect.
pub struct FeedParser;

impl FeedParser {
    pub fn parse_feed(content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed.title.map(|t| t.content);
        let entries: Vec<ParsedEntry> = feed.entries.into_iter().map(Self::parse_entry).collect();

        debug!("Parsed feed with {} entries", entries.len());
        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> ParsedEntry {
        // Prefer the summary, fall back to the content body
        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body));

        let links = entry
            .links
            .into_iter()
            .map(|link| ParsedLink {
                href: link.href,
                title: link.title,
                rel: link.rel,
            })
            .collect();

        ParsedEntry {
            id: entry.id,
            title: entry.title.map(|t| t.content),
            summary,
            authors: entry
                .authors
                .into_iter()
                .map(|a| a.name)
                .filter(|name| !name.trim().is_empty())
                .collect(),
            links,
            categories: entry.categories.into_iter().map(|c| c.term).collect(),
            published_at: entry.published,
            updated_at: entry.updated,
        }
    }

    pub fn is_valid_feed_content(content: &str) -> bool {
        let content_lower = content.to_lowercase();
        content_lower.contains("<rss")
            || content_lower.contains("<feed")
            || content_lower.contains("<channel")
    }
}
