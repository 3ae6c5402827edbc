mod common;

use chrono::{TimeZone, Utc};
use common::{init_tracing, paper};
use paper_aggregator::feed_writer::{item_description, render_feed, write_feed, FeedOptions};
use paper_aggregator::{BilingualSummary, FeedParser, Paper};

fn built_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 12, 8, 30, 0).unwrap()
}

fn summarized(id: &str, published: &str) -> Paper {
    let mut p = paper(id, &format!("Paper {}", id), "Raw abstract", published);
    p.mark_summarized(BilingualSummary::new("中文摘要", format!("English summary of {}", id)).unwrap());
    p
}

#[test]
fn test_channel_with_site_url() {
    init_tracing();

    let options = FeedOptions {
        site_url: "https://papers.example.org/".to_string(),
        ..FeedOptions::default()
    };
    let xml = render_feed(&[summarized("arxiv_1", "2024-05-11")], &options, built_at()).unwrap();

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(xml.contains("xmlns:atom=\"http://www.w3.org/2005/Atom\""));
    assert!(xml.contains(
        "<atom:link href=\"https://papers.example.org/feed.xml\" rel=\"self\" type=\"application/rss+xml\"/>"
    ));
    assert!(xml.contains("<link>https://papers.example.org/</link>"));
    assert!(xml.contains("<lastBuildDate>Sun, 12 May 2024 08:30:00 +0000</lastBuildDate>"));
    assert!(xml.contains("<title>Paper Pulse</title>"));
}

#[test]
fn test_channel_without_site_url() {
    let xml = render_feed(&[], &FeedOptions::default(), built_at()).unwrap();

    assert!(!xml.contains("xmlns:atom"));
    assert!(!xml.contains("atom:link"));
    assert!(xml.contains("<link>https://github.com</link>"));
}

#[test]
fn test_item_fields() {
    let mut p = summarized("arxiv_1", "2024-05-11");
    p.url = "https://arxiv.org/abs/2405.1".to_string();
    p.keywords = ["a", "b", "c", "d", "e", "f", "g"].iter().map(|k| k.to_string()).collect();

    let xml = render_feed(&[p], &FeedOptions::default(), built_at()).unwrap();

    assert!(xml.contains("<title>Paper arxiv_1</title>"));
    assert!(xml.contains("<link>https://arxiv.org/abs/2405.1</link>"));
    assert!(xml.contains("<guid isPermaLink=\"true\">https://arxiv.org/abs/2405.1</guid>"));
    assert!(xml.contains("<description>English summary of arxiv_1</description>"));
    assert!(xml.contains("<pubDate>Sat, 11 May 2024 00:00:00 +0000</pubDate>"));
    assert!(xml.contains("<category>arXiv</category>"));
    assert!(xml.contains("<category>e</category>"));
    assert!(!xml.contains("<category>f</category>"));
    assert_eq!(xml.matches("<category>").count(), 6);
}

#[test]
fn test_unparseable_date_uses_build_time() {
    let p = paper("iacr_x", "Odd date", "Abstract", "May 2024");
    let xml = render_feed(&[p], &FeedOptions::default(), built_at()).unwrap();

    assert!(xml.contains("<pubDate>Sun, 12 May 2024 08:30:00 +0000</pubDate>"));
}

#[test]
fn test_item_cap() {
    let papers: Vec<Paper> = (0..8).map(|i| summarized(&format!("arxiv_{}", i), "2024-05-11")).collect();
    let options = FeedOptions {
        max_items: 3,
        ..FeedOptions::default()
    };

    let xml = render_feed(&papers, &options, built_at()).unwrap();

    assert_eq!(xml.matches("<item>").count(), 3);
    assert!(xml.contains("Paper arxiv_2"));
    assert!(!xml.contains("Paper arxiv_3"));
}

#[test]
fn test_description_preference() {
    let mut p = paper("arxiv_1", "T", "Raw abstract", "2024-05-11");
    assert_eq!(item_description(&p), "Raw abstract");

    p.summary = Some("Generic".to_string());
    assert_eq!(item_description(&p), "Generic");

    p.summary_en = Some(String::new());
    assert_eq!(item_description(&p), "Generic");

    p.summary_en = Some("English".to_string());
    assert_eq!(item_description(&p), "English");
}

#[test]
fn test_special_characters_are_escaped() {
    let mut p = paper("arxiv_1", "Bounds for <n> & m", "Abstract", "2024-05-11");
    p.summary_en = Some("x < y && y > z".to_string());

    let xml = render_feed(&[p], &FeedOptions::default(), built_at()).unwrap();

    assert!(xml.contains("Bounds for &lt;n&gt; &amp; m"));
    assert!(xml.contains("x &lt; y &amp;&amp; y &gt; z"));
}

#[test]
fn test_written_feed_parses_back() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("feed.xml");
    let papers = vec![summarized("arxiv_1", "2024-05-11"), summarized("arxiv_2", "2024-05-10")];

    write_feed(&path, &papers, &FeedOptions::default()).unwrap();

    let parsed = FeedParser::parse_feed(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed.title.as_deref(), Some("Paper Pulse"));
    assert_eq!(parsed.entries.len(), 2);
    assert_eq!(parsed.entries[0].title.as_deref(), Some("Paper arxiv_1"));
    assert_eq!(parsed.entries[0].categories, vec!["arXiv"]);
}
