use crate::types::{Paper, Result, TokenUsage};
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

const MAX_AUTHORS: usize = 5;

/// Everything one run contributes to its report
#[derive(Debug, Clone)]
pub struct RunReport<'a> {
    pub date: NaiveDate,
    /// Papers summarized for the first time this run
    pub new_papers: &'a [Paper],
    /// Previously failed papers that succeeded on retry
    pub retried_papers: &'a [Paper],
    /// Papers that are still without a model summary
    pub failed_papers: &'a [Paper],
    pub total_in_store: usize,
    pub usage: TokenUsage,
    pub site_url: &'a str,
}

pub fn render_report(report: &RunReport<'_>) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "# Paper Pulse digest {}\n", report.date.format("%Y-%m-%d"));

    let _ = writeln!(out, "## Statistics\n");
    let _ = writeln!(out, "- Papers in store: {}", report.total_in_store);
    let _ = writeln!(out, "- New summaries: {}", report.new_papers.len());
    let _ = writeln!(out, "- Retried summaries: {}", report.retried_papers.len());
    let _ = writeln!(out, "- Failed summaries: {}", report.failed_papers.len());
    let _ = writeln!(
        out,
        "- Token usage: {} input / {} output / {} total\n",
        report.usage.input_tokens, report.usage.output_tokens, report.usage.total_tokens
    );

    let summarized: Vec<&Paper> = report
        .new_papers
        .iter()
        .chain(report.retried_papers.iter())
        .collect();

    if summarized.is_empty() {
        let _ = writeln!(out, "No new papers matched the keyword rules this run.\n");
    } else {
        let _ = writeln!(out, "## New papers\n");
        for paper in summarized {
            write_paper_section(&mut out, paper);
        }
    }

    if !report.failed_papers.is_empty() {
        let _ = writeln!(out, "## Summaries pending retry\n");
        for paper in report.failed_papers {
            let _ = writeln!(out, "- [{}]({}) ({})", paper.title, paper.url, paper.source);
        }
        out.push('\n');
    }

    let site_url = report.site_url.trim();
    if !site_url.is_empty() {
        let _ = writeln!(out, "---\n\nFull list: {}", site_url);
    }

    out
}

pub fn write_report(path: &Path, report: &RunReport<'_>) -> Result<String> {
    let markdown = render_report(report);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &markdown)?;
    info!("Wrote run report to {}", path.display());
    Ok(markdown)
}

/// `A, B, C, D, E et al.`
pub fn format_authors(authors: &[String]) -> String {
    let shown = authors
        .iter()
        .take(MAX_AUTHORS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > MAX_AUTHORS {
        format!("{} et al.", shown)
    } else {
        shown
    }
}

fn write_paper_section(out: &mut String, paper: &Paper) {
    let _ = writeln!(out, "### [{}]({})\n", paper.title, paper.url);
    if !paper.authors.is_empty() {
        let _ = writeln!(out, "- Authors: {}", format_authors(&paper.authors));
    }
    let _ = writeln!(out, "- Source: {}", paper.source);
    let _ = writeln!(out, "- Published: {}", paper.published);
    if !paper.keywords.is_empty() {
        let _ = writeln!(out, "- Keywords: {}", paper.keywords.join(", "));
    }
    out.push('\n');

    if let Some(zh) = paper.summary_zh.as_deref().filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "**中文摘要**\n\n{}\n", zh);
    }
    if let Some(en) = paper.summary_en.as_deref().filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "**English Summary**\n\n{}\n", en);
    }
}
