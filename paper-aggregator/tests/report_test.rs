mod common;

use chrono::NaiveDate;
use common::{init_tracing, paper};
use paper_aggregator::progress::{BarProgress, LogProgress};
use paper_aggregator::report::{format_authors, render_report, write_report, RunReport};
use paper_aggregator::{BilingualSummary, Paper, ProgressReporter, TokenUsage};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 12).unwrap()
}

fn summarized(id: &str) -> Paper {
    let mut p = paper(id, &format!("Paper {}", id), "Abstract", "2024-05-11");
    p.authors = vec!["Ada".to_string(), "Grace".to_string()];
    p.keywords = vec!["llm".to_string(), "security".to_string()];
    p.mark_summarized(BilingualSummary::new("中文总结", "English recap").unwrap());
    p
}

#[test]
fn test_report_sections() {
    let new_papers = vec![summarized("arxiv_1")];
    let retried = vec![summarized("arxiv_0")];
    let mut still_failing = paper("iacr_2024/1", "Stubborn", "Abstract", "2024-05-10");
    still_failing.source = "IACR".to_string();
    still_failing.mark_failed();
    let failed = vec![still_failing];

    let report = RunReport {
        date: date(),
        new_papers: &new_papers,
        retried_papers: &retried,
        failed_papers: &failed,
        total_in_store: 42,
        usage: TokenUsage {
            input_tokens: 10,
            output_tokens: 20,
            total_tokens: 30,
        },
        site_url: "https://papers.example.org",
    };

    let markdown = render_report(&report);

    assert!(markdown.starts_with("# Paper Pulse digest 2024-05-12"));
    assert!(markdown.contains("- Papers in store: 42"));
    assert!(markdown.contains("- New summaries: 1"));
    assert!(markdown.contains("- Retried summaries: 1"));
    assert!(markdown.contains("- Failed summaries: 1"));
    assert!(markdown.contains("10 input / 20 output / 30 total"));
    assert!(markdown.contains("### [Paper arxiv_1](https://example.org/arxiv_1)"));
    assert!(markdown.contains("### [Paper arxiv_0](https://example.org/arxiv_0)"));
    assert!(markdown.contains("- Authors: Ada, Grace"));
    assert!(markdown.contains("- Keywords: llm, security"));
    assert!(markdown.contains("中文总结"));
    assert!(markdown.contains("English recap"));
    assert!(markdown.contains("## Summaries pending retry"));
    assert!(markdown.contains("- [Stubborn](https://example.org/iacr_2024/1) (IACR)"));
    assert!(markdown.contains("Full list: https://papers.example.org"));
}

#[test]
fn test_quiet_run_report() {
    let report = RunReport {
        date: date(),
        new_papers: &[],
        retried_papers: &[],
        failed_papers: &[],
        total_in_store: 3,
        usage: TokenUsage::default(),
        site_url: "",
    };

    let markdown = render_report(&report);
    assert!(markdown.contains("No new papers matched the keyword rules this run."));
    assert!(!markdown.contains("pending retry"));
    assert!(!markdown.contains("Full list"));
}

#[test]
fn test_author_list_is_capped() {
    let authors: Vec<String> = (1..=7).map(|i| format!("Author {}", i)).collect();
    assert_eq!(
        format_authors(&authors),
        "Author 1, Author 2, Author 3, Author 4, Author 5 et al."
    );
    assert_eq!(format_authors(&authors[..2]), "Author 1, Author 2");
}

#[test]
fn test_write_report_creates_file() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("email_report.md");
    let report = RunReport {
        date: date(),
        new_papers: &[],
        retried_papers: &[],
        failed_papers: &[],
        total_in_store: 0,
        usage: TokenUsage::default(),
        site_url: "",
    };

    let markdown = write_report(&path, &report).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), markdown);
}

#[test]
fn test_bar_redraws_only_on_percent_change() {
    let mut bar = BarProgress::new(Vec::new());
    bar.start(200, "Summarizing papers");
    for i in 0..200 {
        bar.advance(&format!("paper {}", i));
    }
    bar.finish();

    let output = String::from_utf8(bar.into_inner()).unwrap();
    // One frame per distinct percentage, 0 through 100
    assert_eq!(output.matches('\r').count(), 101);
    assert!(output.ends_with("200/200 (100%)\n"));
    assert!(output.contains(&"█".repeat(40)));
}

#[test]
fn test_bar_finish_completes_short_runs() {
    let mut bar = BarProgress::new(Vec::new());
    bar.start(4, "Retrying");
    bar.advance("one");
    bar.finish();

    let output = String::from_utf8(bar.into_inner()).unwrap();
    assert!(output.contains("Retrying: ["));
    assert!(output.ends_with("4/4 (100%)\n"));
}

#[test]
fn test_log_progress_accepts_items() {
    init_tracing();

    let mut log = LogProgress::default();
    log.start(2, "Summarizing papers");
    log.advance("A title that is considerably longer than sixty characters in total length");
    log.advance("Short");
    log.finish();
}
