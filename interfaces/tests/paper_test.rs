use interfaces::defs::{SUMMARY_NOT_AVAILABLE_EN, SUMMARY_NOT_AVAILABLE_ZH};
use interfaces::{BilingualSummary, EmptyProgress, Paper, ProgressReporter, SummaryStatus, TokenUsage};

fn sample() -> Paper {
    Paper {
        id: "arxiv_2405.00001v1".to_string(),
        arxiv_id: Some("2405.00001v1".to_string()),
        title: "Sample".to_string(),
        abstract_text: "  An abstract.  ".to_string(),
        published: "2024-05-01".to_string(),
        source: "arXiv".to_string(),
        url: "https://arxiv.org/abs/2405.00001v1".to_string(),
        ..Paper::default()
    }
}

#[test]
fn bilingual_summary_rejects_blank_halves() {
    assert!(BilingualSummary::new("中文", "  ").is_none());
    assert!(BilingualSummary::new("", "English").is_none());

    let summary = BilingualSummary::new(" 中文 ", "\nEnglish\n").unwrap();
    assert_eq!(summary.zh(), "中文");
    assert_eq!(summary.en(), "English");
}

#[test]
fn mark_summarized_sets_generic_field_to_chinese() {
    let mut paper = sample();
    paper.mark_summarized(BilingualSummary::new("中文", "English").unwrap());

    assert!(paper.is_summarized());
    assert_eq!(paper.summary.as_deref(), Some("中文"));
    assert_eq!(paper.summary_en.as_deref(), Some("English"));
}

#[test]
fn mark_failed_falls_back_to_abstract() {
    let mut paper = sample();
    paper.mark_failed();

    assert_eq!(paper.summary_status, Some(SummaryStatus::Failed));
    assert_eq!(paper.summary.as_deref(), Some("An abstract."));
    assert_eq!(paper.summary_zh.as_deref(), Some("An abstract."));

    let mut empty = Paper {
        abstract_text: String::new(),
        ..sample()
    };
    empty.mark_failed();
    assert_eq!(empty.summary_zh.as_deref(), Some(SUMMARY_NOT_AVAILABLE_ZH));
    assert_eq!(empty.summary_en.as_deref(), Some(SUMMARY_NOT_AVAILABLE_EN));
}

#[test]
fn json_shape_matches_store_format() {
    let mut paper = sample();
    paper.mark_summarized(BilingualSummary::new("中文", "English").unwrap());

    let value = serde_json::to_value(&paper).unwrap();
    assert_eq!(value["abstract"], "  An abstract.  ");
    assert_eq!(value["summary_status"], "success");
    assert_eq!(value["arxiv_id"], "2405.00001v1");
    assert!(value.get("iacr_id").is_none());
    assert!(value.get("abstract_text").is_none());

    let unsummarized = serde_json::to_value(sample()).unwrap();
    assert!(unsummarized.get("summary").is_none());
    assert!(unsummarized.get("summary_status").is_none());

    let back: Paper = serde_json::from_value(value).unwrap();
    assert_eq!(back, paper);
}

#[test]
fn published_date_parsing() {
    assert!(sample().published_date().is_some());
    let odd = Paper {
        published: "yesterday".to_string(),
        ..sample()
    };
    assert!(odd.published_date().is_none());
}

#[test]
fn token_usage_accumulates() {
    let mut total = TokenUsage::default();
    total += TokenUsage {
        input_tokens: 1,
        output_tokens: 2,
        total_tokens: 3,
    };
    total += TokenUsage {
        input_tokens: 10,
        output_tokens: 20,
        total_tokens: 30,
    };
    assert_eq!(total.total_tokens, 33);
    assert_eq!(total.input_tokens, 11);
}

#[test]
fn empty_progress_is_silent() {
    let mut progress = EmptyProgress;
    progress.start(3, "anything");
    progress.advance("item");
    progress.finish();
}
