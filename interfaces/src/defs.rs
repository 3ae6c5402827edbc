use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

/// Calendar-day format used for `Paper::published`.
pub const PUBLISHED_FORMAT: &str = "%Y-%m-%d";

pub const SUMMARY_NOT_AVAILABLE_EN: &str = "Summary not available";
pub const SUMMARY_NOT_AVAILABLE_ZH: &str = "摘要不可用";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStatus {
    Success,
    Failed,
}

/// A Chinese/English summary pair. Both halves are non-empty by construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BilingualSummary {
    zh: String,
    en: String,
}

impl BilingualSummary {
    pub fn new(zh: impl Into<String>, en: impl Into<String>) -> Option<Self> {
        let zh = zh.into().trim().to_owned();
        let en = en.into().trim().to_owned();
        if zh.is_empty() || en.is_empty() {
            return None;
        }
        Some(Self { zh, en })
    }

    pub fn zh(&self) -> &str {
        &self.zh
    }

    pub fn en(&self) -> &str {
        &self.en
    }
}

/// One research paper, normalized across sources.
///
/// The JSON shape is the on-disk format of `papers.json` and `failed.json`,
/// so optional fields stay optional and everything that older writers may have
/// omitted carries a serde default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Source-prefixed identifier, e.g. `arxiv_2401.01234v1` or `iacr_2024/123`.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arxiv_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iacr_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    /// `YYYY-MM-DD`. Kept as text so unparseable legacy values round-trip.
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub pdf_link: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub published_official: bool,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub keyword_score: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_status: Option<SummaryStatus>,
}

impl Paper {
    pub fn published_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.published.trim(), PUBLISHED_FORMAT).ok()
    }

    pub fn is_summarized(&self) -> bool {
        self.summary_status == Some(SummaryStatus::Success)
    }

    pub fn mark_summarized(&mut self, summary: BilingualSummary) {
        // The generic field defaults to Chinese, which is what the web front end reads.
        self.summary = Some(summary.zh.clone());
        self.summary_zh = Some(summary.zh);
        self.summary_en = Some(summary.en);
        self.summary_status = Some(SummaryStatus::Success);
    }

    pub fn mark_failed(&mut self) {
        let abstract_text = self.abstract_text.trim();
        if abstract_text.is_empty() {
            self.summary = Some(SUMMARY_NOT_AVAILABLE_EN.to_owned());
            self.summary_zh = Some(SUMMARY_NOT_AVAILABLE_ZH.to_owned());
            self.summary_en = Some(SUMMARY_NOT_AVAILABLE_EN.to_owned());
        } else {
            self.summary = Some(abstract_text.to_owned());
            self.summary_zh = Some(abstract_text.to_owned());
            self.summary_en = Some(abstract_text.to_owned());
        }
        self.summary_status = Some(SummaryStatus::Failed);
    }

    /// Take the summary fields and status of a previously stored copy of this paper.
    pub fn reuse_summary_from(&mut self, cached: &Paper) {
        self.summary = cached.summary.clone();
        self.summary_zh = cached.summary_zh.clone();
        self.summary_en = cached.summary_en.clone();
        self.summary_status = cached.summary_status;
    }

    /// Text the keyword rules are matched against.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.abstract_text)
    }
}

/// Token accounting reported by the generation endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}

// Object style note:
// A run is one short lived batch process. Reporters are picked once at
// startup and handed to whoever needs them; nothing looks them up globally.

pub trait ProgressReporter: Send {
    fn start(&mut self, total: usize, label: &str);
    fn advance(&mut self, item: &str);
    fn finish(&mut self);
}
