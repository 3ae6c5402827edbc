use crate::config::SummarizerConfig;
use crate::llm_adapter::LlmAdapter;
use crate::types::{BilingualSummary, Paper, ProgressReporter, TokenUsage};
use backoff::backoff::{Backoff, Constant};
use regex_lite::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const ZH_MARKER: &str = "[中文摘要]";
pub const EN_MARKER: &str = "[English Summary]";

#[derive(Debug, Clone)]
pub struct SummarizerSettings {
    pub max_tokens: u32,
    /// Attempts per paper, including the first one
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub rate_limit_delay: Duration,
}

impl From<&SummarizerConfig> for SummarizerSettings {
    fn from(config: &SummarizerConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            rate_limit_delay: config.rate_limit_delay(),
        }
    }
}

/// Which step of the fallback chain produced a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    /// Both labeled sections found in order
    Strict,
    /// Split on whichever markers were present
    Split,
    /// No usable markers; the whole reply serves as both languages
    WholeText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSummary {
    pub summary: BilingualSummary,
    pub stage: ParseStage,
}

/// Bilingual paper summarizer with per-paper retries and inter-call rate limiting
pub struct Summarizer {
    adapter: Box<dyn LlmAdapter>,
    settings: SummarizerSettings,
    usage: TokenUsage,
}

impl Summarizer {
    pub fn new(adapter: Box<dyn LlmAdapter>, settings: SummarizerSettings) -> Self {
        info!("Summarizer using {}", adapter.adapter_name());
        Self {
            adapter,
            settings,
            usage: TokenUsage::default(),
        }
    }

    /// Tokens consumed so far in this run
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn build_prompt(&self, title: &str, abstract_text: &str) -> String {
        let max_tokens = self.settings.max_tokens;
        format!(
            "请为下面这篇研究论文撰写中英文双语摘要。输出上限为 {max_tokens} tokens，请在两种语言之间合理分配篇幅。\n\
             \n\
             论文标题: {title}\n\
             \n\
             论文摘要: {abstract_text}\n\
             \n\
             严格按照以下格式输出，程序会依据标记解析结果：\n\
             \n\
             {ZH_MARKER}\n\
             <中文摘要：背景、方法、主要发现与创新点，约占全文 60-70%，可使用 Markdown>\n\
             \n\
             {EN_MARKER}\n\
             <English summary: core contribution and key results in 3-5 sentences, about 30-40% of the output, Markdown allowed>\n\
             \n\
             要求：\n\
             1. 只输出 {ZH_MARKER} 与 {EN_MARKER} 两个部分，且两个标记都必须完整出现。\n\
             2. 在 {max_tokens} tokens 之内写完两部分，不要截断。"
        )
    }

    /// Summarize one paper. `None` when the abstract is empty or every attempt failed.
    pub async fn summarize(&mut self, paper: &Paper) -> Option<BilingualSummary> {
        if paper.abstract_text.trim().is_empty() {
            debug!("Skipping {}: empty abstract", paper.id);
            return None;
        }

        let prompt = self.build_prompt(&paper.title, &paper.abstract_text);
        let attempts = self.settings.max_retries.max(1);
        let mut backoff = Constant::new(self.settings.retry_delay);

        for attempt in 1..=attempts {
            match self.adapter.complete(&prompt).await {
                Ok(completion) => {
                    self.usage += completion.usage;
                    if let Some(parsed) = completion.text.as_deref().and_then(parse_bilingual_summary) {
                        debug!("Parsed summary for {} ({:?})", paper.id, parsed.stage);
                        return Some(parsed.summary);
                    }
                    warn!(
                        "Attempt {}/{} for {} returned no usable summary",
                        attempt, attempts, paper.id
                    );
                }
                Err(e) => {
                    warn!("Attempt {}/{} failed for {}: {}", attempt, attempts, paper.id, e);
                }
            }

            if attempt < attempts {
                if let Some(delay) = backoff.next_backoff() {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        None
    }

    /// Summarize sequentially, pausing between calls.
    ///
    /// Every returned paper has its status and summary fields set; failures get
    /// the abstract (or a not-available marker) as their summary.
    pub async fn batch_summarize(
        &mut self,
        papers: Vec<Paper>,
        progress: &mut dyn ProgressReporter,
    ) -> (Vec<Paper>, Vec<Paper>) {
        let total = papers.len();
        let mut successful = Vec::new();
        let mut failed = Vec::new();

        progress.start(total, "Summarizing papers");

        for (index, mut paper) in papers.into_iter().enumerate() {
            progress.advance(&paper.title);

            match self.summarize(&paper).await {
                Some(summary) => {
                    paper.mark_summarized(summary);
                    successful.push(paper);
                }
                None => {
                    paper.mark_failed();
                    failed.push(paper);
                }
            }

            let delay = self.settings.rate_limit_delay;
            if index + 1 < total && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        progress.finish();
        info!(
            "Summarization complete: {} successful, {} failed",
            successful.len(),
            failed.len()
        );
        (successful, failed)
    }
}

static STRICT_ZH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[中文摘要\]\s*\n(.*?)\n\[English Summary\]").expect("valid strict zh regex")
});

static STRICT_EN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[English Summary\]\s*\n(.*?)$").expect("valid strict en regex"));

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?:中文摘要|English Summary)\]").expect("valid marker regex"));

/// Split a model reply into its Chinese and English halves.
///
/// Tries, in order: both labeled sections; a split on either marker; the whole
/// reply for both languages. The first stage that finds both markers decides:
/// an empty half there yields `None` instead of falling through. An empty
/// reply also yields `None`.
pub fn parse_bilingual_summary(text: &str) -> Option<ParsedSummary> {
    let zh = STRICT_ZH.captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str());
    let en = STRICT_EN.captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str());

    if let (Some(zh), Some(en)) = (zh, en) {
        return BilingualSummary::new(zh, en).map(|summary| ParsedSummary {
            summary,
            stage: ParseStage::Strict,
        });
    }

    let parts: Vec<&str> = MARKER.split(text).collect();
    if parts.len() >= 3 {
        return BilingualSummary::new(parts[1], parts[2]).map(|summary| ParsedSummary {
            summary,
            stage: ParseStage::Split,
        });
    }

    BilingualSummary::new(text, text).map(|summary| ParsedSummary {
        summary,
        stage: ParseStage::WholeText,
    })
}
