use crate::config::AppConfig;
use crate::feed_writer::{self, FeedOptions};
use crate::filter::{KeywordFilter, KeywordRules};
use crate::llm_adapter::DashScopeAdapter;
use crate::mailer;
use crate::progress;
use crate::report::{self, RunReport};
use crate::sources::{ArxivSource, IacrSource};
use crate::store::{FailedStore, PaperStore};
use crate::summarizer::{Summarizer, SummarizerSettings};
use crate::traits::PaperSource;
use crate::types::{Paper, ProgressReporter, Result, TokenUsage};
use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};

/// Output toggles the CLI can switch off for a single run
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub write_feed: bool,
    pub send_email: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            write_feed: true,
            send_email: true,
        }
    }
}

/// Counters for one completed run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub fetched: usize,
    pub matched: usize,
    pub cached: usize,
    pub summarized: usize,
    pub retried: usize,
    pub failed: usize,
    pub added: usize,
    pub pruned: usize,
    pub total_in_store: usize,
    pub usage: TokenUsage,
}

/// One batch run: retry, fetch, filter, summarize, merge, publish.
pub struct Pipeline {
    config: AppConfig,
    sources: Vec<Box<dyn PaperSource>>,
    filter: KeywordFilter,
    summarizer: Summarizer,
    progress: Box<dyn ProgressReporter>,
    options: RunOptions,
    today: NaiveDate,
}

impl Pipeline {
    pub fn new(
        config: AppConfig,
        filter: KeywordFilter,
        summarizer: Summarizer,
        progress: Box<dyn ProgressReporter>,
    ) -> Self {
        Self {
            config,
            sources: Vec::new(),
            filter,
            summarizer,
            progress,
            options: RunOptions::default(),
            today: Utc::now().date_naive(),
        }
    }

    pub fn add_source(&mut self, source: Box<dyn PaperSource>) {
        info!("Adding source to pipeline: {}", source.source_name());
        self.sources.push(source);
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Date the retention window is measured from
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub async fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        let papers_path = self.config.papers_path();
        let failed_path = self.config.failed_path();
        let mut store = PaperStore::load(&papers_path)?;
        let failed_store = FailedStore::load(&failed_path)?;

        // Retry last run's failures before anything new
        let (retried_ok, retried_failed) = if failed_store.papers.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            info!("Retrying {} previously failed papers", failed_store.papers.len());
            self.summarizer
                .batch_summarize(failed_store.papers, self.progress.as_mut())
                .await
        };
        summary.retried = retried_ok.len();

        let fetched = self.fetch_all().await;
        summary.fetched = fetched.len();

        let matched = self.filter.filter(fetched);
        summary.matched = matched.len();

        let split = store.split_cached(matched);
        summary.cached = split.cached.len();

        let (successful, failed) = if split.fresh.is_empty() {
            info!("No new papers to summarize");
            (Vec::new(), Vec::new())
        } else {
            info!("Summarizing {} new papers", split.fresh.len());
            self.summarizer
                .batch_summarize(split.fresh, self.progress.as_mut())
                .await
        };
        summary.summarized = successful.len();

        let mut incoming: Vec<Paper> = Vec::with_capacity(
            retried_ok.len() + successful.len() + failed.len() + split.cached.len(),
        );
        incoming.extend(retried_ok.iter().cloned());
        incoming.extend(successful.iter().cloned());
        incoming.extend(failed.iter().cloned());
        incoming.extend(split.cached);
        summary.added = store.merge(incoming).added;

        let retention_days = self.config.general.retention_days;
        summary.pruned = store.prune(self.today, retention_days);
        store.sort_newest_first();
        store.save(&papers_path)?;
        summary.total_in_store = store.len();

        let mut still_failed = FailedStore::from_papers(
            retried_failed.into_iter().chain(failed.iter().cloned()).collect(),
        );
        still_failed.prune(self.today, retention_days);
        still_failed.save_or_clear(&failed_path)?;
        summary.failed = still_failed.papers.len();
        summary.usage = self.summarizer.usage();

        if self.config.rss.enabled && self.options.write_feed {
            feed_writer::write_feed(
                &self.config.feed_path(),
                &store.papers,
                &FeedOptions::from(&self.config.rss),
            )?;
        }

        if self.config.email.enabled {
            let run_report = RunReport {
                date: self.today,
                new_papers: &successful,
                retried_papers: &retried_ok,
                failed_papers: &still_failed.papers,
                total_in_store: summary.total_in_store,
                usage: summary.usage,
                site_url: &self.config.rss.site_url,
            };
            let markdown = report::write_report(&self.config.report_path(), &run_report)?;

            if self.options.send_email {
                let subject = format!("{} {}", self.config.email.subject, self.today.format("%Y-%m-%d"));
                mailer::deliver_if_configured(&self.config.email, &subject, markdown).await;
            }
        }

        info!(
            "Run complete: {} fetched, {} matched, {} summarized, {} retried, {} failed, {} in store",
            summary.fetched,
            summary.matched,
            summary.summarized,
            summary.retried,
            summary.failed,
            summary.total_in_store
        );
        info!(
            "Token usage: {} input, {} output, {} total",
            summary.usage.input_tokens, summary.usage.output_tokens, summary.usage.total_tokens
        );

        Ok(summary)
    }

    /// A failing source is logged and skipped.
    async fn fetch_all(&self) -> Vec<Paper> {
        let mut papers = Vec::new();
        for source in &self.sources {
            match source.fetch().await {
                Ok(fetched) => {
                    info!("{}: fetched {} papers", source.source_name(), fetched.len());
                    papers.extend(fetched);
                }
                Err(e) => error!("Failed to fetch from {}: {}", source.source_name(), e),
            }
        }
        if papers.is_empty() {
            warn!("No papers fetched from any source");
        }
        papers
    }
}

/// Wire the production pipeline from configuration.
///
/// Fails before any network activity when the summarizer key is missing.
pub fn build_pipeline(config: AppConfig) -> Result<Pipeline> {
    let api_key = config.api_key()?.to_string();

    let rules = KeywordRules::load(&config.general.keywords_file)?;
    info!("Loaded {} keyword rules", rules.len());

    let adapter = DashScopeAdapter::new(&config.summarizer, api_key)?;
    let summarizer = Summarizer::new(
        Box::new(adapter),
        SummarizerSettings::from(&config.summarizer),
    );
    let reporter = progress::reporter_for(config.general.progress);

    let days_back = config.general.days_back;
    let arxiv = config.arxiv.enabled.then(|| ArxivSource::new(config.arxiv.clone(), days_back));
    let iacr = config.iacr.enabled.then(|| IacrSource::new(config.iacr.clone(), days_back));

    let mut pipeline = Pipeline::new(config, KeywordFilter::new(rules), summarizer, reporter);
    if let Some(arxiv) = arxiv {
        pipeline.add_source(Box::new(arxiv?));
    }
    if let Some(iacr) = iacr {
        pipeline.add_source(Box::new(iacr?));
    }
    Ok(pipeline)
}
