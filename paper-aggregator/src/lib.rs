pub mod types;
pub mod config;
pub mod fetcher;
pub mod parser;
pub mod traits;
pub mod utils;
pub mod sources;
pub mod filter;
pub mod llm_adapter;
pub mod summarizer;
pub mod store;
pub mod feed_writer;
pub mod report;
pub mod mailer;
pub mod progress;
pub mod pipeline;

pub use types::*;
pub use crate::config::{AppConfig, ProgressMode};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use traits::PaperSource;
pub use sources::{ArxivSource, IacrSource};
pub use filter::{KeywordFilter, KeywordRules};
pub use llm_adapter::{Completion, DashScopeAdapter, LlmAdapter};
pub use summarizer::{Summarizer, SummarizerSettings};
pub use store::{FailedStore, PaperStore};
pub use pipeline::{build_pipeline, Pipeline, RunOptions, RunSummary};
