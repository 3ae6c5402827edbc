use crate::types::{Paper, Result};
use async_trait::async_trait;

/// A remote source of recent papers (arXiv, IACR ePrint, ...)
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Human-readable name for this source, also stored as `Paper::source`
    fn source_name(&self) -> String;

    /// Fetch papers published within the lookback window.
    ///
    /// Transient failures are absorbed by the source: it returns whatever it
    /// collected before the failure. An `Err` means nothing usable came back.
    async fn fetch(&self) -> Result<Vec<Paper>>;
}
