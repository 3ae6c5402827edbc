use crate::types::{Paper, Result, SummaryStatus};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// `papers.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperStore {
    #[serde(default)]
    pub papers: Vec<Paper>,
    /// Opaque to readers; written as RFC 3339
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub total_count: usize,
}

/// `failed.json`: papers whose summary failed, retried at the start of the next run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailedStore {
    #[serde(default)]
    pub papers: Vec<Paper>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub updated: usize,
}

/// Outcome of checking fresh candidates against the store before summarizing.
#[derive(Debug, Default)]
pub struct CacheSplit {
    /// Already stored: summary fields copied from the stored record
    pub cached: Vec<Paper>,
    /// Unknown ids that need a summary
    pub fresh: Vec<Paper>,
}

impl PaperStore {
    pub fn load(path: &Path) -> Result<Self> {
        match read_json::<PaperStore>(path)? {
            Some(store) => {
                info!("Loaded {} papers from {}", store.papers.len(), path.display());
                Ok(store)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Some(Utc::now().to_rfc3339());
        self.total_count = self.papers.len();
        write_json_atomic(path, self)?;
        info!("Saved {} papers to {}", self.papers.len(), path.display());
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Paper> {
        self.papers.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    /// Partition candidates into already-known and new papers.
    ///
    /// Known papers keep their fresh metadata and keyword annotations but take
    /// the stored summary, so they are never sent to the summarizer again.
    pub fn split_cached(&self, candidates: Vec<Paper>) -> CacheSplit {
        let index: HashMap<&str, &Paper> =
            self.papers.iter().map(|p| (p.id.as_str(), p)).collect();

        let mut split = CacheSplit::default();
        for mut candidate in candidates {
            match index.get(candidate.id.as_str()) {
                Some(stored) => {
                    candidate.reuse_summary_from(stored);
                    split.cached.push(candidate);
                }
                None => split.fresh.push(candidate),
            }
        }

        debug!(
            "Cache split: {} cached, {} need summaries",
            split.cached.len(),
            split.fresh.len()
        );
        split
    }

    /// Insert unknown ids; replace known ids only with a successful record.
    pub fn merge(&mut self, incoming: Vec<Paper>) -> MergeStats {
        let mut index: HashMap<String, usize> = self
            .papers
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        let mut stats = MergeStats::default();
        for paper in incoming {
            match index.get(&paper.id) {
                None => {
                    index.insert(paper.id.clone(), self.papers.len());
                    self.papers.push(paper);
                    stats.added += 1;
                }
                Some(&i) => {
                    if paper.summary_status == Some(SummaryStatus::Success) {
                        if self.papers[i] != paper {
                            stats.updated += 1;
                        }
                        self.papers[i] = paper;
                    }
                }
            }
        }

        info!("Added {} new papers, updated {} papers", stats.added, stats.updated);
        stats
    }

    /// Drop papers published before `today - retention_days`; returns how many were removed.
    pub fn prune(&mut self, today: NaiveDate, retention_days: i64) -> usize {
        let removed = prune_papers(&mut self.papers, today, retention_days);
        if removed > 0 {
            info!("Removed {} papers older than {} days", removed, retention_days);
        }
        removed
    }

    /// Newest first; papers sharing a date keep their relative order.
    pub fn sort_newest_first(&mut self) {
        self.papers.sort_by(|a, b| b.published.cmp(&a.published));
    }
}

impl FailedStore {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(read_json(path)?.unwrap_or_default())
    }

    pub fn from_papers(papers: Vec<Paper>) -> Self {
        let mut by_id: Vec<Paper> = Vec::with_capacity(papers.len());
        let mut index: HashMap<String, usize> = HashMap::new();
        for paper in papers {
            match index.get(&paper.id) {
                Some(&i) => by_id[i] = paper,
                None => {
                    index.insert(paper.id.clone(), by_id.len());
                    by_id.push(paper);
                }
            }
        }
        Self {
            count: by_id.len(),
            papers: by_id,
            last_updated: None,
        }
    }

    pub fn prune(&mut self, today: NaiveDate, retention_days: i64) -> usize {
        let removed = prune_papers(&mut self.papers, today, retention_days);
        self.count = self.papers.len();
        removed
    }

    /// Write the failures, or delete the file when there are none left.
    pub fn save_or_clear(&mut self, path: &Path) -> Result<()> {
        if self.papers.is_empty() {
            if path.exists() {
                std::fs::remove_file(path)?;
                info!("All summaries succeeded, cleared {}", path.display());
            }
            return Ok(());
        }

        self.last_updated = Some(Utc::now().to_rfc3339());
        self.count = self.papers.len();
        write_json_atomic(path, self)?;
        info!("Saved {} failed papers to {}", self.count, path.display());
        Ok(())
    }
}

/// Latest publication day that pruning drops
pub fn retention_cutoff(today: NaiveDate, retention_days: i64) -> NaiveDate {
    today - Duration::days(retention_days)
}

fn prune_papers(papers: &mut Vec<Paper>, today: NaiveDate, retention_days: i64) -> usize {
    let cutoff = retention_cutoff(today, retention_days);
    let before = papers.len();
    // Unparseable dates are kept
    papers.retain(|paper| paper.published_date().map_or(true, |date| date > cutoff));
    before - papers.len()
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write to a sibling temp file and rename it over `path`, so readers never see a partial file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
