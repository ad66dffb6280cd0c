//! Extraction coordinator orchestrating the link pipeline
//!
//! For each source: fetch raw links through the browser, drop invalid URLs,
//! drop links the table already knows (per the source's normalization rule),
//! and append the rest as new records.
//!
//! Sources run strictly one after another. The set of known URLs is re-read
//! from the table for every source, so a source always sees what earlier
//! sources of the same run appended.

mod types;

pub use types::*;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::{browser::Browser, dedup::filter_new, is_valid_url};
use crate::config::SourceSpec;
use crate::store::{RecordStore, StorageResult};
use crate::types::RecordDraft;

/// Source of creation timestamps
pub type Clock = fn() -> i64;

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Coordinator running sources against one record table
pub struct ExtractionCoordinator {
    /// Configured sources, processed in key order
    sources: BTreeMap<String, SourceSpec>,
    /// Page-driving collaborator
    browser: Arc<dyn Browser>,
    /// Record table
    store: Arc<RecordStore>,
    /// Timestamp for new records
    clock: Clock,
}

impl ExtractionCoordinator {
    /// Create a new coordinator
    pub fn new(
        sources: BTreeMap<String, SourceSpec>,
        browser: Arc<dyn Browser>,
        store: Arc<RecordStore>,
    ) -> Self {
        Self {
            sources,
            browser,
            store,
            clock: unix_now,
        }
    }

    /// Use a fixed clock for `dateAdded`
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Process every configured source.
    ///
    /// A browser failure only fails its own source; a storage failure aborts
    /// the run.
    pub async fn process_all(&self) -> StorageResult<RunSummary> {
        let mut summary = RunSummary::default();
        for (name, spec) in &self.sources {
            summary.outcomes.push(self.process_source(name, spec).await?);
        }
        self.log_summary(&summary);
        Ok(summary)
    }

    /// Process the named sources, in the given order. Names that are not
    /// configured are reported as failed sources.
    pub async fn process_selected(&self, names: &[String]) -> StorageResult<RunSummary> {
        let mut summary = RunSummary::default();
        for name in names {
            let outcome = match self.sources.get(name) {
                Some(spec) => self.process_source(name, spec).await?,
                None => SourceOutcome {
                    source: name.clone(),
                    result: SourceResult::Failed {
                        reason: format!("source '{}' is not configured", name),
                    },
                    duration: Default::default(),
                },
            };
            summary.outcomes.push(outcome);
        }
        self.log_summary(&summary);
        Ok(summary)
    }

    /// Run one source through fetch, validate, dedup and persist
    pub async fn process_source(&self, name: &str, spec: &SourceSpec) -> StorageResult<SourceOutcome> {
        let start = Instant::now();
        let mut stage = ExtractionStage::Idle;
        let mut advance = |next: ExtractionStage| {
            debug!("Source {}: {} -> {}", name, stage, next);
            stage = next;
        };

        advance(ExtractionStage::Fetching);
        let raw = match self.browser.run(&spec.url, &spec.extraction_command).await {
            Ok(raw) => raw,
            Err(e) => {
                advance(ExtractionStage::Failed);
                warn!("Extraction failed for source {}: {}", name, e);
                return Ok(SourceOutcome {
                    source: name.to_string(),
                    result: SourceResult::Failed {
                        reason: e.to_string(),
                    },
                    duration: start.elapsed(),
                });
            }
        };

        advance(ExtractionStage::Validating);
        let candidates = raw.len();
        let valid: Vec<String> = raw.into_iter().filter(|s| is_valid_url(s)).collect();
        let invalid = candidates - valid.len();
        if invalid > 0 {
            debug!("Source {}: dropped {} invalid URLs", name, invalid);
        }

        advance(ExtractionStage::Deduplicating);
        let existing = self.store.existing_urls()?;
        let fresh = filter_new(&valid, &existing, &spec.normalization_params);
        let duplicates = valid.len() - fresh.len();

        advance(ExtractionStage::Persisting);
        let now = (self.clock)();
        let drafts: Vec<RecordDraft> = fresh
            .into_iter()
            .map(|url| RecordDraft::new(name, url, now))
            .collect();
        let added = self.store.append_new(drafts)?;

        advance(ExtractionStage::Idle);
        info!(
            "Source {}: {} candidates, {} invalid, {} duplicates, {} new",
            name,
            candidates,
            invalid,
            duplicates,
            added.len()
        );

        Ok(SourceOutcome {
            source: name.to_string(),
            result: SourceResult::Completed {
                stats: SourceStats {
                    candidates,
                    invalid,
                    duplicates,
                },
                added,
            },
            duration: start.elapsed(),
        })
    }

    fn log_summary(&self, summary: &RunSummary) {
        info!(
            "Extraction run finished: {} sources attempted, {} failed, {} new records",
            summary.attempted(),
            summary.failed().len(),
            summary.total_new()
        );
    }
}
