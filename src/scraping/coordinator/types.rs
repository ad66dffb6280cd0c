//! Coordinator types: stages, per-source outcomes and run summaries

use std::fmt;
use std::time::Duration;

use crate::types::Record;

/// Where a source currently is in the extraction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStage {
    Idle,
    Fetching,
    Validating,
    Deduplicating,
    Persisting,
    Failed,
}

impl ExtractionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Validating => "validating",
            Self::Deduplicating => "deduplicating",
            Self::Persisting => "persisting",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExtractionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for a source that completed its pass
#[derive(Debug, Clone, Default)]
pub struct SourceStats {
    /// Strings returned by the browser
    pub candidates: usize,
    /// Strings dropped as invalid URLs
    pub invalid: usize,
    /// Valid URLs already known (or repeated within the batch)
    pub duplicates: usize,
}

/// Outcome of one source pass
#[derive(Debug)]
pub enum SourceResult {
    /// Pass completed; `added` may be empty
    Completed { stats: SourceStats, added: Vec<Record> },
    /// The browser failed; nothing was written for this source
    Failed { reason: String },
}

/// Result of processing a single source
#[derive(Debug)]
pub struct SourceOutcome {
    /// Source name
    pub source: String,
    /// What happened
    pub result: SourceResult,
    /// Time spent on the source
    pub duration: Duration,
}

impl SourceOutcome {
    /// Number of records appended for this source
    pub fn added_count(&self) -> usize {
        match &self.result {
            SourceResult::Completed { added, .. } => added.len(),
            SourceResult::Failed { .. } => 0,
        }
    }

    /// Failure reason, if the source failed
    pub fn failure(&self) -> Option<&str> {
        match &self.result {
            SourceResult::Failed { reason } => Some(reason),
            SourceResult::Completed { .. } => None,
        }
    }
}

/// Aggregate of a multi-source run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// One entry per attempted source, in processing order
    pub outcomes: Vec<SourceOutcome>,
}

impl RunSummary {
    /// Sources attempted
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Failed sources with their reasons
    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.failure().map(|reason| (o.source.as_str(), reason)))
            .collect()
    }

    /// Total records appended across all sources
    pub fn total_new(&self) -> usize {
        self.outcomes.iter().map(SourceOutcome::added_count).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sources attempted: {}", self.attempted())?;
        for outcome in &self.outcomes {
            match &outcome.result {
                SourceResult::Completed { stats, added } => writeln!(
                    f,
                    "  {}: {} new ({} candidates, {} invalid, {} duplicates)",
                    outcome.source,
                    added.len(),
                    stats.candidates,
                    stats.invalid,
                    stats.duplicates
                )?,
                SourceResult::Failed { reason } => {
                    writeln!(f, "  {}: FAILED - {}", outcome.source, reason)?
                }
            }
        }
        writeln!(f, "Sources failed: {}", self.failed().len())?;
        write!(f, "New records: {}", self.total_new())
    }
}
