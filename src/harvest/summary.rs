//! Per-item outcomes and the summary a pass reports when it ends.

use crate::harvest::Pass;
use crate::utils::fmt_duration;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{info, warn};

/// Result of processing one keyword or listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Succeeded {
        key: String,
        /// New listings, or records written.
        added: usize,
        truncated: bool,
    },
    Failed {
        key: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub pass: Pass,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub succeeded: usize,
    pub failed: Vec<FailedItem>,
    /// Keywords whose result count hit the platform cap.
    pub truncated: Vec<String>,
    pub added: usize,
    /// Stopped by shutdown or run budget before every item was attempted.
    pub interrupted: bool,
}

impl RunSummary {
    pub fn new(pass: Pass) -> Self {
        Self {
            pass,
            started_at: Utc::now(),
            finished_at: None,
            succeeded: 0,
            failed: Vec::new(),
            truncated: Vec::new(),
            added: 0,
            interrupted: false,
        }
    }

    pub fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Succeeded {
                key,
                added,
                truncated,
            } => {
                self.succeeded += 1;
                self.added += added;
                if truncated {
                    self.truncated.push(key);
                }
            }
            ItemOutcome::Failed { key, reason } => {
                self.failed.push(FailedItem { key, reason });
            }
        }
    }

    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    pub fn finish(&mut self, interrupted: bool) {
        self.interrupted = interrupted;
        self.finished_at = Some(Utc::now());
    }

    pub fn elapsed(&self) -> Duration {
        self.finished_at
            .unwrap_or_else(Utc::now)
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    pub fn log(&self) {
        info!(
            pass = self.pass.as_str(),
            attempted = self.attempted(),
            succeeded = self.succeeded,
            failed = self.failed.len(),
            added = self.added,
            truncated = self.truncated.len(),
            interrupted = self.interrupted,
            duration = fmt_duration(self.elapsed()),
            "Pass finished"
        );
        if !self.truncated.is_empty() {
            warn!(
                pass = self.pass.as_str(),
                keywords = ?self.truncated,
                "Queries hit the result cap; add their prefixes to truncating_prefixes"
            );
        }
    }
}
