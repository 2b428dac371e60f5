//! Response code statistics.
//!
//! Counts every completed response by status code for the life of the
//! process. Counters are never decremented or reset.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Thread-safe counters keyed by status code.
#[derive(Debug)]
pub struct StatsCollector {
    start_time: String,
    counts: Mutex<BTreeMap<u16, u64>>,
}

/// Point-in-time copy of the counters, as served by `GET /stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Process start, RFC 3339 UTC
    pub start_time: String,
    /// Status code (decimal string) → occurrences
    pub response_codes: BTreeMap<String, u64>,
}

impl StatsSnapshot {
    /// Sum across all buckets.
    pub fn total(&self) -> u64 {
        self.response_codes.values().sum()
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsCollector {
    /// Start counting now.
    pub fn new() -> Self {
        Self::with_start_time(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    /// Start counting with an explicit start timestamp.
    pub fn with_start_time(start_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            counts: Mutex::new(BTreeMap::new()),
        }
    }

    /// Record one response with `status`.
    pub fn increment(&self, status: u16) {
        // A poisoned lock still holds valid counts; keep counting.
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        *counts.entry(status).or_insert(0) += 1;
    }

    /// Consistent copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        StatsSnapshot {
            start_time: self.start_time.clone(),
            response_codes: counts
                .iter()
                .map(|(code, count)| (code.to_string(), *count))
                .collect(),
        }
    }

    /// Count for a single status code.
    pub fn count(&self, status: u16) -> u64 {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.get(&status).copied().unwrap_or(0)
    }

    pub fn start_time(&self) -> &str {
        &self.start_time
    }
}
