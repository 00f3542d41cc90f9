//! Seen history writer and lookup configuration.

use serde::Deserialize;
use std::time::Duration;

/// History configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Capacity of the bounded writer queue (default: 1024).
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Number of buffered upserts that triggers a flush (default: 64).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Maximum time an upsert waits in the buffer (default: 1000ms).
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// Lookup timeout before a query answers with a database error (default: 5000ms).
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl HistoryConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_batch_size() -> usize {
    64
}

fn default_flush_interval_ms() -> u64 {
    1000
}

fn default_query_timeout_ms() -> u64 {
    5000
}
