//! Seen history: the latest notable event per (network, channel, nick).
//!
//! [`SeenStore`] is the storage seam. [`SqliteSeenStore`] writes straight to
//! the database; [`HistoryWriter`] puts any store behind a bounded queue
//! served by a single task.

use async_trait::async_trait;
use thiserror::Error;

use crate::db::DbError;

pub mod sqlite;
pub mod types;
pub mod writer;

pub use sqlite::SqliteSeenStore;
pub use types::{SeenEvent, SeenRecord};
pub use writer::HistoryWriter;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("database error: {0}")]
    Database(#[from] DbError),
    #[error("unknown event type {0} in seen log")]
    UnknownEventType(i64),
    #[error("malformed seen record: {0}")]
    Malformed(String),
    #[error("history writer is closed")]
    WriterClosed,
}

#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Insert or fully replace the record for its (network, channel, nick) key.
    async fn upsert(&self, record: &SeenRecord) -> Result<(), HistoryError>;

    /// Upsert several records in order.
    async fn upsert_batch(&self, records: &[SeenRecord]) -> Result<(), HistoryError> {
        for record in records {
            self.upsert(record).await?;
        }
        Ok(())
    }

    /// Most recent record in a channel for `target`, either under that nick or
    /// as a nick change to it.
    async fn find_latest(
        &self,
        network: &str,
        channel: &str,
        target: &str,
    ) -> Result<Option<SeenRecord>, HistoryError>;

    /// Make every accepted upsert durable.
    async fn flush(&self) -> Result<(), HistoryError> {
        Ok(())
    }
}
