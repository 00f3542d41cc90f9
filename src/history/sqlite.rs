//! SQLite-backed seen store.

use async_trait::async_trait;

use super::{HistoryError, SeenEvent, SeenRecord, SeenStore};
use crate::db::{Database, SeenRow};

/// Writes directly through [`crate::db::SeenRepository`].
#[derive(Clone)]
pub struct SqliteSeenStore {
    db: Database,
}

impl SqliteSeenStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl SeenStore for SqliteSeenStore {
    async fn upsert(&self, record: &SeenRecord) -> Result<(), HistoryError> {
        self.db.seen().upsert(&record.to_row()).await?;
        Ok(())
    }

    async fn upsert_batch(&self, records: &[SeenRecord]) -> Result<(), HistoryError> {
        let rows: Vec<SeenRow> = records.iter().map(SeenRecord::to_row).collect();
        self.db.seen().upsert_many(&rows).await?;
        Ok(())
    }

    async fn find_latest(
        &self,
        network: &str,
        channel: &str,
        target: &str,
    ) -> Result<Option<SeenRecord>, HistoryError> {
        self.db
            .seen()
            .find_latest(network, channel, target, SeenEvent::NICK_CHANGE)
            .await?
            .map(SeenRecord::try_from)
            .transpose()
    }
}
