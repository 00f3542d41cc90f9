//! Seen log repository.
//!
//! Stores the latest notable event per (network, channel, nick). Writes are
//! single-statement upserts; nothing here ever reads before writing.

use super::DbError;
use sqlx::SqlitePool;

/// A raw `seen_logs` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRow {
    pub time: i64,
    pub network: String,
    pub channel: String,
    pub nick: String,
    pub kind: i64,
    pub message: Option<String>,
}

const UPSERT_SQL: &str = r#"
    INSERT INTO seen_logs (time, network, channel, nick, type, message)
    VALUES (?, ?, ?, ?, ?, ?)
    ON CONFLICT (network, channel, nick) DO UPDATE SET
        time = excluded.time,
        channel = excluded.channel,
        nick = excluded.nick,
        type = excluded.type,
        message = excluded.message
"#;

const FIND_LATEST_SQL: &str = r#"
    SELECT time, network, channel, nick, type, message
    FROM seen_logs
    WHERE network = ?
      AND channel = ? COLLATE NOCASE
      AND (nick = ? COLLATE NOCASE
           OR (type = ? AND message = ? COLLATE NOCASE))
    ORDER BY time DESC, (nick = ? COLLATE NOCASE) DESC
    LIMIT 1
"#;

/// Repository for seen log operations.
pub struct SeenRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SeenRepository<'a> {
    /// Create a new seen log repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the row, replacing every column of an existing row with the same key.
    pub async fn upsert(&self, row: &SeenRow) -> Result<(), DbError> {
        sqlx::query(UPSERT_SQL)
            .bind(row.time)
            .bind(&row.network)
            .bind(&row.channel)
            .bind(&row.nick)
            .bind(row.kind)
            .bind(&row.message)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Upsert all rows in one transaction, in order.
    pub async fn upsert_many(&self, rows: &[SeenRow]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(UPSERT_SQL)
                .bind(row.time)
                .bind(&row.network)
                .bind(&row.channel)
                .bind(&row.nick)
                .bind(row.kind)
                .bind(&row.message)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Find the most recent row in a channel that either belongs to `target`
    /// or records a nick change *to* `target`.
    ///
    /// Comparisons are case-insensitive. When both candidates share a
    /// timestamp the direct nick match wins.
    pub async fn find_latest(
        &self,
        network: &str,
        channel: &str,
        target: &str,
        nick_change_kind: i64,
    ) -> Result<Option<SeenRow>, DbError> {
        let row = sqlx::query_as::<_, (i64, String, String, String, i64, Option<String>)>(
            FIND_LATEST_SQL,
        )
        .bind(network)
        .bind(channel)
        .bind(target)
        .bind(nick_change_kind)
        .bind(target)
        .bind(target)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(time, network, channel, nick, kind, message)| SeenRow {
            time,
            network,
            channel,
            nick,
            kind,
            message,
        }))
    }

    /// Count rows for a network (maintenance and tests).
    pub async fn count(&self, network: &str) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seen_logs WHERE network = ?")
            .bind(network)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
