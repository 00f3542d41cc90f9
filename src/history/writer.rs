//! HistoryWriter: serializes seen log access through one task.
//!
//! Upserts are buffered and committed in batches. Lookups travel through the
//! same queue and flush the buffer first, so a lookup always observes every
//! upsert queued before it, and upserts for a key land in arrival order.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};

use super::{HistoryError, SeenRecord, SeenStore};
use crate::config::HistoryConfig;

enum WriterCommand {
    Upsert(SeenRecord),
    Lookup {
        network: String,
        channel: String,
        target: String,
        reply: oneshot::Sender<Result<Option<SeenRecord>, HistoryError>>,
    },
    Flush(oneshot::Sender<()>),
}

/// Bounded-queue front for a [`SeenStore`].
#[derive(Clone)]
pub struct HistoryWriter {
    sender: Sender<WriterCommand>,
}

impl HistoryWriter {
    /// Spawn the writer task. The task exits, after a final flush, once every
    /// `HistoryWriter` clone has been dropped.
    pub fn spawn(store: Arc<dyn SeenStore>, config: &HistoryConfig) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let batch_size = config.batch_size.max(1);
        let interval = config.flush_interval().max(Duration::from_millis(1));
        let handle = tokio::spawn(Self::run(store, receiver, batch_size, interval));
        (Self { sender }, handle)
    }

    async fn run(
        store: Arc<dyn SeenStore>,
        mut receiver: Receiver<WriterCommand>,
        batch_size: usize,
        interval: Duration,
    ) {
        let mut buffer: Vec<SeenRecord> = Vec::with_capacity(batch_size);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = receiver.recv() => match command {
                    Some(WriterCommand::Upsert(record)) => {
                        buffer.push(record);
                        if buffer.len() >= batch_size {
                            Self::flush_buffer(store.as_ref(), &mut buffer).await;
                        }
                    }
                    Some(WriterCommand::Lookup { network, channel, target, reply }) => {
                        Self::flush_buffer(store.as_ref(), &mut buffer).await;
                        let result = store.find_latest(&network, &channel, &target).await;
                        let _ = reply.send(result);
                    }
                    Some(WriterCommand::Flush(done)) => {
                        Self::flush_buffer(store.as_ref(), &mut buffer).await;
                        let _ = done.send(());
                    }
                    None => {
                        Self::flush_buffer(store.as_ref(), &mut buffer).await;
                        debug!("History writer stopped");
                        break;
                    }
                },
                _ = ticker.tick(), if !buffer.is_empty() => {
                    Self::flush_buffer(store.as_ref(), &mut buffer).await;
                }
            }
        }
    }

    /// Commit the buffer as one batch. If the batch fails, retry record by
    /// record so only the records that still fail are dropped.
    async fn flush_buffer(store: &dyn SeenStore, buffer: &mut Vec<SeenRecord>) {
        if buffer.is_empty() {
            return;
        }

        if let Err(e) = store.upsert_batch(buffer.as_slice()).await {
            warn!(count = buffer.len(), error = %e, "Batch upsert failed, retrying records individually");
            for record in buffer.iter() {
                if let Err(e) = store.upsert(record).await {
                    error!(
                        network = %record.network,
                        channel = %record.channel,
                        nick = %record.nick,
                        error = %e,
                        "Dropping seen record"
                    );
                }
            }
        }

        buffer.clear();
    }
}

#[async_trait]
impl SeenStore for HistoryWriter {
    async fn upsert(&self, record: &SeenRecord) -> Result<(), HistoryError> {
        self.sender
            .send(WriterCommand::Upsert(record.clone()))
            .await
            .map_err(|_| HistoryError::WriterClosed)
    }

    async fn find_latest(
        &self,
        network: &str,
        channel: &str,
        target: &str,
    ) -> Result<Option<SeenRecord>, HistoryError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(WriterCommand::Lookup {
                network: network.to_string(),
                channel: channel.to_string(),
                target: target.to_string(),
                reply,
            })
            .await
            .map_err(|_| HistoryError::WriterClosed)?;
        rx.await.map_err(|_| HistoryError::WriterClosed)?
    }

    async fn flush(&self) -> Result<(), HistoryError> {
        let (done, rx) = oneshot::channel();
        self.sender
            .send(WriterCommand::Flush(done))
            .await
            .map_err(|_| HistoryError::WriterClosed)?;
        rx.await.map_err(|_| HistoryError::WriterClosed)
    }
}
