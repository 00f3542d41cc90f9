//! Test bot: a spawned engine backed by a history writer over SQLite.

use anyhow::Context;
use ircseen::config::{Config, NetworkConfig};
use ircseen::db::Database;
use ircseen::engine::SeenEngine;
use ircseen::event::{InboundEvent, MessageKind, Reply};
use ircseen::history::{HistoryWriter, SqliteSeenStore};
use ircseen::state::MembershipChange;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const NETWORK: &str = "freenode";
pub const BOT_NICK: &str = "[muffin]";

pub struct TestBot {
    events: mpsc::Sender<InboundEvent>,
    replies: mpsc::Receiver<Reply>,
    engine: JoinHandle<()>,
    writer: JoinHandle<()>,
    db: Database,
}

#[allow(dead_code)]
impl TestBot {
    /// Spawn a bot over a private in-memory database.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_at(":memory:").await
    }

    /// Spawn a bot over the database at `path`.
    pub async fn spawn_at(path: &str) -> anyhow::Result<Self> {
        let mut config = Config::default();
        config.database.path = path.to_string();
        // Only lookups and shutdown flush the writer in these tests.
        config.history.flush_interval_ms = 60_000;
        config.networks.push(NetworkConfig {
            name: NETWORK.to_string(),
            nickname: BOT_NICK.to_string(),
        });
        Self::spawn_with(config).await
    }

    pub async fn spawn_with(config: Config) -> anyhow::Result<Self> {
        let db = Database::new(&config.database.path).await?;
        let store = Arc::new(SqliteSeenStore::new(db.clone()));
        let (writer, writer_handle) = HistoryWriter::spawn(store, &config.history);

        let (reply_tx, replies) = mpsc::channel(16);
        let engine = SeenEngine::new(Arc::new(writer), &config);
        let (events, engine_handle) = engine.spawn(16, reply_tx);

        Ok(Self {
            events,
            replies,
            engine: engine_handle,
            writer: writer_handle,
            db,
        })
    }

    pub async fn send(&self, event: InboundEvent) -> anyhow::Result<()> {
        self.events
            .send(event)
            .await
            .context("engine stopped accepting events")
    }

    pub async fn membership(&self, nick: &str, change: MembershipChange) -> anyhow::Result<()> {
        self.send(InboundEvent::Membership {
            network: NETWORK.to_string(),
            nick: nick.to_string(),
            change,
        })
        .await
    }

    pub async fn join(&self, nick: &str, channel: &str) -> anyhow::Result<()> {
        self.membership(
            nick,
            MembershipChange::Join {
                channel: channel.to_string(),
            },
        )
        .await
    }

    pub async fn part(&self, nick: &str, channel: &str, reason: Option<&str>) -> anyhow::Result<()> {
        self.membership(
            nick,
            MembershipChange::Part {
                channel: channel.to_string(),
                reason: reason.map(String::from),
            },
        )
        .await
    }

    pub async fn kick(&self, nick: &str, channel: &str, reason: Option<&str>) -> anyhow::Result<()> {
        self.membership(
            nick,
            MembershipChange::Kick {
                channel: channel.to_string(),
                reason: reason.map(String::from),
            },
        )
        .await
    }

    pub async fn quit(&self, nick: &str, reason: Option<&str>) -> anyhow::Result<()> {
        self.membership(
            nick,
            MembershipChange::Quit {
                reason: reason.map(String::from),
            },
        )
        .await
    }

    pub async fn nick(&self, old: &str, new: &str) -> anyhow::Result<()> {
        self.membership(
            old,
            MembershipChange::NickChange {
                new_nick: new.to_string(),
            },
        )
        .await
    }

    pub async fn say(&self, nick: &str, channel: &str, text: &str) -> anyhow::Result<()> {
        self.send(InboundEvent::Message {
            network: NETWORK.to_string(),
            channel: channel.to_string(),
            nick: nick.to_string(),
            kind: MessageKind::Privmsg,
            text: text.to_string(),
        })
        .await
    }

    pub async fn names(&self, channel: &str, names: &[&str]) -> anyhow::Result<()> {
        self.send(InboundEvent::Names {
            network: NETWORK.to_string(),
            channel: channel.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
        })
        .await
    }

    /// Issue a seen query and wait for its reply.
    pub async fn seen(&mut self, channel: &str, target: &str) -> anyhow::Result<String> {
        self.send(InboundEvent::Seen {
            network: NETWORK.to_string(),
            channel: channel.to_string(),
            target: target.to_string(),
        })
        .await?;

        let reply = self
            .recv_timeout(Duration::from_secs(2))
            .await
            .context("no reply to seen query")?;
        anyhow::ensure!(reply.target == channel, "reply sent to {}", reply.target);
        Ok(reply.text)
    }

    pub async fn recv_timeout(&mut self, timeout: Duration) -> anyhow::Result<Reply> {
        tokio::time::timeout(timeout, self.replies.recv())
            .await
            .context("timed out waiting for a reply")?
            .context("reply channel closed")
    }

    /// Close the event stream and wait for the engine and writer to finish.
    /// Returns the database so tests can inspect what was committed.
    pub async fn shutdown(self) -> anyhow::Result<Database> {
        drop(self.events);
        self.engine.await?;
        self.writer.await?;
        Ok(self.db)
    }
}
