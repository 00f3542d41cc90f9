//! The seen engine: a single actor that owns the presence index and applies
//! inbound events strictly in arrival order.
//!
//! Queries travel through the same stream as membership and message events,
//! so a query observes the roster and history exactly as they stood when it
//! arrived.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, warn};

use crate::config::Config;
use crate::event::{InboundEvent, MessageKind, Reply, is_channel_name};
use crate::history::{SeenEvent, SeenRecord, SeenStore};
use crate::seen::{QueryResolver, ResponseFormatter, SeenOutcome};
use crate::state::{MembershipChange, PresenceTracker};
use crate::telemetry::spans;

/// Owns a [`PresenceTracker`] and drives history upserts and seen queries.
pub struct SeenEngine {
    presence: PresenceTracker,
    store: Arc<dyn SeenStore>,
    resolver: QueryResolver,
    formatter: ResponseFormatter,
    command: String,
}

impl SeenEngine {
    /// Build an engine from configuration, seeding the bot's own nickname for
    /// every configured network.
    pub fn new(store: Arc<dyn SeenStore>, config: &Config) -> Self {
        let mut engine = Self::with_resolver(
            store,
            QueryResolver::new(config.history.query_timeout()),
            &config.engine.command,
        );
        for network in &config.networks {
            engine
                .presence
                .set_own_nick(&network.name.to_ascii_lowercase(), &network.nickname);
        }
        engine
    }

    pub fn with_resolver(store: Arc<dyn SeenStore>, resolver: QueryResolver, command: &str) -> Self {
        Self {
            presence: PresenceTracker::new(),
            store,
            resolver,
            formatter: ResponseFormatter,
            command: command.to_string(),
        }
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Spawn the engine on its own task.
    ///
    /// Replies are pushed to `replies`. The task ends once every event sender
    /// has been dropped and the store has been flushed.
    pub fn spawn(
        self,
        capacity: usize,
        replies: mpsc::Sender<Reply>,
    ) -> (mpsc::Sender<InboundEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(self.run(rx, replies));
        (tx, handle)
    }

    /// The main actor loop.
    pub async fn run(mut self, mut rx: mpsc::Receiver<InboundEvent>, replies: mpsc::Sender<Reply>) {
        while let Some(event) = rx.recv().await {
            if let Some(reply) = self.handle_event(event).await
                && replies.send(reply).await.is_err()
            {
                warn!("Reply channel closed, dropping reply");
            }
        }

        if let Err(e) = self.store.flush().await {
            error!(error = %e, "Failed to flush seen log on shutdown");
        }
        info!("Seen engine stopped");
    }

    /// Apply one event. Returns the reply to deliver, if any.
    pub async fn handle_event(&mut self, event: InboundEvent) -> Option<Reply> {
        let span = spans::event(event.kind_name(), event.network());
        self.dispatch(event).instrument(span).await
    }

    async fn dispatch(&mut self, event: InboundEvent) -> Option<Reply> {
        match event {
            InboundEvent::Connected { network, nickname } => {
                let network = network.to_ascii_lowercase();
                info!(network = %network, nickname = %nickname, "Connected, resetting rosters");
                self.presence.reset_network(&network);
                self.presence.set_own_nick(&network, &nickname);
                None
            }
            InboundEvent::Membership {
                network,
                nick,
                change,
            } => {
                self.handle_membership(&network.to_ascii_lowercase(), &nick, &change)
                    .await;
                None
            }
            InboundEvent::Names {
                network,
                channel,
                names,
            } => {
                self.presence
                    .apply_names(&network.to_ascii_lowercase(), &channel, &names);
                None
            }
            InboundEvent::Message {
                network,
                channel,
                nick,
                kind,
                text,
            } => {
                if !is_channel_name(&channel) {
                    debug!(nick = %nick, "Ignoring private message");
                    return None;
                }
                let event = match kind {
                    MessageKind::Privmsg => SeenEvent::Message(text),
                    MessageKind::Notice => SeenEvent::Notice(text),
                    MessageKind::Action => SeenEvent::Action(text),
                };
                let record = SeenRecord::new(
                    network.to_ascii_lowercase(),
                    channel,
                    nick,
                    Utc::now().timestamp(),
                    event,
                );
                self.store_record(&record).await;
                None
            }
            InboundEvent::Seen {
                network,
                channel,
                target,
            } => {
                if !is_channel_name(&channel) {
                    debug!(target = %target, "Ignoring private seen query");
                    return None;
                }
                let network = network.to_ascii_lowercase();
                let text = self.answer(&network, &channel, &target).await;
                Some(Reply {
                    network,
                    target: channel,
                    text,
                })
            }
        }
    }

    async fn handle_membership(&mut self, network: &str, nick: &str, change: &MembershipChange) {
        let outcome = self.presence.apply(network, nick, change);
        if outcome.own {
            return;
        }

        let event = match change {
            MembershipChange::Join { .. } => SeenEvent::Join,
            MembershipChange::Part { reason, .. } => SeenEvent::Part(non_empty(reason)),
            MembershipChange::Kick { reason, .. } => SeenEvent::Kick(non_empty(reason)),
            MembershipChange::Quit { reason } => SeenEvent::Quit(non_empty(reason)),
            MembershipChange::NickChange { new_nick } => SeenEvent::NickChange {
                new_nick: new_nick.clone(),
            },
        };

        let now = Utc::now().timestamp();
        for channel in outcome.channels {
            let record = SeenRecord::new(network, channel, nick, now, event.clone());
            self.store_record(&record).await;
        }
    }

    async fn answer(&self, network: &str, channel: &str, target: &str) -> String {
        let target = target.split_whitespace().next().unwrap_or_default();
        let outcome = if target.is_empty() {
            SeenOutcome::Usage {
                command: self.command.clone(),
            }
        } else {
            self.resolver
                .resolve(self.store.as_ref(), &self.presence, network, channel, target)
                .instrument(spans::query(network, channel, target))
                .await
        };
        self.formatter.render(&outcome, Utc::now().timestamp())
    }

    async fn store_record(&self, record: &SeenRecord) {
        if let Err(e) = self.store.upsert(record).await {
            error!(
                network = %record.network,
                channel = %record.channel,
                nick = %record.nick,
                error = %e,
                "Failed to update seen log"
            );
        }
    }
}

fn non_empty(reason: &Option<String>) -> Option<String> {
    reason.as_deref().filter(|r| !r.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::history::{HistoryError, SqliteSeenStore};
    use async_trait::async_trait;
    use std::time::Duration;

    const NET: &str = "freenode";

    async fn engine() -> (SeenEngine, Arc<SqliteSeenStore>) {
        let store = Arc::new(SqliteSeenStore::new(Database::new(":memory:").await.unwrap()));
        let mut config = Config::default();
        config.networks.push(crate::config::NetworkConfig {
            name: "FreeNode".to_string(),
            nickname: "bot".to_string(),
        });
        (SeenEngine::new(store.clone(), &config), store)
    }

    fn membership(nick: &str, change: MembershipChange) -> InboundEvent {
        InboundEvent::Membership {
            network: NET.to_string(),
            nick: nick.to_string(),
            change,
        }
    }

    fn join(nick: &str, channel: &str) -> InboundEvent {
        membership(
            nick,
            MembershipChange::Join {
                channel: channel.to_string(),
            },
        )
    }

    fn seen(channel: &str, target: &str) -> InboundEvent {
        InboundEvent::Seen {
            network: NET.to_string(),
            channel: channel.to_string(),
            target: target.to_string(),
        }
    }

    #[tokio::test]
    async fn test_own_nick_seeded_from_config() {
        let (engine, _) = engine().await;
        assert!(engine.presence().is_own_nick(NET, "BOT"));
    }

    #[tokio::test]
    async fn test_own_events_do_not_touch_history() {
        let (mut engine, store) = engine().await;

        assert!(engine.handle_event(join("bot", "#chan")).await.is_none());
        assert!(engine.presence().is_tracked(NET, "#chan"));
        assert!(store.find_latest(NET, "#chan", "bot").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quit_records_every_channel_present() {
        let (mut engine, store) = engine().await;
        for channel in ["#a", "#b", "#c"] {
            engine.handle_event(join("bot", channel)).await;
        }
        engine.handle_event(join("alice", "#a")).await;
        engine.handle_event(join("alice", "#b")).await;

        engine
            .handle_event(membership(
                "alice",
                MembershipChange::Quit {
                    reason: Some("gone".to_string()),
                },
            ))
            .await;

        for channel in ["#a", "#b"] {
            let record = store.find_latest(NET, channel, "alice").await.unwrap().unwrap();
            assert_eq!(record.event, SeenEvent::Quit(Some("gone".to_string())));
        }
        assert!(store.find_latest(NET, "#c", "alice").await.unwrap().is_none());
        assert!(!engine.presence().is_present(NET, "#a", "alice"));
    }

    #[tokio::test]
    async fn test_empty_reason_is_stored_as_none() {
        let (mut engine, store) = engine().await;
        engine
            .handle_event(membership(
                "alice",
                MembershipChange::Part {
                    channel: "#chan".to_string(),
                    reason: Some(String::new()),
                },
            ))
            .await;

        let record = store.find_latest(NET, "#chan", "alice").await.unwrap().unwrap();
        assert_eq!(record.event, SeenEvent::Part(None));
    }

    #[tokio::test]
    async fn test_private_messages_are_ignored() {
        let (mut engine, store) = engine().await;
        let reply = engine
            .handle_event(InboundEvent::Message {
                network: NET.to_string(),
                channel: "bot".to_string(),
                nick: "alice".to_string(),
                kind: MessageKind::Privmsg,
                text: "psst".to_string(),
            })
            .await;

        assert!(reply.is_none());
        assert!(store.find_latest(NET, "bot", "alice").await.unwrap().is_none());
        assert!(engine.handle_event(seen("alice", "alice")).await.is_none());
    }

    #[tokio::test]
    async fn test_network_is_case_insensitive() {
        let (mut engine, _) = engine().await;
        engine
            .handle_event(InboundEvent::Message {
                network: "FREENODE".to_string(),
                channel: "#chan".to_string(),
                nick: "alice".to_string(),
                kind: MessageKind::Action,
                text: "waves".to_string(),
            })
            .await;

        let reply = engine.handle_event(seen("#chan", "ALICE")).await.unwrap();
        assert_eq!(reply.network, NET);
        assert_eq!(reply.text, "alice was last seen a moment ago saying: * alice waves");
    }

    #[tokio::test]
    async fn test_usage_reply_for_empty_target() {
        let (mut engine, _) = engine().await;
        let reply = engine.handle_event(seen("#chan", "  ")).await.unwrap();
        assert_eq!(reply.target, "#chan");
        assert_eq!(reply.text, "Usage: seen <nickname>");
    }

    #[tokio::test]
    async fn test_connected_resets_rosters() {
        let (mut engine, _) = engine().await;
        engine.handle_event(join("bot", "#chan")).await;
        engine.handle_event(join("alice", "#chan")).await;

        engine
            .handle_event(InboundEvent::Connected {
                network: NET.to_string(),
                nickname: "bot_".to_string(),
            })
            .await;

        assert!(!engine.presence().is_tracked(NET, "#chan"));
        assert!(engine.presence().is_own_nick(NET, "bot_"));
    }

    struct FailingStore;

    #[async_trait]
    impl SeenStore for FailingStore {
        async fn upsert(&self, _record: &SeenRecord) -> Result<(), HistoryError> {
            Err(HistoryError::WriterClosed)
        }

        async fn find_latest(
            &self,
            _network: &str,
            _channel: &str,
            _target: &str,
        ) -> Result<Option<SeenRecord>, HistoryError> {
            Err(HistoryError::WriterClosed)
        }
    }

    #[tokio::test]
    async fn test_storage_faults_do_not_stop_the_stream() {
        let mut engine = SeenEngine::with_resolver(
            Arc::new(FailingStore),
            QueryResolver::new(Duration::from_secs(1)),
            "seen",
        );
        engine.presence.set_own_nick(NET, "bot");
        engine.handle_event(join("bot", "#chan")).await;
        engine.handle_event(join("alice", "#chan")).await;

        assert!(engine.presence().is_present(NET, "#chan", "alice"));
        let reply = engine.handle_event(seen("#chan", "alice")).await.unwrap();
        assert_eq!(reply.text, "Error: A database error occurred.");
    }
}
