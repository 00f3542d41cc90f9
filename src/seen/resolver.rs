//! Resolve a seen query into a [`SeenOutcome`].

use std::time::Duration;
use tracing::{error, warn};

use super::{SeenOutcome, Sighting};
use crate::history::{HistoryError, SeenEvent, SeenRecord, SeenStore};
use crate::state::PresenceTracker;

/// Canonical display name and body text for a record.
///
/// Every event except a nick change is told about the record's own nick.
/// A nick change is told about the old nick when `target` names it, and
/// about the new nick otherwise.
pub fn describe(record: &SeenRecord, target: &str) -> (String, String) {
    let nick = record.nick.clone();
    match &record.event {
        SeenEvent::Join => (nick, "joining the channel.".to_string()),
        SeenEvent::Part(Some(reason)) => (nick, format!("leaving the channel ({reason}).")),
        SeenEvent::Part(None) => (nick, "leaving the channel.".to_string()),
        SeenEvent::Kick(Some(reason)) => {
            (nick, format!("being kicked from the channel ({reason})."))
        }
        SeenEvent::Kick(None) => (nick, "being kicked from the channel.".to_string()),
        SeenEvent::Quit(Some(reason)) => (nick, format!("disconnecting from IRC ({reason}).")),
        SeenEvent::Quit(None) => (nick, "disconnecting from IRC.".to_string()),
        SeenEvent::Message(text) => (nick, format!("saying: {text}")),
        SeenEvent::Notice(text) => (nick, format!("sending a notice: {text}")),
        SeenEvent::Action(text) => {
            let body = format!("saying: * {nick} {text}");
            (nick, body)
        }
        SeenEvent::NickChange { new_nick } => {
            if nick.eq_ignore_ascii_case(target) {
                (nick, format!("changing nick to {new_nick}"))
            } else {
                (new_nick.clone(), format!("changing nick from {nick}"))
            }
        }
    }
}

/// Looks a target up in the seen log and checks its current presence.
#[derive(Debug, Clone)]
pub struct QueryResolver {
    timeout: Duration,
}

impl QueryResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Resolve `target` as seen from `channel`.
    ///
    /// Presence is checked in the invoking channel, whichever channel the
    /// record came from.
    pub async fn resolve(
        &self,
        store: &dyn SeenStore,
        presence: &PresenceTracker,
        network: &str,
        channel: &str,
        target: &str,
    ) -> SeenOutcome {
        let lookup = tokio::time::timeout(self.timeout, store.find_latest(network, channel, target));

        let record = match lookup.await {
            Ok(Ok(Some(record))) => record,
            Ok(Ok(None)) => {
                return SeenOutcome::NeverSeen {
                    target: target.to_string(),
                    channel: channel.to_string(),
                };
            }
            Ok(Err(e @ (HistoryError::UnknownEventType(_) | HistoryError::Malformed(_)))) => {
                warn!(
                    network = %network,
                    channel = %channel,
                    target = %target,
                    error = %e,
                    "Corrupt seen record in database"
                );
                return SeenOutcome::DatabaseError;
            }
            Ok(Err(e)) => {
                error!(network = %network, channel = %channel, target = %target, error = %e, "Seen lookup failed");
                return SeenOutcome::DatabaseError;
            }
            Err(_) => {
                error!(
                    network = %network,
                    channel = %channel,
                    target = %target,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Seen lookup timed out"
                );
                return SeenOutcome::DatabaseError;
            }
        };

        let (name, body) = describe(&record, target);
        let present = presence.is_present(network, channel, &name);

        SeenOutcome::Seen(Sighting {
            name,
            present,
            time: record.time,
            body,
        })
    }
}
