//! Presence tracking: who is in which channel right now.
//!
//! The tracker owns one roster per (network, channel) the bot itself is in.
//! The bot's own nick is never a roster member; a roster's existence is what
//! marks the bot as present. A missing roster means "unknown", not "empty".
//!
//! All mutation goes through [`PresenceTracker::apply`] and
//! [`PresenceTracker::apply_names`], in stream order. Lookups never mutate.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// A membership change, applied for one nick on one network.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MembershipChange {
    Join {
        channel: String,
    },
    Part {
        channel: String,
        #[serde(default)]
        reason: Option<String>,
    },
    Kick {
        channel: String,
        #[serde(default)]
        reason: Option<String>,
    },
    Quit {
        #[serde(default)]
        reason: Option<String>,
    },
    #[serde(rename = "nick")]
    NickChange {
        new_nick: String,
    },
}

/// What an applied change touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipOutcome {
    /// The change was about the bot itself.
    pub own: bool,
    /// Channels whose seen record should be updated for the nick.
    pub channels: Vec<String>,
}

impl MembershipOutcome {
    fn own() -> Self {
        Self {
            own: true,
            channels: Vec::new(),
        }
    }

    fn channels(channels: Vec<String>) -> Self {
        Self {
            own: false,
            channels,
        }
    }
}

#[derive(Debug, Clone)]
struct Roster {
    /// Channel name as first seen.
    name: String,
    /// Folded nick -> nick as last seen.
    members: HashMap<String, String>,
}

impl Roster {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: HashMap::new(),
        }
    }
}

type RosterKey = (String, String);

fn fold(s: &str) -> String {
    s.to_ascii_lowercase()
}

fn key(network: &str, channel: &str) -> RosterKey {
    (fold(network), fold(channel))
}

/// Strip membership prefixes (`@`, `+`, `%`, `~`, `&`, ...) from a NAMES entry.
///
/// Everything before the first character that may start a nickname is removed.
pub fn strip_member_prefix(name: &str) -> &str {
    name.trim_start_matches(|c: char| {
        !(c.is_ascii_alphabetic() || matches!(c, '[' | ']' | '\\' | '`' | '_' | '^' | '{' | '|' | '}'))
    })
}

/// The presence index for every network of one bot process.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    own_nicks: HashMap<String, String>,
    rosters: HashMap<RosterKey, Roster>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the bot's own nick on a network.
    pub fn set_own_nick(&mut self, network: &str, nick: &str) {
        self.own_nicks.insert(fold(network), nick.to_string());
    }

    pub fn own_nick(&self, network: &str) -> Option<&str> {
        self.own_nicks.get(&fold(network)).map(String::as_str)
    }

    /// Check whether `nick` is the bot itself on `network`.
    pub fn is_own_nick(&self, network: &str, nick: &str) -> bool {
        self.own_nick(network)
            .is_some_and(|own| own.eq_ignore_ascii_case(nick))
    }

    /// Forget every roster on a network (reconnect).
    pub fn reset_network(&mut self, network: &str) {
        let network = fold(network);
        self.rosters.retain(|(net, _), _| *net != network);
    }

    /// Apply a membership change for `nick`.
    pub fn apply(&mut self, network: &str, nick: &str, change: &MembershipChange) -> MembershipOutcome {
        let own = self.is_own_nick(network, nick);

        match change {
            MembershipChange::Join { channel } => {
                if own {
                    debug!(network = %network, channel = %channel, "Tracking channel");
                    self.rosters
                        .insert(key(network, channel), Roster::new(channel));
                    return MembershipOutcome::own();
                }
                if let Some(roster) = self.rosters.get_mut(&key(network, channel)) {
                    roster.members.insert(fold(nick), nick.to_string());
                }
                MembershipOutcome::channels(vec![channel.clone()])
            }
            MembershipChange::Part { channel, .. } | MembershipChange::Kick { channel, .. } => {
                if own {
                    debug!(network = %network, channel = %channel, "Removing channel");
                    self.rosters.remove(&key(network, channel));
                    return MembershipOutcome::own();
                }
                if let Some(roster) = self.rosters.get_mut(&key(network, channel)) {
                    roster.members.remove(&fold(nick));
                }
                MembershipOutcome::channels(vec![channel.clone()])
            }
            MembershipChange::Quit { .. } => {
                if own {
                    return MembershipOutcome::own();
                }
                let folded = fold(nick);
                let channels = self
                    .rosters_mut(network)
                    .filter_map(|roster| {
                        roster.members.remove(&folded).map(|_| roster.name.clone())
                    })
                    .collect();
                MembershipOutcome::channels(channels)
            }
            MembershipChange::NickChange { new_nick } => {
                if own {
                    debug!(network = %network, old = %nick, new = %new_nick, "Own nick changed");
                    self.set_own_nick(network, new_nick);
                    return MembershipOutcome::own();
                }
                let old = fold(nick);
                let new = fold(new_nick);
                let channels = self
                    .rosters_mut(network)
                    .filter_map(|roster| {
                        roster.members.remove(&old)?;
                        roster.members.insert(new.clone(), new_nick.clone());
                        Some(roster.name.clone())
                    })
                    .collect();
                MembershipOutcome::channels(channels)
            }
        }
    }

    /// Add every nick from a NAMES reply to a channel's roster.
    ///
    /// Entries may hold several space-separated names; membership prefixes are
    /// stripped and the bot's own nick is skipped.
    pub fn apply_names<S: AsRef<str>>(&mut self, network: &str, channel: &str, names: &[S]) {
        let own = self.own_nick(network).map(fold);
        let roster = self
            .rosters
            .entry(key(network, channel))
            .or_insert_with(|| Roster::new(channel));

        for name in names.iter().flat_map(|entry| entry.as_ref().split_whitespace()) {
            let name = strip_member_prefix(name);
            if name.is_empty() {
                continue;
            }
            let folded = fold(name);
            if own.as_deref() == Some(folded.as_str()) {
                continue;
            }
            roster.members.insert(folded, name.to_string());
        }

        debug!(network = %network, channel = %channel, members = roster.members.len(), "Added names to channel");
    }

    /// Case-insensitive presence check. Untracked channels report `false`.
    pub fn is_present(&self, network: &str, channel: &str, nick: &str) -> bool {
        self.rosters
            .get(&key(network, channel))
            .is_some_and(|roster| roster.members.contains_key(&fold(nick)))
    }

    /// Whether the bot is in the channel.
    pub fn is_tracked(&self, network: &str, channel: &str) -> bool {
        self.rosters.contains_key(&key(network, channel))
    }

    /// Sorted snapshot of a roster, or `None` when the channel is untracked.
    pub fn roster(&self, network: &str, channel: &str) -> Option<Vec<String>> {
        self.rosters.get(&key(network, channel)).map(|roster| {
            let mut names: Vec<String> = roster.members.values().cloned().collect();
            names.sort();
            names
        })
    }

    fn rosters_mut(&mut self, network: &str) -> impl Iterator<Item = &mut Roster> {
        let network = fold(network);
        self.rosters
            .iter_mut()
            .filter(move |((net, _), _)| *net == network)
            .map(|(_, roster)| roster)
    }
}
