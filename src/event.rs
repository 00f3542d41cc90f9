//! Inbound events from the transport adapter and outbound replies.
//!
//! Events arrive already parsed, one at a time, in the order the network
//! delivered them. Over the JSON-lines adapter each event is one object
//! tagged by `"type"`.

use serde::{Deserialize, Serialize};

use crate::state::MembershipChange;

/// Kind of a message-like event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Privmsg,
    Notice,
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// The bot (re)connected to a network under `nickname`.
    Connected { network: String, nickname: String },
    /// Join, part, kick, quit or nick change of `nick`.
    Membership {
        network: String,
        nick: String,
        change: MembershipChange,
    },
    /// A NAMES reply for a channel.
    Names {
        network: String,
        channel: String,
        names: Vec<String>,
    },
    /// PRIVMSG, NOTICE or CTCP ACTION sent by `nick` to `channel`.
    Message {
        network: String,
        channel: String,
        nick: String,
        #[serde(default)]
        kind: MessageKind,
        text: String,
    },
    /// A seen command issued in `channel`, with the target already extracted.
    Seen {
        network: String,
        channel: String,
        #[serde(default)]
        target: String,
    },
}

impl InboundEvent {
    pub fn network(&self) -> &str {
        match self {
            Self::Connected { network, .. }
            | Self::Membership { network, .. }
            | Self::Names { network, .. }
            | Self::Message { network, .. }
            | Self::Seen { network, .. } => network,
        }
    }

    /// Short name for logs and spans.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Membership { change, .. } => match change {
                MembershipChange::Join { .. } => "join",
                MembershipChange::Part { .. } => "part",
                MembershipChange::Kick { .. } => "kick",
                MembershipChange::Quit { .. } => "quit",
                MembershipChange::NickChange { .. } => "nick",
            },
            Self::Names { .. } => "names",
            Self::Message { kind, .. } => match kind {
                MessageKind::Privmsg => "privmsg",
                MessageKind::Notice => "notice",
                MessageKind::Action => "action",
            },
            Self::Seen { .. } => "seen",
        }
    }
}

/// A line to deliver to `target` on `network`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub network: String,
    pub target: String,
    pub text: String,
}

/// Check if a target is a channel (starts with #, &, + or !).
pub fn is_channel_name(name: &str) -> bool {
    matches!(name.chars().next(), Some('#' | '&' | '+' | '!'))
}
