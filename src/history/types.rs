//! Type definitions for the seen log.

use super::HistoryError;
use crate::db::SeenRow;

/// The notable event remembered for a nick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeenEvent {
    Join,
    /// Optional part reason.
    Part(Option<String>),
    /// Optional kick comment.
    Kick(Option<String>),
    /// Optional quit message.
    Quit(Option<String>),
    /// The record's nick is the old name.
    NickChange { new_nick: String },
    Message(String),
    Notice(String),
    Action(String),
}

impl SeenEvent {
    pub const JOIN: i64 = 0;
    pub const PART: i64 = 1;
    pub const KICK: i64 = 2;
    pub const QUIT: i64 = 3;
    pub const NICK_CHANGE: i64 = 4;
    pub const MESSAGE: i64 = 5;
    pub const NOTICE: i64 = 6;
    pub const ACTION: i64 = 7;

    /// Type code stored in the `type` column.
    pub fn kind(&self) -> i64 {
        match self {
            Self::Join => Self::JOIN,
            Self::Part(_) => Self::PART,
            Self::Kick(_) => Self::KICK,
            Self::Quit(_) => Self::QUIT,
            Self::NickChange { .. } => Self::NICK_CHANGE,
            Self::Message(_) => Self::MESSAGE,
            Self::Notice(_) => Self::NOTICE,
            Self::Action(_) => Self::ACTION,
        }
    }

    /// Value stored in the `message` column.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Join => None,
            Self::Part(reason) | Self::Kick(reason) | Self::Quit(reason) => reason.as_deref(),
            Self::NickChange { new_nick } => Some(new_nick),
            Self::Message(text) | Self::Notice(text) | Self::Action(text) => Some(text),
        }
    }

    /// Rebuild an event from its stored columns.
    ///
    /// Empty reasons decode as `None`.
    pub fn from_parts(kind: i64, message: Option<String>) -> Result<Self, HistoryError> {
        let reason = message.clone().filter(|m| !m.is_empty());
        let text = message.unwrap_or_default();
        Ok(match kind {
            Self::JOIN => Self::Join,
            Self::PART => Self::Part(reason),
            Self::KICK => Self::Kick(reason),
            Self::QUIT => Self::Quit(reason),
            Self::NICK_CHANGE => match reason {
                Some(new_nick) => Self::NickChange { new_nick },
                None => {
                    return Err(HistoryError::Malformed(
                        "nick change without a new nick".to_string(),
                    ));
                }
            },
            Self::MESSAGE => Self::Message(text),
            Self::NOTICE => Self::Notice(text),
            Self::ACTION => Self::Action(text),
            other => return Err(HistoryError::UnknownEventType(other)),
        })
    }
}

/// One row of the seen log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRecord {
    pub network: String,
    pub channel: String,
    pub nick: String,
    /// Unix seconds.
    pub time: i64,
    pub event: SeenEvent,
}

impl SeenRecord {
    pub fn new(
        network: impl Into<String>,
        channel: impl Into<String>,
        nick: impl Into<String>,
        time: i64,
        event: SeenEvent,
    ) -> Self {
        Self {
            network: network.into(),
            channel: channel.into(),
            nick: nick.into(),
            time,
            event,
        }
    }

    pub fn to_row(&self) -> SeenRow {
        SeenRow {
            time: self.time,
            network: self.network.clone(),
            channel: self.channel.clone(),
            nick: self.nick.clone(),
            kind: self.event.kind(),
            message: self.event.message().map(String::from),
        }
    }
}

impl TryFrom<SeenRow> for SeenRecord {
    type Error = HistoryError;

    fn try_from(row: SeenRow) -> Result<Self, Self::Error> {
        let event = SeenEvent::from_parts(row.kind, row.message)?;
        Ok(Self {
            network: row.network,
            channel: row.channel,
            nick: row.nick,
            time: row.time,
            event,
        })
    }
}
