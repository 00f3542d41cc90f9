//! "Seen" queries: resolve a target nick against the seen log and the
//! presence index, then render a one-line answer.

mod format;
mod resolver;

pub use format::{ResponseFormatter, humanize_elapsed, time_ago};
pub use resolver::{QueryResolver, describe};

/// How a seen query was answered, before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeenOutcome {
    /// The query named no target.
    Usage { command: String },
    /// No record for the target in the invoking channel.
    NeverSeen { target: String, channel: String },
    Seen(Sighting),
    /// Storage fault, lookup timeout or a corrupt record.
    DatabaseError,
}

/// A resolved record, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sighting {
    /// Canonical display name.
    pub name: String,
    /// `name` is in the invoking channel right now.
    pub present: bool,
    /// Unix seconds of the recorded event.
    pub time: i64,
    /// What the person was doing, e.g. "joining the channel.".
    pub body: String,
}
