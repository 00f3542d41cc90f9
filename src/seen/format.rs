//! Reply rendering and the relative-time humanizer.

use super::{SeenOutcome, Sighting};

/// Units tried in order; the first with a quotient of at least 1 is used.
const UNITS: [(&str, f64); 6] = [
    ("year", 365.25 * 24.0 * 60.0 * 60.0),
    ("month", 30.0 * 24.0 * 60.0 * 60.0),
    ("week", 7.0 * 24.0 * 60.0 * 60.0),
    ("day", 24.0 * 60.0 * 60.0),
    ("hour", 60.0 * 60.0),
    ("minute", 60.0),
];

const MOMENT_AGO: &str = "a moment ago";

/// Approximate `elapsed` seconds with a single rounded unit.
///
/// Anything under a minute (including negative skew) is "a moment ago".
pub fn humanize_elapsed(elapsed: i64) -> String {
    if elapsed < 60 {
        return MOMENT_AGO.to_string();
    }

    for (unit, secs) in UNITS {
        let count = elapsed as f64 / secs;
        if count >= 1.0 {
            let rounded = count.round() as i64;
            let plural = if rounded > 1 { "s" } else { "" };
            return format!("{rounded} {unit}{plural} ago");
        }
    }

    MOMENT_AGO.to_string()
}

/// Humanize the time between `then` and `now` (both Unix seconds).
pub fn time_ago(then: i64, now: i64) -> String {
    humanize_elapsed(now.saturating_sub(then))
}

/// Renders [`SeenOutcome`]s as reply lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFormatter;

impl ResponseFormatter {
    pub fn render(&self, outcome: &SeenOutcome, now: i64) -> String {
        match outcome {
            SeenOutcome::Usage { command } => format!("Usage: {command} <nickname>"),
            SeenOutcome::NeverSeen { target, channel } => {
                format!("I haven't seen {target} in {channel}!")
            }
            SeenOutcome::DatabaseError => "Error: A database error occurred.".to_string(),
            SeenOutcome::Seen(sighting) => self.render_sighting(sighting, now),
        }
    }

    fn render_sighting(&self, sighting: &Sighting, now: i64) -> String {
        let Sighting {
            name,
            present,
            time,
            body,
        } = sighting;

        if body.is_empty() {
            return if *present {
                format!("{name} is currently in the channel!")
            } else {
                format!("{name} was last seen")
            };
        }

        let ago = time_ago(*time, now);
        if *present {
            format!("{name} is currently in the channel! Was last seen {ago} {body}")
        } else {
            format!("{name} was last seen {ago} {body}")
        }
    }
}
