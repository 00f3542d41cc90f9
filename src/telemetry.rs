//! Logging setup and span constructors.

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Install the global tracing subscriber.
///
/// Logs go to stderr; stdout carries replies. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init(format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, debug_span, info_span};

    /// Create a span for one inbound event.
    pub fn event(kind: &str, network: &str) -> Span {
        debug_span!("event", kind = %kind, network = %network)
    }

    /// Create a span for a seen query.
    pub fn query(network: &str, channel: &str, target: &str) -> Span {
        info_span!("seen", network = %network, channel = %channel, target = %target)
    }
}
