//! Integration test common infrastructure.
//!
//! Provides a bot harness that drives a spawned seen engine over its event
//! channel and collects the replies it produces.

pub mod bot;

#[allow(unused_imports)]
pub use bot::TestBot;
