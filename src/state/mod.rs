//! State management module.
//!
//! Contains the volatile presence index rebuilt from the event stream.

mod presence;

pub use presence::{MembershipChange, MembershipOutcome, PresenceTracker, strip_member_prefix};
