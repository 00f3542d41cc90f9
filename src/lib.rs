//! ircseen - presence tracking and last-seen history for IRC bots.
//!
//! The crate reconstructs channel rosters from a stream of already-parsed
//! IRC events, remembers the latest notable action of every nick per channel
//! in SQLite, and answers "seen" queries with a one-line reply.

pub mod config;
pub mod db;
pub mod engine;
pub mod event;
pub mod history;
pub mod seen;
pub mod state;
pub mod telemetry;
