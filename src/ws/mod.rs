//! WebSocket layer: per-user live event feed.
//!
//! The endpoint at `/ws` is bound to the caller's user id at upgrade time.
//! Clients pick topics (`checkins`, `badges`, `redemptions` or `*`) and
//! receive their own events as soon as the owning transaction commits.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
