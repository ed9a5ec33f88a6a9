//! # trailpass
//!
//! Check-in settlement, badge and reward redemption service for a gamified
//! travel rewards platform.
//!
//! Users earn points by checking in at destinations (a scanned code plus a
//! reported position within the destination's radius), collect badges as
//! their activity crosses thresholds, and spend points on rewards whose
//! redemption codes are claimed at partner venues. Every balance change is
//! an append-only ledger row; the sum of a user's rows always equals the
//! stored balance.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Feed (ws/)
//!     │
//!     ├── CheckInService / RedemptionService / BadgeEngine (service/)
//!     ├── ExpirySweeper (background)
//!     ├── EventBus (domain/)
//!     │
//!     ├── Points Ledger (service/ledger)
//!     │
//!     └── Store: PostgreSQL | in-memory (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
