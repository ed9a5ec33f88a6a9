//! Service layer: business flow orchestration.
//!
//! Each service owns handles to the [`crate::persistence::Store`], a
//! [`Clock`] and the [`crate::domain::EventBus`]. Every mutating flow
//! follows the same shape: open a transaction, lock the rows it changes,
//! validate, write, commit, then publish events and log.

pub mod account_service;
pub mod badge_engine;
pub mod cache;
pub mod catalog_service;
pub mod checkin_service;
pub mod clock;
pub mod codes;
pub mod expiry;
pub mod ledger;
pub mod redemption_service;

pub use account_service::{AccountService, BadgeProgress};
pub use badge_engine::{AwardedBadge, BadgeEngine};
pub use catalog_service::{CatalogService, NewDestination, NewReward, RewardUpdate};
pub use checkin_service::{CheckInRequest, CheckInService, Settlement};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codes::{CodeGenerator, RandomCodeGenerator};
pub use expiry::{ExpirySweeper, SweepSummary};
pub use redemption_service::{RedemptionReceipt, RedemptionService};
