//! Domain layer: entities, pure rules and the event system.
//!
//! Nothing in here performs I/O. Entities carry the invariants that can be
//! checked locally (stock bounds, redemption transitions, badge monotonicity);
//! cross-entity consistency is the job of the service layer.

pub mod badge;
pub mod checkin;
pub mod destination;
pub mod event;
pub mod event_bus;
pub mod geo;
pub mod ids;
pub mod ledger;
pub mod redemption;
pub mod reward;
pub mod user;

pub use badge::{Badge, RequirementType, UserActivity, UserBadge};
pub use checkin::{CheckIn, CheckInMethod};
pub use destination::Destination;
pub use event::{EventTopic, RewardsEvent};
pub use event_bus::EventBus;
pub use ids::{BadgeId, CheckInId, DestinationId, RedemptionId, RewardId, TransactionId, UserId};
pub use ledger::{LedgerReference, PointsTransaction, TransactionType};
pub use redemption::{Redemption, RedemptionAction, RedemptionStatus};
pub use reward::Reward;
pub use user::{User, UserStatus};
