//! Check-in settlement: verify a scan, credit points, evaluate badges.

use std::sync::Arc;

use super::badge_engine::{self, AwardedBadge};
use super::clock::Clock;
use super::ledger::{self, LedgerEntry};
use crate::config::RewardsPolicy;
use crate::domain::geo::Coordinates;
use crate::domain::{
    CheckIn, CheckInId, CheckInMethod, DestinationId, EventBus, LedgerReference, RewardsEvent,
    TransactionType, UserId,
};
use crate::error::RewardsError;
use crate::persistence::Store;

/// A scan submitted by a user.
#[derive(Debug, Clone)]
pub struct CheckInRequest {
    /// Scanned or typed destination code.
    pub destination_code: String,
    /// Destination the client believes it is at, if known.
    pub destination_id: Option<DestinationId>,
    /// Reported latitude in degrees.
    pub latitude: f64,
    /// Reported longitude in degrees.
    pub longitude: f64,
    /// How the code was captured.
    pub method: CheckInMethod,
}

/// Outcome of a successful settlement.
#[derive(Debug, Clone)]
pub struct Settlement {
    /// The persisted check-in.
    pub check_in: CheckIn,
    /// Points credited by the check-in itself (base + bonus).
    pub points_earned: i64,
    /// Balance after the settlement, badge bonuses included.
    pub total_points: i64,
    /// Badges newly earned by this settlement.
    pub new_badges: Vec<AwardedBadge>,
}

/// Settles check-ins as single all-or-nothing transactions.
#[derive(Debug, Clone)]
pub struct CheckInService {
    store: Store,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    policy: RewardsPolicy,
}

impl CheckInService {
    /// Creates a new `CheckInService`.
    #[must_use]
    pub fn new(
        store: Store,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
        policy: RewardsPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            event_bus,
            policy,
        }
    }

    /// Verifies and settles one check-in.
    ///
    /// Validation failures (unknown code, code mismatch, out of range,
    /// cooldown) happen before any write. A failure after the first write
    /// drops the transaction, so no check-in, ledger row or badge progress
    /// from this call survives.
    ///
    /// # Errors
    ///
    /// - [`RewardsError::InvalidRequest`] for malformed coordinates or code.
    /// - [`RewardsError::DestinationNotFound`] if no active destination has the code.
    /// - [`RewardsError::InvalidCode`] if the code belongs to another destination.
    /// - [`RewardsError::OutOfRange`] if the user is outside the visit radius.
    /// - [`RewardsError::DuplicateCheckIn`] inside the cooldown window.
    /// - [`RewardsError::AccountInactive`] for non-active users.
    /// - [`RewardsError::PersistenceError`] on storage failure.
    pub async fn settle(
        &self,
        user_id: UserId,
        request: CheckInRequest,
    ) -> Result<Settlement, RewardsError> {
        let position = Coordinates::new(request.latitude, request.longitude)?;
        let code = request.destination_code.trim();
        if code.is_empty() {
            return Err(RewardsError::InvalidRequest(
                "destination_code must not be empty".to_string(),
            ));
        }

        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        tx.lock_user(user_id).await?.ensure_active()?;

        let destination = tx
            .find_destination_by_code(code)
            .await?
            .ok_or_else(|| RewardsError::DestinationNotFound(code.to_string()))?;
        if request
            .destination_id
            .is_some_and(|expected| expected != destination.id)
            || !destination.matches_code(code)
        {
            return Err(RewardsError::InvalidCode(format!(
                "code does not belong to destination {}",
                request.destination_id.unwrap_or(destination.id)
            )));
        }

        let radius_m = destination.effective_radius(self.policy.default_visit_radius_m);
        let distance_m = destination.coordinates()?.distance_to(&position);
        if distance_m > radius_m {
            return Err(RewardsError::OutOfRange {
                distance_m,
                radius_m,
            });
        }

        let last_visit = tx.last_check_in_at(user_id, destination.id).await?;
        if let Some(last) = last_visit {
            let retry_at = last + self.policy.checkin_cooldown;
            if now < retry_at {
                return Err(RewardsError::DuplicateCheckIn { retry_at });
            }
        }
        let bonus_points = if last_visit.is_none() {
            self.policy.first_visit_bonus_points
        } else {
            0
        };

        let check_in = CheckIn {
            id: CheckInId::new(),
            user_id,
            destination_id: destination.id,
            method: request.method,
            user_latitude: position.latitude(),
            user_longitude: position.longitude(),
            distance_m,
            points_earned: destination.points_reward,
            bonus_points,
            is_verified: true,
            checked_in_at: now,
        };
        tx.insert_check_in(&check_in).await?;

        let points_earned = check_in.total_points();
        ledger::append(
            &mut tx,
            LedgerEntry {
                user_id,
                delta: points_earned,
                transaction_type: TransactionType::Earned,
                reference: LedgerReference::CheckIn(check_in.id),
                description: format!("check-in at {}", destination.name),
            },
            now,
        )
        .await?;

        let new_badges = badge_engine::evaluate_in_tx(&mut tx, user_id, now).await?;
        let total_points = tx.lock_user(user_id).await?.total_points;
        tx.commit().await?;

        let _ = self.event_bus.publish(RewardsEvent::CheckInSettled {
            user_id,
            check_in_id: check_in.id,
            destination_id: destination.id,
            points_earned,
            total_points,
            timestamp: now,
        });
        for event in badge_engine::award_events(user_id, &new_badges, now) {
            let _ = self.event_bus.publish(event);
        }

        tracing::info!(
            %user_id,
            destination_id = %destination.id,
            distance_m,
            points_earned,
            total_points,
            new_badges = new_badges.len(),
            "check-in settled"
        );
        Ok(Settlement {
            check_in,
            points_earned,
            total_points,
            new_badges,
        })
    }
}
