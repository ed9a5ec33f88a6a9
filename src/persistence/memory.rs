//! In-process transactional store.
//!
//! A transaction takes the store-wide lock, works on a private copy of the
//! tables and publishes the copy on [`MemoryTx::commit`]. Dropping an
//! uncommitted transaction discards the copy, which gives the same
//! all-or-nothing behavior as a rolled-back SQL transaction.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::destination::normalize_code;
use crate::domain::{
    Badge, BadgeId, CheckIn, Destination, DestinationId, PointsTransaction, Redemption,
    RedemptionId, RedemptionStatus, Reward, RewardId, User, UserActivity, UserBadge, UserId,
};
use crate::error::RewardsError;

/// Write operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// Inserting a check-in row.
    InsertCheckIn,
    /// Appending a ledger row.
    InsertTransaction,
    /// Writing badge progress.
    UpsertUserBadge,
    /// Writing reward counters.
    UpdateReward,
    /// Inserting a redemption.
    InsertRedemption,
    /// Updating a redemption.
    UpdateRedemption,
    /// Committing a transaction.
    Commit,
}

/// All tables of the memory store.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    users: HashMap<UserId, User>,
    destinations: HashMap<DestinationId, Destination>,
    check_ins: Vec<CheckIn>,
    badges: Vec<Badge>,
    user_badges: HashMap<(UserId, BadgeId), UserBadge>,
    rewards: HashMap<RewardId, Reward>,
    redemptions: HashMap<RedemptionId, Redemption>,
    transactions: Vec<PointsTransaction>,
}

type Faults = Arc<std::sync::Mutex<Vec<FaultPoint>>>;

/// Shared handle to the memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: Faults,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next occurrence of `point` fail with a persistence error.
    /// Each injected fault fires once.
    pub fn inject_fault(&self, point: FaultPoint) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.push(point);
        }
    }

    /// Inserts or replaces a user. Registration lives outside this service;
    /// this is the entry point for provisioning and tests.
    pub async fn insert_user(&self, user: User) {
        self.tables.lock().await.users.insert(user.id, user);
    }

    /// Starts a transaction.
    pub async fn begin(&self) -> MemoryTx {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let work = (*guard).clone();
        MemoryTx {
            guard,
            work,
            faults: Arc::clone(&self.faults),
        }
    }

    pub(crate) async fn overdue_redemptions(
        &self,
        now: DateTime<Utc>,
    ) -> Vec<(RedemptionId, UserId)> {
        let tables = self.tables.lock().await;
        let mut overdue: Vec<&Redemption> = tables
            .redemptions
            .values()
            .filter(|r| r.is_overdue(now))
            .collect();
        overdue.sort_by_key(|r| r.valid_until);
        overdue.into_iter().map(|r| (r.id, r.user_id)).collect()
    }

    pub(crate) async fn get_user(&self, user_id: UserId) -> Result<User, RewardsError> {
        self.tables
            .lock()
            .await
            .users
            .get(&user_id)
            .cloned()
            .ok_or(RewardsError::UserNotFound(*user_id.as_uuid()))
    }

    pub(crate) async fn list_destinations(&self) -> Vec<Destination> {
        let tables = self.tables.lock().await;
        let mut list: Vec<Destination> = tables
            .destinations
            .values()
            .filter(|d| d.is_active)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    pub(crate) async fn list_rewards(&self) -> Vec<Reward> {
        let tables = self.tables.lock().await;
        let mut list: Vec<Reward> = tables
            .rewards
            .values()
            .filter(|r| r.is_active)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.points_required.cmp(&b.points_required).then(a.name.cmp(&b.name)));
        list
    }

    pub(crate) async fn list_badges(&self) -> Vec<Badge> {
        self.tables.lock().await.badges.clone()
    }

    pub(crate) async fn ensure_badges(&self, catalog: &[Badge]) -> usize {
        let mut tables = self.tables.lock().await;
        let mut inserted = 0;
        for badge in catalog {
            if tables.badges.iter().any(|b| b.slug == badge.slug) {
                continue;
            }
            tables.badges.push(badge.clone());
            inserted += 1;
        }
        inserted
    }

    pub(crate) async fn user_badges(&self, user_id: UserId) -> Vec<UserBadge> {
        self.tables
            .lock()
            .await
            .user_badges
            .values()
            .filter(|ub| ub.user_id == user_id)
            .cloned()
            .collect()
    }

    pub(crate) async fn user_transactions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Vec<PointsTransaction> {
        self.tables
            .lock()
            .await
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .take(limit)
            .cloned()
            .collect()
    }

    pub(crate) async fn user_check_ins(&self, user_id: UserId, limit: usize) -> Vec<CheckIn> {
        self.tables
            .lock()
            .await
            .check_ins
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .take(limit)
            .cloned()
            .collect()
    }

    pub(crate) async fn user_redemptions(&self, user_id: UserId) -> Vec<Redemption> {
        let tables = self.tables.lock().await;
        let mut list: Vec<Redemption> = tables
            .redemptions
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.redeemed_at.cmp(&a.redeemed_at));
        list
    }

    pub(crate) async fn ledger_sum(&self, user_id: UserId) -> i64 {
        self.tables
            .lock()
            .await
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.points)
            .sum()
    }
}

/// An open memory-store transaction.
#[derive(Debug)]
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
    faults: Faults,
}

impl MemoryTx {
    fn check_fault(&self, point: FaultPoint) -> Result<(), RewardsError> {
        let Ok(mut faults) = self.faults.lock() else {
            return Ok(());
        };
        if let Some(pos) = faults.iter().position(|f| *f == point) {
            faults.remove(pos);
            return Err(RewardsError::PersistenceError(format!(
                "injected fault at {point:?}"
            )));
        }
        Ok(())
    }

    pub(crate) fn commit(mut self) -> Result<(), RewardsError> {
        self.check_fault(FaultPoint::Commit)?;
        *self.guard = std::mem::take(&mut self.work);
        Ok(())
    }

    pub(crate) fn lock_user(&mut self, user_id: UserId) -> Result<User, RewardsError> {
        self.work
            .users
            .get(&user_id)
            .cloned()
            .ok_or(RewardsError::UserNotFound(*user_id.as_uuid()))
    }

    pub(crate) fn update_user(&mut self, user: &User) -> Result<(), RewardsError> {
        let row = self
            .work
            .users
            .get_mut(&user.id)
            .ok_or(RewardsError::UserNotFound(*user.id.as_uuid()))?;
        *row = user.clone();
        Ok(())
    }

    pub(crate) fn find_destination_by_code(&mut self, code: &str) -> Option<Destination> {
        let wanted = normalize_code(code);
        self.work
            .destinations
            .values()
            .find(|d| d.is_active && normalize_code(&d.qr_code) == wanted)
            .cloned()
    }

    pub(crate) fn insert_destination(&mut self, destination: &Destination) {
        self.work
            .destinations
            .insert(destination.id, destination.clone());
    }

    pub(crate) fn get_destination(&mut self, id: DestinationId) -> Option<Destination> {
        self.work.destinations.get(&id).cloned()
    }

    pub(crate) fn last_check_in_at(
        &mut self,
        user_id: UserId,
        destination_id: DestinationId,
    ) -> Option<DateTime<Utc>> {
        self.work
            .check_ins
            .iter()
            .filter(|c| c.user_id == user_id && c.destination_id == destination_id)
            .map(|c| c.checked_in_at)
            .max()
    }

    pub(crate) fn insert_check_in(&mut self, check_in: &CheckIn) -> Result<(), RewardsError> {
        self.check_fault(FaultPoint::InsertCheckIn)?;
        self.work.check_ins.push(check_in.clone());
        Ok(())
    }

    pub(crate) fn insert_transaction(
        &mut self,
        transaction: &PointsTransaction,
    ) -> Result<(), RewardsError> {
        self.check_fault(FaultPoint::InsertTransaction)?;
        self.work.transactions.push(transaction.clone());
        Ok(())
    }

    pub(crate) fn active_badges(&mut self) -> Vec<Badge> {
        self.work
            .badges
            .iter()
            .filter(|b| b.is_active)
            .cloned()
            .collect()
    }

    pub(crate) fn lock_user_badges(&mut self, user_id: UserId) -> Vec<UserBadge> {
        self.work
            .user_badges
            .values()
            .filter(|ub| ub.user_id == user_id)
            .cloned()
            .collect()
    }

    pub(crate) fn upsert_user_badge(&mut self, user_badge: &UserBadge) -> Result<(), RewardsError> {
        self.check_fault(FaultPoint::UpsertUserBadge)?;
        self.work
            .user_badges
            .insert((user_badge.user_id, user_badge.badge_id), user_badge.clone());
        Ok(())
    }

    pub(crate) fn load_activity(
        &mut self,
        user_id: UserId,
        today: NaiveDate,
    ) -> Result<UserActivity, RewardsError> {
        let user = self.lock_user(user_id)?;
        let verified: Vec<&CheckIn> = self
            .work
            .check_ins
            .iter()
            .filter(|c| c.user_id == user_id && c.is_verified)
            .collect();

        let destinations: HashSet<DestinationId> =
            verified.iter().map(|c| c.destination_id).collect();
        let categories: HashSet<&str> = destinations
            .iter()
            .filter_map(|id| self.work.destinations.get(id))
            .map(|d| d.category.as_str())
            .collect();
        let days: BTreeSet<NaiveDate> = verified
            .iter()
            .map(|c| c.checked_in_at.date_naive())
            .collect();

        Ok(UserActivity {
            verified_checkins: i64::try_from(verified.len()).unwrap_or(i64::MAX),
            lifetime_points: user.lifetime_points,
            distinct_categories: i64::try_from(categories.len()).unwrap_or(i64::MAX),
            distinct_destinations: i64::try_from(destinations.len()).unwrap_or(i64::MAX),
            checkin_days: days.into_iter().collect(),
            today,
        })
    }

    pub(crate) fn insert_reward(&mut self, reward: &Reward) {
        self.work.rewards.insert(reward.id, reward.clone());
    }

    pub(crate) fn lock_reward(&mut self, reward_id: RewardId) -> Result<Reward, RewardsError> {
        self.work
            .rewards
            .get(&reward_id)
            .cloned()
            .ok_or(RewardsError::RewardNotFound(*reward_id.as_uuid()))
    }

    pub(crate) fn update_reward(&mut self, reward: &Reward) -> Result<(), RewardsError> {
        self.check_fault(FaultPoint::UpdateReward)?;
        let row = self
            .work
            .rewards
            .get_mut(&reward.id)
            .ok_or(RewardsError::RewardNotFound(*reward.id.as_uuid()))?;
        *row = reward.clone();
        Ok(())
    }

    pub(crate) fn count_live_redemptions(&mut self, user_id: UserId, reward_id: RewardId) -> i64 {
        let count = self
            .work
            .redemptions
            .values()
            .filter(|r| {
                r.user_id == user_id
                    && r.reward_id == reward_id
                    && r.status != RedemptionStatus::Expired
            })
            .count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }

    pub(crate) fn redemption_code_exists(&mut self, code: &str) -> bool {
        self.work
            .redemptions
            .values()
            .any(|r| r.redemption_code == code)
    }

    pub(crate) fn insert_redemption(&mut self, redemption: &Redemption) -> Result<(), RewardsError> {
        self.check_fault(FaultPoint::InsertRedemption)?;
        self.work
            .redemptions
            .insert(redemption.id, redemption.clone());
        Ok(())
    }

    pub(crate) fn lock_redemption(&mut self, id: RedemptionId) -> Result<Redemption, RewardsError> {
        self.work
            .redemptions
            .get(&id)
            .cloned()
            .ok_or_else(|| RewardsError::RedemptionNotFound(id.to_string()))
    }

    pub(crate) fn lock_redemption_by_code(&mut self, code: &str) -> Result<Redemption, RewardsError> {
        let wanted = code.trim();
        self.work
            .redemptions
            .values()
            .find(|r| r.redemption_code.eq_ignore_ascii_case(wanted))
            .cloned()
            .ok_or_else(|| RewardsError::RedemptionNotFound(wanted.to_string()))
    }

    pub(crate) fn update_redemption(&mut self, redemption: &Redemption) -> Result<(), RewardsError> {
        self.check_fault(FaultPoint::UpdateRedemption)?;
        let row = self
            .work
            .redemptions
            .get_mut(&redemption.id)
            .ok_or_else(|| RewardsError::RedemptionNotFound(redemption.id.to_string()))?;
        *row = redemption.clone();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{LedgerReference, TransactionId, TransactionType};

    fn transaction(user_id: UserId, points: i64) -> PointsTransaction {
        PointsTransaction {
            id: TransactionId::new(),
            user_id,
            points,
            balance_after: points,
            transaction_type: TransactionType::Earned,
            reference: LedgerReference::Badge(BadgeId::new()),
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        let user = User::new("ana", Utc::now());
        let user_id = user.id;
        store.insert_user(user).await;

        {
            let mut tx = store.begin().await;
            let Ok(()) = tx.insert_transaction(&transaction(user_id, 10)) else {
                panic!("insert failed");
            };
        }
        assert_eq!(store.ledger_sum(user_id).await, 0);

        let mut tx = store.begin().await;
        let Ok(()) = tx.insert_transaction(&transaction(user_id, 10)) else {
            panic!("insert failed");
        };
        assert!(tx.commit().is_ok());
        assert_eq!(store.ledger_sum(user_id).await, 10);
    }

    #[tokio::test]
    async fn injected_fault_fires_once() {
        let store = MemoryStore::new();
        store.inject_fault(FaultPoint::Commit);

        let tx = store.begin().await;
        assert!(matches!(
            tx.commit(),
            Err(RewardsError::PersistenceError(_))
        ));
        let tx = store.begin().await;
        assert!(tx.commit().is_ok());
    }

    #[tokio::test]
    async fn ensure_badges_is_idempotent_by_slug() {
        let store = MemoryStore::new();
        let catalog = crate::domain::badge::default_catalog();
        assert_eq!(store.ensure_badges(&catalog).await, catalog.len());
        assert_eq!(store.ensure_badges(&catalog).await, 0);
    }
}
