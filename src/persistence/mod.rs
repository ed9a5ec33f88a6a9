//! Persistence layer: transactional storage for users, check-ins, badges,
//! rewards, redemptions and the points ledger.
//!
//! [`Store`] selects the backend at startup: [`PostgresStore`] for
//! production, [`MemoryStore`] for local runs and tests. Services open a
//! [`StoreTx`], perform every read and write of one flow through it, and
//! commit once. Dropping a [`StoreTx`] without committing rolls back.

pub mod memory;
pub mod postgres;

use chrono::{DateTime, NaiveDate, Utc};

pub use memory::{FaultPoint, MemoryStore, MemoryTx};
pub use postgres::{PostgresStore, PostgresTx};

use crate::domain::{
    Badge, CheckIn, Destination, DestinationId, PointsTransaction, Redemption, RedemptionId,
    Reward, RewardId, User, UserActivity, UserBadge, UserId,
};
use crate::error::RewardsError;

/// Storage backend selected at startup.
#[derive(Debug, Clone)]
pub enum Store {
    /// In-process tables.
    Memory(MemoryStore),
    /// PostgreSQL via `sqlx`.
    Postgres(PostgresStore),
}

impl Store {
    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] if the backend cannot
    /// start a transaction.
    pub async fn begin(&self) -> Result<StoreTx, RewardsError> {
        match self {
            Self::Memory(store) => Ok(StoreTx::Memory(store.begin().await)),
            Self::Postgres(store) => Ok(StoreTx::Postgres(store.begin().await?)),
        }
    }

    /// Short backend name for logs and the health endpoint.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Inserts any catalog badge whose slug is not stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] on storage failure.
    pub async fn ensure_badges(&self, catalog: &[Badge]) -> Result<usize, RewardsError> {
        match self {
            Self::Memory(store) => Ok(store.ensure_badges(catalog).await),
            Self::Postgres(store) => store.ensure_badges(catalog).await,
        }
    }

    /// Provisions a user. Registration itself happens elsewhere; this is
    /// the hook used by seeding and tests.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] on storage failure.
    pub async fn insert_user(&self, user: User) -> Result<(), RewardsError> {
        match self {
            Self::Memory(store) => {
                store.insert_user(user).await;
                Ok(())
            }
            Self::Postgres(store) => store.insert_user(&user).await,
        }
    }

    pub(crate) async fn overdue_redemptions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(RedemptionId, UserId)>, RewardsError> {
        match self {
            Self::Memory(store) => Ok(store.overdue_redemptions(now).await),
            Self::Postgres(store) => store.overdue_redemptions(now).await,
        }
    }

    pub(crate) async fn get_user(&self, user_id: UserId) -> Result<User, RewardsError> {
        match self {
            Self::Memory(store) => store.get_user(user_id).await,
            Self::Postgres(store) => store.get_user(user_id).await,
        }
    }

    pub(crate) async fn list_destinations(&self) -> Result<Vec<Destination>, RewardsError> {
        match self {
            Self::Memory(store) => Ok(store.list_destinations().await),
            Self::Postgres(store) => store.list_destinations().await,
        }
    }

    pub(crate) async fn list_rewards(&self) -> Result<Vec<Reward>, RewardsError> {
        match self {
            Self::Memory(store) => Ok(store.list_rewards().await),
            Self::Postgres(store) => store.list_rewards().await,
        }
    }

    pub(crate) async fn list_badges(&self) -> Result<Vec<Badge>, RewardsError> {
        match self {
            Self::Memory(store) => Ok(store.list_badges().await),
            Self::Postgres(store) => store.list_badges().await,
        }
    }

    pub(crate) async fn user_badges(&self, user_id: UserId) -> Result<Vec<UserBadge>, RewardsError> {
        match self {
            Self::Memory(store) => Ok(store.user_badges(user_id).await),
            Self::Postgres(store) => store.user_badges(user_id).await,
        }
    }

    pub(crate) async fn user_transactions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<PointsTransaction>, RewardsError> {
        match self {
            Self::Memory(store) => Ok(store.user_transactions(user_id, limit).await),
            Self::Postgres(store) => store.user_transactions(user_id, limit).await,
        }
    }

    pub(crate) async fn user_check_ins(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<CheckIn>, RewardsError> {
        match self {
            Self::Memory(store) => Ok(store.user_check_ins(user_id, limit).await),
            Self::Postgres(store) => store.user_check_ins(user_id, limit).await,
        }
    }

    pub(crate) async fn user_redemptions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Redemption>, RewardsError> {
        match self {
            Self::Memory(store) => Ok(store.user_redemptions(user_id).await),
            Self::Postgres(store) => store.user_redemptions(user_id).await,
        }
    }

    /// Sum of all ledger deltas of a user. Equals the user's balance.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] on storage failure.
    pub async fn ledger_sum(&self, user_id: UserId) -> Result<i64, RewardsError> {
        match self {
            Self::Memory(store) => Ok(store.ledger_sum(user_id).await),
            Self::Postgres(store) => store.ledger_sum(user_id).await,
        }
    }
}

/// An open transaction on either backend.
#[derive(Debug)]
pub enum StoreTx {
    /// Memory-store transaction.
    Memory(MemoryTx),
    /// PostgreSQL transaction.
    Postgres(PostgresTx),
}

impl StoreTx {
    /// Makes every write of this transaction durable and visible.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] if the commit fails; the
    /// transaction is rolled back in that case.
    pub async fn commit(self) -> Result<(), RewardsError> {
        match self {
            Self::Memory(tx) => tx.commit(),
            Self::Postgres(tx) => tx.commit().await,
        }
    }

    pub(crate) async fn lock_user(&mut self, user_id: UserId) -> Result<User, RewardsError> {
        match self {
            Self::Memory(tx) => tx.lock_user(user_id),
            Self::Postgres(tx) => tx.lock_user(user_id).await,
        }
    }

    pub(crate) async fn update_user(&mut self, user: &User) -> Result<(), RewardsError> {
        match self {
            Self::Memory(tx) => tx.update_user(user),
            Self::Postgres(tx) => tx.update_user(user).await,
        }
    }

    pub(crate) async fn find_destination_by_code(
        &mut self,
        code: &str,
    ) -> Result<Option<Destination>, RewardsError> {
        match self {
            Self::Memory(tx) => Ok(tx.find_destination_by_code(code)),
            Self::Postgres(tx) => tx.find_destination_by_code(code).await,
        }
    }

    pub(crate) async fn get_destination(
        &mut self,
        id: DestinationId,
    ) -> Result<Option<Destination>, RewardsError> {
        match self {
            Self::Memory(tx) => Ok(tx.get_destination(id)),
            Self::Postgres(tx) => tx.get_destination(id).await,
        }
    }

    pub(crate) async fn insert_destination(
        &mut self,
        destination: &Destination,
    ) -> Result<(), RewardsError> {
        match self {
            Self::Memory(tx) => {
                tx.insert_destination(destination);
                Ok(())
            }
            Self::Postgres(tx) => tx.insert_destination(destination).await,
        }
    }

    pub(crate) async fn last_check_in_at(
        &mut self,
        user_id: UserId,
        destination_id: DestinationId,
    ) -> Result<Option<DateTime<Utc>>, RewardsError> {
        match self {
            Self::Memory(tx) => Ok(tx.last_check_in_at(user_id, destination_id)),
            Self::Postgres(tx) => tx.last_check_in_at(user_id, destination_id).await,
        }
    }

    pub(crate) async fn insert_check_in(&mut self, check_in: &CheckIn) -> Result<(), RewardsError> {
        match self {
            Self::Memory(tx) => tx.insert_check_in(check_in),
            Self::Postgres(tx) => tx.insert_check_in(check_in).await,
        }
    }

    pub(crate) async fn insert_transaction(
        &mut self,
        transaction: &PointsTransaction,
    ) -> Result<(), RewardsError> {
        match self {
            Self::Memory(tx) => tx.insert_transaction(transaction),
            Self::Postgres(tx) => tx.insert_transaction(transaction).await,
        }
    }

    pub(crate) async fn active_badges(&mut self) -> Result<Vec<Badge>, RewardsError> {
        match self {
            Self::Memory(tx) => Ok(tx.active_badges()),
            Self::Postgres(tx) => tx.active_badges().await,
        }
    }

    pub(crate) async fn lock_user_badges(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<UserBadge>, RewardsError> {
        match self {
            Self::Memory(tx) => Ok(tx.lock_user_badges(user_id)),
            Self::Postgres(tx) => tx.lock_user_badges(user_id).await,
        }
    }

    pub(crate) async fn upsert_user_badge(
        &mut self,
        user_badge: &UserBadge,
    ) -> Result<(), RewardsError> {
        match self {
            Self::Memory(tx) => tx.upsert_user_badge(user_badge),
            Self::Postgres(tx) => tx.upsert_user_badge(user_badge).await,
        }
    }

    pub(crate) async fn load_activity(
        &mut self,
        user_id: UserId,
        today: NaiveDate,
    ) -> Result<UserActivity, RewardsError> {
        match self {
            Self::Memory(tx) => tx.load_activity(user_id, today),
            Self::Postgres(tx) => tx.load_activity(user_id, today).await,
        }
    }

    pub(crate) async fn insert_reward(&mut self, reward: &Reward) -> Result<(), RewardsError> {
        match self {
            Self::Memory(tx) => {
                tx.insert_reward(reward);
                Ok(())
            }
            Self::Postgres(tx) => tx.insert_reward(reward).await,
        }
    }

    pub(crate) async fn lock_reward(&mut self, reward_id: RewardId) -> Result<Reward, RewardsError> {
        match self {
            Self::Memory(tx) => tx.lock_reward(reward_id),
            Self::Postgres(tx) => tx.lock_reward(reward_id).await,
        }
    }

    pub(crate) async fn update_reward(&mut self, reward: &Reward) -> Result<(), RewardsError> {
        match self {
            Self::Memory(tx) => tx.update_reward(reward),
            Self::Postgres(tx) => tx.update_reward(reward).await,
        }
    }

    pub(crate) async fn count_live_redemptions(
        &mut self,
        user_id: UserId,
        reward_id: RewardId,
    ) -> Result<i64, RewardsError> {
        match self {
            Self::Memory(tx) => Ok(tx.count_live_redemptions(user_id, reward_id)),
            Self::Postgres(tx) => tx.count_live_redemptions(user_id, reward_id).await,
        }
    }

    pub(crate) async fn redemption_code_exists(&mut self, code: &str) -> Result<bool, RewardsError> {
        match self {
            Self::Memory(tx) => Ok(tx.redemption_code_exists(code)),
            Self::Postgres(tx) => tx.redemption_code_exists(code).await,
        }
    }

    pub(crate) async fn insert_redemption(
        &mut self,
        redemption: &Redemption,
    ) -> Result<(), RewardsError> {
        match self {
            Self::Memory(tx) => tx.insert_redemption(redemption),
            Self::Postgres(tx) => tx.insert_redemption(redemption).await,
        }
    }

    pub(crate) async fn lock_redemption(
        &mut self,
        id: RedemptionId,
    ) -> Result<Redemption, RewardsError> {
        match self {
            Self::Memory(tx) => tx.lock_redemption(id),
            Self::Postgres(tx) => tx.lock_redemption(id).await,
        }
    }

    pub(crate) async fn lock_redemption_by_code(
        &mut self,
        code: &str,
    ) -> Result<Redemption, RewardsError> {
        match self {
            Self::Memory(tx) => tx.lock_redemption_by_code(code),
            Self::Postgres(tx) => tx.lock_redemption_by_code(code).await,
        }
    }

    pub(crate) async fn update_redemption(
        &mut self,
        redemption: &Redemption,
    ) -> Result<(), RewardsError> {
        match self {
            Self::Memory(tx) => tx.update_redemption(redemption),
            Self::Postgres(tx) => tx.update_redemption(redemption).await,
        }
    }
}
