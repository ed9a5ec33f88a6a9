//! PostgreSQL implementation of the persistence layer.
//!
//! Every flow runs inside one database transaction. Contended rows (users,
//! rewards, redemptions) are locked with `SELECT ... FOR UPDATE` so that
//! concurrent mutations of the same balance or stock counter serialize.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};

use crate::domain::{
    Badge, BadgeId, CheckIn, CheckInId, Destination, DestinationId, LedgerReference,
    PointsTransaction, Redemption, RedemptionId, Reward, RewardId, TransactionId, User,
    UserActivity, UserBadge, UserId,
};
use crate::error::{RewardsError, db_err};

const USER_COLUMNS: &str =
    "id, display_name, total_points, lifetime_points, level, status, created_at";
const DESTINATION_COLUMNS: &str = "id, name, category, latitude, longitude, visit_radius_m, \
     points_reward, qr_code, is_active, created_at";
const CHECK_IN_COLUMNS: &str = "id, user_id, destination_id, checkin_method, user_latitude, \
     user_longitude, distance_from_destination, points_earned, bonus_points, is_verified, \
     checked_in_at";
const BADGE_COLUMNS: &str = "id, slug, name, description, requirement_type, requirement_value, \
     points_reward, rarity, is_active, is_hidden";
const USER_BADGE_COLUMNS: &str = "user_id, badge_id, progress, is_earned, earned_at, \
     points_awarded, is_favorited, is_displayed, updated_at";
const REWARD_COLUMNS: &str = "id, name, description, destination_id, points_required, \
     stock_quantity, stock_unlimited, max_redemptions_per_user, valid_from, valid_until, \
     redemption_period_days, total_redeemed, is_active, created_at";
const REDEMPTION_COLUMNS: &str = "id, user_id, reward_id, destination_id, points_spent, \
     redemption_code, status, valid_until, redeemed_at, used_at, used_location, verified_by, \
     updated_at";
/// Every mutable redemption column. A change moves the reward and its
/// destination together.
const UPDATE_REDEMPTION_SQL: &str = "UPDATE user_reward_redemptions SET reward_id = $2, \
     destination_id = $3, points_spent = $4, status = $5, valid_until = $6, used_at = $7, \
     used_location = $8, verified_by = $9, updated_at = $10 WHERE id = $1";
const TRANSACTION_COLUMNS: &str = "id, user_id, points, balance_after, transaction_type, \
     reference_type, reference_id, description, created_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), RewardsError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RewardsError::PersistenceError(e.to_string()))
    }

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] if no connection is available.
    pub async fn begin(&self) -> Result<PostgresTx, RewardsError> {
        let tx = self.pool.begin().await.map_err(db_err)?;
        Ok(PostgresTx { tx })
    }

    /// Inserts a user unless one with the same id exists.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] on storage failure.
    pub async fn insert_user(&self, user: &User) -> Result<(), RewardsError> {
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO NOTHING"
        ))
        .bind(user.id.as_uuid())
        .bind(&user.display_name)
        .bind(user.total_points)
        .bind(user.lifetime_points)
        .bind(user.level)
        .bind(user.status.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub(crate) async fn overdue_redemptions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(RedemptionId, UserId)>, RewardsError> {
        let rows = sqlx::query_as::<_, (uuid::Uuid, uuid::Uuid)>(
            "SELECT id, user_id FROM user_reward_redemptions \
             WHERE status IN ('pending', 'active') AND valid_until < $1 \
             ORDER BY valid_until ASC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows
            .into_iter()
            .map(|(id, user_id)| (RedemptionId::from_uuid(id), UserId::from_uuid(user_id)))
            .collect())
    }

    pub(crate) async fn get_user(&self, user_id: UserId) -> Result<User, RewardsError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(RewardsError::UserNotFound(*user_id.as_uuid()))?;
        user_from_row(&row)
    }

    pub(crate) async fn list_destinations(&self) -> Result<Vec<Destination>, RewardsError> {
        let rows = sqlx::query(&format!(
            "SELECT {DESTINATION_COLUMNS} FROM destinations WHERE is_active ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(destination_from_row).collect()
    }

    pub(crate) async fn list_rewards(&self) -> Result<Vec<Reward>, RewardsError> {
        let rows = sqlx::query(&format!(
            "SELECT {REWARD_COLUMNS} FROM rewards WHERE is_active ORDER BY points_required, name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(reward_from_row).collect()
    }

    pub(crate) async fn list_badges(&self) -> Result<Vec<Badge>, RewardsError> {
        let rows = sqlx::query(&format!("SELECT {BADGE_COLUMNS} FROM badges ORDER BY slug"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(badge_from_row).collect()
    }

    pub(crate) async fn ensure_badges(&self, catalog: &[Badge]) -> Result<usize, RewardsError> {
        let mut inserted = 0;
        for badge in catalog {
            let result = sqlx::query(
                "INSERT INTO badges (id, slug, name, description, requirement_type, \
                 requirement_value, points_reward, rarity, is_active, is_hidden) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                 ON CONFLICT (slug) DO NOTHING",
            )
            .bind(badge.id.as_uuid())
            .bind(&badge.slug)
            .bind(&badge.name)
            .bind(&badge.description)
            .bind(badge.requirement_type.as_str())
            .bind(badge.requirement_value)
            .bind(badge.points_reward)
            .bind(badge.rarity.as_str())
            .bind(badge.is_active)
            .bind(badge.is_hidden)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
            if result.rows_affected() > 0 {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    pub(crate) async fn user_badges(&self, user_id: UserId) -> Result<Vec<UserBadge>, RewardsError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_BADGE_COLUMNS} FROM user_badges WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(user_badge_from_row).collect()
    }

    pub(crate) async fn user_transactions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<PointsTransaction>, RewardsError> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM points_transactions \
             WHERE user_id = $1 ORDER BY seq DESC LIMIT $2"
        ))
        .bind(user_id.as_uuid())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(transaction_from_row).collect()
    }

    pub(crate) async fn user_check_ins(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<CheckIn>, RewardsError> {
        let rows = sqlx::query(&format!(
            "SELECT {CHECK_IN_COLUMNS} FROM check_ins \
             WHERE user_id = $1 ORDER BY checked_in_at DESC LIMIT $2"
        ))
        .bind(user_id.as_uuid())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(check_in_from_row).collect()
    }

    pub(crate) async fn user_redemptions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Redemption>, RewardsError> {
        let rows = sqlx::query(&format!(
            "SELECT {REDEMPTION_COLUMNS} FROM user_reward_redemptions \
             WHERE user_id = $1 ORDER BY redeemed_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(redemption_from_row).collect()
    }

    pub(crate) async fn ledger_sum(&self, user_id: UserId) -> Result<i64, RewardsError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(points), 0)::BIGINT FROM points_transactions WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }
}

/// An open PostgreSQL transaction. Dropping it without commit rolls back.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

impl fmt::Debug for PostgresTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresTx").finish_non_exhaustive()
    }
}

impl PostgresTx {
    pub(crate) async fn commit(self) -> Result<(), RewardsError> {
        self.tx.commit().await.map_err(db_err)
    }

    pub(crate) async fn lock_user(&mut self, user_id: UserId) -> Result<User, RewardsError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?
        .ok_or(RewardsError::UserNotFound(*user_id.as_uuid()))?;
        user_from_row(&row)
    }

    pub(crate) async fn update_user(&mut self, user: &User) -> Result<(), RewardsError> {
        sqlx::query(
            "UPDATE users SET total_points = $2, lifetime_points = $3, level = $4 WHERE id = $1",
        )
        .bind(user.id.as_uuid())
        .bind(user.total_points)
        .bind(user.lifetime_points)
        .bind(user.level)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub(crate) async fn find_destination_by_code(
        &mut self,
        code: &str,
    ) -> Result<Option<Destination>, RewardsError> {
        let row = sqlx::query(&format!(
            "SELECT {DESTINATION_COLUMNS} FROM destinations \
             WHERE upper(qr_code) = upper(btrim($1)) AND is_active"
        ))
        .bind(code)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;
        row.as_ref().map(destination_from_row).transpose()
    }

    pub(crate) async fn get_destination(
        &mut self,
        id: DestinationId,
    ) -> Result<Option<Destination>, RewardsError> {
        let row = sqlx::query(&format!(
            "SELECT {DESTINATION_COLUMNS} FROM destinations WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;
        row.as_ref().map(destination_from_row).transpose()
    }

    pub(crate) async fn insert_destination(
        &mut self,
        destination: &Destination,
    ) -> Result<(), RewardsError> {
        sqlx::query(
            "INSERT INTO destinations (id, name, category, latitude, longitude, visit_radius_m, \
             points_reward, qr_code, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(destination.id.as_uuid())
        .bind(&destination.name)
        .bind(&destination.category)
        .bind(destination.latitude)
        .bind(destination.longitude)
        .bind(destination.visit_radius_m)
        .bind(destination.points_reward)
        .bind(&destination.qr_code)
        .bind(destination.is_active)
        .bind(destination.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub(crate) async fn last_check_in_at(
        &mut self,
        user_id: UserId,
        destination_id: DestinationId,
    ) -> Result<Option<DateTime<Utc>>, RewardsError> {
        sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT max(checked_in_at) FROM check_ins WHERE user_id = $1 AND destination_id = $2",
        )
        .bind(user_id.as_uuid())
        .bind(destination_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err)
    }

    pub(crate) async fn insert_check_in(&mut self, check_in: &CheckIn) -> Result<(), RewardsError> {
        sqlx::query(&format!(
            "INSERT INTO check_ins ({CHECK_IN_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(check_in.id.as_uuid())
        .bind(check_in.user_id.as_uuid())
        .bind(check_in.destination_id.as_uuid())
        .bind(check_in.method.as_str())
        .bind(check_in.user_latitude)
        .bind(check_in.user_longitude)
        .bind(check_in.distance_m)
        .bind(check_in.points_earned)
        .bind(check_in.bonus_points)
        .bind(check_in.is_verified)
        .bind(check_in.checked_in_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub(crate) async fn insert_transaction(
        &mut self,
        transaction: &PointsTransaction,
    ) -> Result<(), RewardsError> {
        sqlx::query(&format!(
            "INSERT INTO points_transactions ({TRANSACTION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(transaction.id.as_uuid())
        .bind(transaction.user_id.as_uuid())
        .bind(transaction.points)
        .bind(transaction.balance_after)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.reference.kind())
        .bind(transaction.reference.id())
        .bind(&transaction.description)
        .bind(transaction.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub(crate) async fn active_badges(&mut self) -> Result<Vec<Badge>, RewardsError> {
        let rows = sqlx::query(&format!(
            "SELECT {BADGE_COLUMNS} FROM badges WHERE is_active ORDER BY slug"
        ))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err)?;
        rows.iter().map(badge_from_row).collect()
    }

    pub(crate) async fn lock_user_badges(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<UserBadge>, RewardsError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_BADGE_COLUMNS} FROM user_badges WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err)?;
        rows.iter().map(user_badge_from_row).collect()
    }

    pub(crate) async fn upsert_user_badge(
        &mut self,
        user_badge: &UserBadge,
    ) -> Result<(), RewardsError> {
        // `is_earned`, `earned_at` and `points_awarded` never regress once set.
        sqlx::query(&format!(
            "INSERT INTO user_badges ({USER_BADGE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (user_id, badge_id) DO UPDATE SET \
               progress = EXCLUDED.progress, \
               is_earned = user_badges.is_earned OR EXCLUDED.is_earned, \
               earned_at = COALESCE(user_badges.earned_at, EXCLUDED.earned_at), \
               points_awarded = CASE WHEN user_badges.is_earned \
                 THEN user_badges.points_awarded ELSE EXCLUDED.points_awarded END, \
               updated_at = EXCLUDED.updated_at"
        ))
        .bind(user_badge.user_id.as_uuid())
        .bind(user_badge.badge_id.as_uuid())
        .bind(user_badge.progress)
        .bind(user_badge.is_earned)
        .bind(user_badge.earned_at)
        .bind(user_badge.points_awarded)
        .bind(user_badge.is_favorited)
        .bind(user_badge.is_displayed)
        .bind(user_badge.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub(crate) async fn load_activity(
        &mut self,
        user_id: UserId,
        today: NaiveDate,
    ) -> Result<UserActivity, RewardsError> {
        let user = self.lock_user(user_id).await?;
        let counts = sqlx::query(
            "SELECT count(*)::BIGINT AS checkins, \
                    count(DISTINCT c.destination_id)::BIGINT AS destinations, \
                    count(DISTINCT d.category)::BIGINT AS categories \
             FROM check_ins c JOIN destinations d ON d.id = c.destination_id \
             WHERE c.user_id = $1 AND c.is_verified",
        )
        .bind(user_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err)?;

        let days = sqlx::query_scalar::<_, NaiveDate>(
            "SELECT DISTINCT (checked_in_at AT TIME ZONE 'UTC')::DATE AS day \
             FROM check_ins WHERE user_id = $1 AND is_verified ORDER BY day",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(UserActivity {
            verified_checkins: counts.try_get("checkins").map_err(db_err)?,
            lifetime_points: user.lifetime_points,
            distinct_categories: counts.try_get("categories").map_err(db_err)?,
            distinct_destinations: counts.try_get("destinations").map_err(db_err)?,
            checkin_days: days,
            today,
        })
    }

    pub(crate) async fn insert_reward(&mut self, reward: &Reward) -> Result<(), RewardsError> {
        sqlx::query(&format!(
            "INSERT INTO rewards ({REWARD_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        ))
        .bind(reward.id.as_uuid())
        .bind(&reward.name)
        .bind(&reward.description)
        .bind(reward.destination_id.map(uuid::Uuid::from))
        .bind(reward.points_required)
        .bind(reward.stock_quantity)
        .bind(reward.stock_unlimited)
        .bind(reward.max_redemptions_per_user)
        .bind(reward.valid_from)
        .bind(reward.valid_until)
        .bind(reward.redemption_period_days)
        .bind(reward.total_redeemed)
        .bind(reward.is_active)
        .bind(reward.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub(crate) async fn lock_reward(&mut self, reward_id: RewardId) -> Result<Reward, RewardsError> {
        let row = sqlx::query(&format!(
            "SELECT {REWARD_COLUMNS} FROM rewards WHERE id = $1 FOR UPDATE"
        ))
        .bind(reward_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?
        .ok_or(RewardsError::RewardNotFound(*reward_id.as_uuid()))?;
        reward_from_row(&row)
    }

    pub(crate) async fn update_reward(&mut self, reward: &Reward) -> Result<(), RewardsError> {
        sqlx::query(
            "UPDATE rewards SET stock_quantity = $2, total_redeemed = $3, is_active = $4, \
             valid_from = $5, valid_until = $6 WHERE id = $1",
        )
        .bind(reward.id.as_uuid())
        .bind(reward.stock_quantity)
        .bind(reward.total_redeemed)
        .bind(reward.is_active)
        .bind(reward.valid_from)
        .bind(reward.valid_until)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub(crate) async fn count_live_redemptions(
        &mut self,
        user_id: UserId,
        reward_id: RewardId,
    ) -> Result<i64, RewardsError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT count(*)::BIGINT FROM user_reward_redemptions \
             WHERE user_id = $1 AND reward_id = $2 AND status <> 'expired'",
        )
        .bind(user_id.as_uuid())
        .bind(reward_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err)
    }

    pub(crate) async fn redemption_code_exists(&mut self, code: &str) -> Result<bool, RewardsError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_reward_redemptions WHERE redemption_code = $1)",
        )
        .bind(code)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err)
    }

    pub(crate) async fn insert_redemption(
        &mut self,
        redemption: &Redemption,
    ) -> Result<(), RewardsError> {
        sqlx::query(&format!(
            "INSERT INTO user_reward_redemptions ({REDEMPTION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(redemption.id.as_uuid())
        .bind(redemption.user_id.as_uuid())
        .bind(redemption.reward_id.as_uuid())
        .bind(redemption.destination_id.map(uuid::Uuid::from))
        .bind(redemption.points_spent)
        .bind(&redemption.redemption_code)
        .bind(redemption.status.as_str())
        .bind(redemption.valid_until)
        .bind(redemption.redeemed_at)
        .bind(redemption.used_at)
        .bind(&redemption.used_location)
        .bind(redemption.verified_by.map(uuid::Uuid::from))
        .bind(redemption.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub(crate) async fn lock_redemption(
        &mut self,
        id: RedemptionId,
    ) -> Result<Redemption, RewardsError> {
        let row = sqlx::query(&format!(
            "SELECT {REDEMPTION_COLUMNS} FROM user_reward_redemptions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| RewardsError::RedemptionNotFound(id.to_string()))?;
        redemption_from_row(&row)
    }

    pub(crate) async fn lock_redemption_by_code(
        &mut self,
        code: &str,
    ) -> Result<Redemption, RewardsError> {
        let wanted = code.trim();
        let row = sqlx::query(&format!(
            "SELECT {REDEMPTION_COLUMNS} FROM user_reward_redemptions \
             WHERE upper(redemption_code) = upper($1) FOR UPDATE"
        ))
        .bind(wanted)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| RewardsError::RedemptionNotFound(wanted.to_string()))?;
        redemption_from_row(&row)
    }

    pub(crate) async fn update_redemption(
        &mut self,
        redemption: &Redemption,
    ) -> Result<(), RewardsError> {
        sqlx::query(UPDATE_REDEMPTION_SQL)
            .bind(redemption.id.as_uuid())
            .bind(redemption.reward_id.as_uuid())
            .bind(redemption.destination_id.map(uuid::Uuid::from))
            .bind(redemption.points_spent)
            .bind(redemption.status.as_str())
            .bind(redemption.valid_until)
            .bind(redemption.used_at)
            .bind(&redemption.used_location)
            .bind(redemption.verified_by.map(uuid::Uuid::from))
            .bind(redemption.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

// ── Row Mapping ─────────────────────────────────────────────────────────

fn user_from_row(row: &PgRow) -> Result<User, RewardsError> {
    let status: String = row.try_get("status").map_err(db_err)?;
    Ok(User {
        id: UserId::from_uuid(row.try_get("id").map_err(db_err)?),
        display_name: row.try_get("display_name").map_err(db_err)?,
        total_points: row.try_get("total_points").map_err(db_err)?,
        lifetime_points: row.try_get("lifetime_points").map_err(db_err)?,
        level: row.try_get("level").map_err(db_err)?,
        status: status.parse()?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn destination_from_row(row: &PgRow) -> Result<Destination, RewardsError> {
    Ok(Destination {
        id: DestinationId::from_uuid(row.try_get("id").map_err(db_err)?),
        name: row.try_get("name").map_err(db_err)?,
        category: row.try_get("category").map_err(db_err)?,
        latitude: row.try_get("latitude").map_err(db_err)?,
        longitude: row.try_get("longitude").map_err(db_err)?,
        visit_radius_m: row.try_get("visit_radius_m").map_err(db_err)?,
        points_reward: row.try_get("points_reward").map_err(db_err)?,
        qr_code: row.try_get("qr_code").map_err(db_err)?,
        is_active: row.try_get("is_active").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn check_in_from_row(row: &PgRow) -> Result<CheckIn, RewardsError> {
    let method: String = row.try_get("checkin_method").map_err(db_err)?;
    Ok(CheckIn {
        id: CheckInId::from_uuid(row.try_get("id").map_err(db_err)?),
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(db_err)?),
        destination_id: DestinationId::from_uuid(row.try_get("destination_id").map_err(db_err)?),
        method: method.parse()?,
        user_latitude: row.try_get("user_latitude").map_err(db_err)?,
        user_longitude: row.try_get("user_longitude").map_err(db_err)?,
        distance_m: row.try_get("distance_from_destination").map_err(db_err)?,
        points_earned: row.try_get("points_earned").map_err(db_err)?,
        bonus_points: row.try_get("bonus_points").map_err(db_err)?,
        is_verified: row.try_get("is_verified").map_err(db_err)?,
        checked_in_at: row.try_get("checked_in_at").map_err(db_err)?,
    })
}

fn badge_from_row(row: &PgRow) -> Result<Badge, RewardsError> {
    let requirement_type: String = row.try_get("requirement_type").map_err(db_err)?;
    let rarity: String = row.try_get("rarity").map_err(db_err)?;
    Ok(Badge {
        id: BadgeId::from_uuid(row.try_get("id").map_err(db_err)?),
        slug: row.try_get("slug").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        requirement_type: requirement_type.parse()?,
        requirement_value: row.try_get("requirement_value").map_err(db_err)?,
        points_reward: row.try_get("points_reward").map_err(db_err)?,
        rarity: rarity.parse()?,
        is_active: row.try_get("is_active").map_err(db_err)?,
        is_hidden: row.try_get("is_hidden").map_err(db_err)?,
    })
}

fn user_badge_from_row(row: &PgRow) -> Result<UserBadge, RewardsError> {
    Ok(UserBadge {
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(db_err)?),
        badge_id: BadgeId::from_uuid(row.try_get("badge_id").map_err(db_err)?),
        progress: row.try_get("progress").map_err(db_err)?,
        is_earned: row.try_get("is_earned").map_err(db_err)?,
        earned_at: row.try_get("earned_at").map_err(db_err)?,
        points_awarded: row.try_get("points_awarded").map_err(db_err)?,
        is_favorited: row.try_get("is_favorited").map_err(db_err)?,
        is_displayed: row.try_get("is_displayed").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn reward_from_row(row: &PgRow) -> Result<Reward, RewardsError> {
    let destination_id: Option<uuid::Uuid> = row.try_get("destination_id").map_err(db_err)?;
    Ok(Reward {
        id: RewardId::from_uuid(row.try_get("id").map_err(db_err)?),
        name: row.try_get("name").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        destination_id: destination_id.map(DestinationId::from_uuid),
        points_required: row.try_get("points_required").map_err(db_err)?,
        stock_quantity: row.try_get("stock_quantity").map_err(db_err)?,
        stock_unlimited: row.try_get("stock_unlimited").map_err(db_err)?,
        max_redemptions_per_user: row.try_get("max_redemptions_per_user").map_err(db_err)?,
        valid_from: row.try_get("valid_from").map_err(db_err)?,
        valid_until: row.try_get("valid_until").map_err(db_err)?,
        redemption_period_days: row.try_get("redemption_period_days").map_err(db_err)?,
        total_redeemed: row.try_get("total_redeemed").map_err(db_err)?,
        is_active: row.try_get("is_active").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn redemption_from_row(row: &PgRow) -> Result<Redemption, RewardsError> {
    let status: String = row.try_get("status").map_err(db_err)?;
    let destination_id: Option<uuid::Uuid> = row.try_get("destination_id").map_err(db_err)?;
    let verified_by: Option<uuid::Uuid> = row.try_get("verified_by").map_err(db_err)?;
    Ok(Redemption {
        id: RedemptionId::from_uuid(row.try_get("id").map_err(db_err)?),
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(db_err)?),
        reward_id: RewardId::from_uuid(row.try_get("reward_id").map_err(db_err)?),
        destination_id: destination_id.map(DestinationId::from_uuid),
        points_spent: row.try_get("points_spent").map_err(db_err)?,
        redemption_code: row.try_get("redemption_code").map_err(db_err)?,
        status: status.parse()?,
        valid_until: row.try_get("valid_until").map_err(db_err)?,
        redeemed_at: row.try_get("redeemed_at").map_err(db_err)?,
        used_at: row.try_get("used_at").map_err(db_err)?,
        used_location: row.try_get("used_location").map_err(db_err)?,
        verified_by: verified_by.map(UserId::from_uuid),
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<PointsTransaction, RewardsError> {
    let transaction_type: String = row.try_get("transaction_type").map_err(db_err)?;
    let reference_type: String = row.try_get("reference_type").map_err(db_err)?;
    Ok(PointsTransaction {
        id: TransactionId::from_uuid(row.try_get("id").map_err(db_err)?),
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(db_err)?),
        points: row.try_get("points").map_err(db_err)?,
        balance_after: row.try_get("balance_after").map_err(db_err)?,
        transaction_type: transaction_type.parse()?,
        reference: LedgerReference::from_parts(
            &reference_type,
            row.try_get("reference_id").map_err(db_err)?,
        )?,
        description: row.try_get("description").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}
