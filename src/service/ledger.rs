//! Points ledger: the only code path that changes a user's balance.
//!
//! Every append locks the user row, checks the resulting balance, writes the
//! new balance, lifetime total and level, and inserts the ledger row, all in
//! the caller's transaction.

use chrono::{DateTime, Utc};

use crate::domain::user::level_for_points;
use crate::domain::{LedgerReference, PointsTransaction, TransactionId, TransactionType, UserId};
use crate::error::RewardsError;
use crate::persistence::StoreTx;

/// One balance change to record.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    /// Account to change.
    pub user_id: UserId,
    /// Signed delta.
    pub delta: i64,
    /// Entry kind.
    pub transaction_type: TransactionType,
    /// Causing entity.
    pub reference: LedgerReference,
    /// Human-readable note.
    pub description: String,
}

/// Appends `entry` inside `tx` and returns the stored row.
///
/// # Errors
///
/// - [`RewardsError::UserNotFound`] if the user does not exist.
/// - [`RewardsError::InsufficientPoints`] if the balance would go negative.
/// - [`RewardsError::PersistenceError`] on storage failure.
pub async fn append(
    tx: &mut StoreTx,
    entry: LedgerEntry,
    now: DateTime<Utc>,
) -> Result<PointsTransaction, RewardsError> {
    let mut user = tx.lock_user(entry.user_id).await?;

    let balance_after = user
        .total_points
        .checked_add(entry.delta)
        .ok_or_else(|| RewardsError::InvalidRequest("points overflow".to_string()))?;
    if balance_after < 0 {
        return Err(RewardsError::InsufficientPoints {
            required: entry.delta.saturating_neg(),
            available: user.total_points,
        });
    }

    user.total_points = balance_after;
    if entry.transaction_type.counts_toward_lifetime() && entry.delta > 0 {
        user.lifetime_points = user.lifetime_points.saturating_add(entry.delta);
        user.level = level_for_points(user.lifetime_points);
    }
    tx.update_user(&user).await?;

    let transaction = PointsTransaction {
        id: TransactionId::new(),
        user_id: entry.user_id,
        points: entry.delta,
        balance_after,
        transaction_type: entry.transaction_type,
        reference: entry.reference,
        description: entry.description,
        created_at: now,
    };
    tx.insert_transaction(&transaction).await?;

    tracing::debug!(
        user_id = %entry.user_id,
        delta = entry.delta,
        balance_after,
        kind = entry.transaction_type.as_str(),
        "ledger entry appended"
    );
    Ok(transaction)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{CheckInId, RedemptionId, User};
    use crate::persistence::{MemoryStore, Store};

    async fn store_with_user() -> (Store, UserId) {
        let memory = MemoryStore::new();
        let user = User::new("ana", Utc::now());
        let user_id = user.id;
        memory.insert_user(user).await;
        (Store::Memory(memory), user_id)
    }

    fn entry(user_id: UserId, delta: i64, transaction_type: TransactionType) -> LedgerEntry {
        LedgerEntry {
            user_id,
            delta,
            transaction_type,
            reference: LedgerReference::CheckIn(CheckInId::new()),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn balance_after_tracks_running_total() {
        let (store, user_id) = store_with_user().await;
        let Ok(mut tx) = store.begin().await else {
            panic!("begin failed");
        };
        let Ok(first) = append(&mut tx, entry(user_id, 120, TransactionType::Earned), Utc::now()).await
        else {
            panic!("append failed");
        };
        let Ok(second) =
            append(&mut tx, entry(user_id, -20, TransactionType::Redeemed), Utc::now()).await
        else {
            panic!("append failed");
        };
        assert_eq!(first.balance_after, 120);
        assert_eq!(second.balance_after, 100);
        assert!(tx.commit().await.is_ok());

        let Ok(user) = store.get_user(user_id).await else {
            panic!("user missing");
        };
        assert_eq!(user.total_points, 100);
        assert_eq!(user.lifetime_points, 120);
        assert_eq!(user.level, 2);
        assert_eq!(store.ledger_sum(user_id).await.ok(), Some(100));
    }

    #[tokio::test]
    async fn negative_balance_is_rejected() {
        let (store, user_id) = store_with_user().await;
        let Ok(mut tx) = store.begin().await else {
            panic!("begin failed");
        };
        let mut debit = entry(user_id, -50, TransactionType::Redeemed);
        debit.reference = LedgerReference::Redemption(RedemptionId::new());
        let result = append(&mut tx, debit, Utc::now()).await;
        assert!(matches!(
            result,
            Err(RewardsError::InsufficientPoints {
                required: 50,
                available: 0
            })
        ));
    }

    #[tokio::test]
    async fn refunds_do_not_count_toward_lifetime() {
        let (store, user_id) = store_with_user().await;
        let Ok(mut tx) = store.begin().await else {
            panic!("begin failed");
        };
        let Ok(_) = append(&mut tx, entry(user_id, 300, TransactionType::Refunded), Utc::now()).await
        else {
            panic!("append failed");
        };
        assert!(tx.commit().await.is_ok());
        let Ok(user) = store.get_user(user_id).await else {
            panic!("user missing");
        };
        assert_eq!(user.total_points, 300);
        assert_eq!(user.lifetime_points, 0);
        assert_eq!(user.level, 1);
    }
}
