//! Read-side account views: profile, ledger history, check-ins and badge
//! progress.

use crate::domain::{Badge, CheckIn, PointsTransaction, User, UserBadge, UserId};
use crate::error::RewardsError;
use crate::persistence::Store;

use super::catalog_service::CatalogService;

/// Upper bound on history page sizes.
pub const MAX_PAGE: usize = 200;

/// Progress of one user toward one visible badge.
#[derive(Debug, Clone)]
pub struct BadgeProgress {
    /// The catalog entry.
    pub badge: Badge,
    /// Stored progress; `None` before the first evaluation.
    pub progress: Option<UserBadge>,
}

/// Read-only account queries.
#[derive(Debug, Clone)]
pub struct AccountService {
    store: Store,
    catalog: CatalogService,
}

impl AccountService {
    /// Creates a new `AccountService`.
    #[must_use]
    pub fn new(store: Store, catalog: CatalogService) -> Self {
        Self { store, catalog }
    }

    /// The user's profile, balance and level.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::UserNotFound`] for unknown users.
    pub async fn profile(&self, user_id: UserId) -> Result<User, RewardsError> {
        self.store.get_user(user_id).await
    }

    /// Newest ledger rows first, at most `limit` (capped at [`MAX_PAGE`]).
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] on storage failure.
    pub async fn transactions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<PointsTransaction>, RewardsError> {
        self.store
            .user_transactions(user_id, limit.clamp(1, MAX_PAGE))
            .await
    }

    /// Newest check-ins first, at most `limit` (capped at [`MAX_PAGE`]).
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] on storage failure.
    pub async fn check_ins(&self, user_id: UserId, limit: usize) -> Result<Vec<CheckIn>, RewardsError> {
        self.store
            .user_check_ins(user_id, limit.clamp(1, MAX_PAGE))
            .await
    }

    /// Progress toward every visible badge plus every hidden badge the user
    /// has already earned.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::PersistenceError`] on storage failure.
    pub async fn badge_progress(&self, user_id: UserId) -> Result<Vec<BadgeProgress>, RewardsError> {
        let catalog = self.catalog.all_badges().await?;
        let mut rows = self.store.user_badges(user_id).await?;
        Ok(catalog
            .iter()
            .filter_map(|badge| {
                let progress = rows
                    .iter()
                    .position(|ub| ub.badge_id == badge.id)
                    .map(|idx| rows.swap_remove(idx));
                let earned = progress.as_ref().is_some_and(|ub| ub.is_earned);
                let visible = badge.is_active && !badge.is_hidden;
                (visible || earned).then(|| BadgeProgress {
                    badge: badge.clone(),
                    progress,
                })
            })
            .collect())
    }
}
