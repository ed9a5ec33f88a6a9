//! Badge catalog, per-user progress and requirement strategies.
//!
//! Each [`RequirementType`] maps to one pure strategy function that reads a
//! [`UserActivity`] snapshot and returns the measured progress. Adding a new
//! requirement kind means adding a variant and a strategy, nothing else.

use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BadgeId, UserId};
use crate::error::RewardsError;

/// What a badge measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    /// Number of verified check-ins.
    CheckinCount,
    /// Lifetime earned points (spending does not reduce it).
    PointsTotal,
    /// Distinct destination categories visited.
    CategoryCount,
    /// Distinct destinations visited.
    DestinationCount,
    /// Current run of consecutive days with a verified check-in.
    Streak,
}

/// Strategy computing progress for one requirement type.
pub type ProgressStrategy = fn(&UserActivity) -> i64;

impl RequirementType {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CheckinCount => "checkin_count",
            Self::PointsTotal => "points_total",
            Self::CategoryCount => "category_count",
            Self::DestinationCount => "destination_count",
            Self::Streak => "streak",
        }
    }

    /// The progress strategy for this requirement.
    #[must_use]
    pub fn strategy(&self) -> ProgressStrategy {
        match self {
            Self::CheckinCount => checkin_count_progress,
            Self::PointsTotal => points_total_progress,
            Self::CategoryCount => category_count_progress,
            Self::DestinationCount => destination_count_progress,
            Self::Streak => streak_progress,
        }
    }

    /// Measures `activity` against this requirement.
    #[must_use]
    pub fn progress(&self, activity: &UserActivity) -> i64 {
        (self.strategy())(activity)
    }
}

impl FromStr for RequirementType {
    type Err = RewardsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkin_count" => Ok(Self::CheckinCount),
            "points_total" => Ok(Self::PointsTotal),
            "category_count" => Ok(Self::CategoryCount),
            "destination_count" => Ok(Self::DestinationCount),
            "streak" => Ok(Self::Streak),
            other => Err(RewardsError::PersistenceError(format!(
                "unknown badge requirement type: {other}"
            ))),
        }
    }
}

/// Display rarity of a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Most users earn it.
    Common,
    /// Takes some effort.
    Uncommon,
    /// Takes dedication.
    Rare,
    /// Few users earn it.
    Epic,
    /// Almost nobody earns it.
    Legendary,
}

impl Rarity {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl FromStr for Rarity {
    type Err = RewardsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "common" => Ok(Self::Common),
            "uncommon" => Ok(Self::Uncommon),
            "rare" => Ok(Self::Rare),
            "epic" => Ok(Self::Epic),
            "legendary" => Ok(Self::Legendary),
            other => Err(RewardsError::PersistenceError(format!(
                "unknown badge rarity: {other}"
            ))),
        }
    }
}

/// A badge catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    /// Badge identifier.
    pub id: BadgeId,
    /// Stable catalog key.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// What the badge measures.
    pub requirement_type: RequirementType,
    /// Progress needed to earn the badge.
    pub requirement_value: i64,
    /// Bonus points granted on award.
    pub points_reward: i64,
    /// Display rarity.
    pub rarity: Rarity,
    /// Inactive badges are neither listed nor evaluated.
    pub is_active: bool,
    /// Hidden badges are evaluated but not listed until earned.
    pub is_hidden: bool,
}

impl Badge {
    /// Builds an active, visible catalog entry.
    #[must_use]
    pub fn new(
        slug: &str,
        name: &str,
        description: &str,
        requirement_type: RequirementType,
        requirement_value: i64,
        points_reward: i64,
        rarity: Rarity,
    ) -> Self {
        Self {
            id: BadgeId::new(),
            slug: slug.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            requirement_type,
            requirement_value,
            points_reward,
            rarity,
            is_active: true,
            is_hidden: false,
        }
    }
}

/// A user's progress toward one badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBadge {
    /// Owner.
    pub user_id: UserId,
    /// Badge measured.
    pub badge_id: BadgeId,
    /// Last measured progress.
    pub progress: i64,
    /// Set once, never cleared.
    pub is_earned: bool,
    /// Award timestamp.
    pub earned_at: Option<DateTime<Utc>>,
    /// Points granted at award time; unaffected by later catalog edits.
    pub points_awarded: i64,
    /// User preference, irrelevant to earning.
    pub is_favorited: bool,
    /// User preference, irrelevant to earning.
    pub is_displayed: bool,
    /// Last progress update.
    pub updated_at: DateTime<Utc>,
}

impl UserBadge {
    /// Fresh progress row with zero progress.
    #[must_use]
    pub fn new(user_id: UserId, badge_id: BadgeId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            badge_id,
            progress: 0,
            is_earned: false,
            earned_at: None,
            points_awarded: 0,
            is_favorited: false,
            is_displayed: false,
            updated_at: now,
        }
    }

    /// Records a new measurement and awards the badge when the requirement
    /// is met. Returns `true` only on the false→true transition.
    ///
    /// Once earned, the award fields never change again.
    pub fn record_progress(&mut self, badge: &Badge, progress: i64, now: DateTime<Utc>) -> bool {
        self.progress = progress;
        self.updated_at = now;
        if self.is_earned || progress < badge.requirement_value {
            return false;
        }
        self.is_earned = true;
        self.earned_at = Some(now);
        self.points_awarded = badge.points_reward;
        true
    }
}

/// Read-only view of a user's activity used by progress strategies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserActivity {
    /// Number of verified check-ins.
    pub verified_checkins: i64,
    /// Lifetime earned points.
    pub lifetime_points: i64,
    /// Distinct categories among verified check-ins.
    pub distinct_categories: i64,
    /// Distinct destinations among verified check-ins.
    pub distinct_destinations: i64,
    /// UTC days with at least one verified check-in, ascending and unique.
    pub checkin_days: Vec<NaiveDate>,
    /// The evaluation day (UTC).
    pub today: NaiveDate,
}

fn checkin_count_progress(activity: &UserActivity) -> i64 {
    activity.verified_checkins
}

fn points_total_progress(activity: &UserActivity) -> i64 {
    activity.lifetime_points
}

fn category_count_progress(activity: &UserActivity) -> i64 {
    activity.distinct_categories
}

fn destination_count_progress(activity: &UserActivity) -> i64 {
    activity.distinct_destinations
}

fn streak_progress(activity: &UserActivity) -> i64 {
    current_streak(&activity.checkin_days, activity.today)
}

/// Length of the run of consecutive check-in days ending today or
/// yesterday. A missed day resets the streak to 0.
///
/// `days` must be ascending; duplicates are tolerated.
#[must_use]
pub fn current_streak(days: &[NaiveDate], today: NaiveDate) -> i64 {
    let Some(&last) = days.last() else {
        return 0;
    };
    if last != today && last != today - Duration::days(1) {
        return 0;
    }

    let mut streak = 1;
    let mut expected = last - Duration::days(1);
    for &day in days.iter().rev().skip(1) {
        if day == expected + Duration::days(1) {
            continue;
        }
        if day != expected {
            break;
        }
        streak += 1;
        expected = day - Duration::days(1);
    }
    streak
}

/// The badge catalog ensured on startup, keyed by slug.
#[must_use]
pub fn default_catalog() -> Vec<Badge> {
    vec![
        Badge::new(
            "first-steps",
            "First Steps",
            "Complete your first check-in.",
            RequirementType::CheckinCount,
            1,
            10,
            Rarity::Common,
        ),
        Badge::new(
            "wanderer",
            "Wanderer",
            "Complete 10 check-ins.",
            RequirementType::CheckinCount,
            10,
            50,
            Rarity::Uncommon,
        ),
        Badge::new(
            "globetrotter",
            "Globetrotter",
            "Visit 25 different destinations.",
            RequirementType::DestinationCount,
            25,
            200,
            Rarity::Epic,
        ),
        Badge::new(
            "explorer",
            "Explorer",
            "Visit destinations in 3 different categories.",
            RequirementType::CategoryCount,
            3,
            75,
            Rarity::Rare,
        ),
        Badge::new(
            "point-collector",
            "Point Collector",
            "Earn 1,000 points.",
            RequirementType::PointsTotal,
            1_000,
            100,
            Rarity::Rare,
        ),
        Badge::new(
            "on-a-roll",
            "On a Roll",
            "Check in on 7 consecutive days.",
            RequirementType::Streak,
            7,
            150,
            Rarity::Epic,
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        let Some(date) = NaiveDate::from_ymd_opt(2026, 3, d) else {
            panic!("valid date");
        };
        date
    }

    #[test]
    fn streak_counts_consecutive_days_ending_today() {
        let days = [day(1), day(3), day(4), day(5)];
        assert_eq!(current_streak(&days, day(5)), 3);
    }

    #[test]
    fn streak_survives_until_end_of_next_day() {
        let days = [day(4), day(5)];
        assert_eq!(current_streak(&days, day(6)), 2);
    }

    #[test]
    fn missed_day_resets_to_zero() {
        let days = [day(4), day(5)];
        assert_eq!(current_streak(&days, day(7)), 0);
        assert_eq!(current_streak(&[], day(7)), 0);
    }

    #[test]
    fn streak_tolerates_duplicate_days() {
        let days = [day(3), day(4), day(4), day(5)];
        assert_eq!(current_streak(&days, day(5)), 3);
    }

    #[test]
    fn strategies_read_the_matching_field() {
        let activity = UserActivity {
            verified_checkins: 12,
            lifetime_points: 640,
            distinct_categories: 4,
            distinct_destinations: 9,
            checkin_days: vec![day(9), day(10)],
            today: day(10),
        };
        assert_eq!(RequirementType::CheckinCount.progress(&activity), 12);
        assert_eq!(RequirementType::PointsTotal.progress(&activity), 640);
        assert_eq!(RequirementType::CategoryCount.progress(&activity), 4);
        assert_eq!(RequirementType::DestinationCount.progress(&activity), 9);
        assert_eq!(RequirementType::Streak.progress(&activity), 2);
    }

    #[test]
    fn earning_is_monotonic_and_snapshots_reward() {
        let mut badge = Badge::new(
            "first-steps",
            "First Steps",
            "",
            RequirementType::CheckinCount,
            1,
            10,
            Rarity::Common,
        );
        let mut progress = UserBadge::new(UserId::new(), badge.id, Utc::now());

        assert!(!progress.record_progress(&badge, 0, Utc::now()));
        assert!(progress.record_progress(&badge, 1, Utc::now()));
        assert_eq!(progress.points_awarded, 10);

        badge.points_reward = 999;
        assert!(!progress.record_progress(&badge, 0, Utc::now()));
        assert!(progress.is_earned);
        assert_eq!(progress.points_awarded, 10);
    }

    #[test]
    fn default_catalog_slugs_are_unique() {
        let catalog = default_catalog();
        let mut slugs: Vec<_> = catalog.iter().map(|b| b.slug.as_str()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), catalog.len());
    }
}
