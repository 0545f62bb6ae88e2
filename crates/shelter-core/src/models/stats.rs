//! Operator dashboard statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserSummary;

/// Number of recently created users shown on the dashboard.
pub const RECENT_USER_COUNT: u64 = 5;
/// Number of groups in the "most active" list.
pub const MOST_ACTIVE_GROUP_COUNT: usize = 5;
/// Maximum number of animals in the "needs attention" list.
pub const FLAGGED_ANIMAL_COUNT: u64 = 10;
/// Trailing window, in days, for group activity and the daily average.
pub const ACTIVITY_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTotals {
    pub users: u64,
    pub groups: u64,
    pub animals: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupActivity {
    pub group_id: Uuid,
    pub name: String,
    pub comment_count: u64,
}

/// An animal with at least one comment carrying a system tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedAnimal {
    pub animal_id: Uuid,
    pub animal_name: String,
    pub group_id: Uuid,
    /// Distinct system tag names, sorted.
    pub tags: Vec<String>,
    pub last_flagged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthIndicators {
    pub active_users_24h: u64,
    pub comments_24h: u64,
    pub new_users_7d: u64,
    pub avg_comments_per_day_30d: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub generated_at: DateTime<Utc>,
    pub totals: EntityTotals,
    pub recent_users: Vec<UserSummary>,
    pub most_active_groups: Vec<GroupActivity>,
    pub needs_attention: Vec<FlaggedAnimal>,
    pub health: HealthIndicators,
}

/// Order groups by comment volume (descending, ties by id ascending)
/// and keep the first `n`. Groups without comments are dropped.
pub fn rank_most_active(mut groups: Vec<GroupActivity>, n: usize) -> Vec<GroupActivity> {
    groups.retain(|g| g.comment_count > 0);
    groups.sort_by(|a, b| {
        b.comment_count
            .cmp(&a.comment_count)
            .then_with(|| a.group_id.cmp(&b.group_id))
    });
    groups.truncate(n);
    groups
}

/// Average per day over `days`; 0 when there is nothing to average.
pub fn average_per_day(count: u64, days: i64) -> f64 {
    if count == 0 || days <= 0 {
        return 0.0;
    }
    count as f64 / days as f64
}
