//! Operator dashboard.

use chrono::{DateTime, Duration, Utc};
use shelter_auth::Principal;
use shelter_core::error::{ShelterError, ShelterResult};
use shelter_core::models::stats::{
    ACTIVITY_WINDOW_DAYS, DashboardStats, FLAGGED_ANIMAL_COUNT, HealthIndicators,
    MOST_ACTIVE_GROUP_COUNT, RECENT_USER_COUNT, average_per_day, rank_most_active,
};
use shelter_core::repository::ReportRepository;
use tracing::debug;

pub struct ReportingService<R: ReportRepository> {
    reports: R,
}

impl<R: ReportRepository> ReportingService<R> {
    pub fn new(reports: R) -> Self {
        Self { reports }
    }

    /// Dashboard as of now. Site admins only.
    pub async fn dashboard_stats(&self, principal: &Principal) -> ShelterResult<DashboardStats> {
        if !principal.is_site_admin {
            return Err(ShelterError::AccessDenied);
        }
        self.dashboard_stats_at(Utc::now()).await
    }

    /// Dashboard with every trailing window measured back from `now`.
    ///
    /// The sub-statistics are independent reads and are not taken from
    /// one consistent snapshot.
    pub async fn dashboard_stats_at(&self, now: DateTime<Utc>) -> ShelterResult<DashboardStats> {
        let day_ago = now - Duration::hours(24);
        let week_ago = now - Duration::days(7);
        let window_start = now - Duration::days(ACTIVITY_WINDOW_DAYS);

        let (
            totals,
            recent_users,
            group_counts,
            needs_attention,
            active_users_24h,
            comments_24h,
            new_users_7d,
            comments_window,
        ) = tokio::try_join!(
            self.reports.entity_totals(),
            self.reports.recent_users(RECENT_USER_COUNT),
            self.reports.comment_counts_by_group(window_start),
            self.reports.flagged_animals(FLAGGED_ANIMAL_COUNT),
            self.reports.distinct_commenters_since(day_ago),
            self.reports.comment_count_since(day_ago),
            self.reports.new_user_count_since(week_ago),
            self.reports.comment_count_since(window_start),
        )?;

        debug!(
            users = totals.users,
            comments = totals.comments,
            flagged = needs_attention.len(),
            "Dashboard computed"
        );

        Ok(DashboardStats {
            generated_at: now,
            totals,
            recent_users: recent_users.into_iter().map(Into::into).collect(),
            most_active_groups: rank_most_active(group_counts, MOST_ACTIVE_GROUP_COUNT),
            needs_attention,
            health: HealthIndicators {
                active_users_24h,
                comments_24h,
                new_users_7d,
                avg_comments_per_day_30d: average_per_day(comments_window, ACTIVITY_WINDOW_DAYS),
            },
        })
    }
}
