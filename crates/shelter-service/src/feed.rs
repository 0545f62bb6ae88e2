//! Group activity feed.
//!
//! Comments and announcements are read separately, merged into a single
//! newest-first ordering, and only then windowed. Each source is asked
//! for `offset + limit` rows so the window over the merge is exact.

use shelter_auth::{AccessEvaluator, AccessLevel, Principal};
use shelter_core::error::ShelterResult;
use shelter_core::models::feed::{FeedFilter, FeedItem, FeedWindow, merge_window};
use shelter_core::repository::{ActivityRepository, GroupRepository};
use tracing::debug;
use uuid::Uuid;

use crate::config::ServiceConfig;

pub struct ActivityFeed<G: GroupRepository, R: ActivityRepository> {
    access: AccessEvaluator<G>,
    activity: R,
    config: ServiceConfig,
}

impl<G: GroupRepository, R: ActivityRepository> ActivityFeed<G, R> {
    pub fn new(access: AccessEvaluator<G>, activity: R, config: ServiceConfig) -> Self {
        Self {
            access,
            activity,
            config,
        }
    }

    /// Feed for `group_id`, visible to members only.
    pub async fn get_feed(
        &self,
        principal: &Principal,
        group_id: Uuid,
        filter: FeedFilter,
        window: FeedWindow,
    ) -> ShelterResult<Vec<FeedItem>> {
        self.access
            .require(principal, group_id, AccessLevel::Member)
            .await?;
        self.collect(group_id, filter, window).await
    }

    async fn collect(
        &self,
        group_id: Uuid,
        filter: FeedFilter,
        window: FeedWindow,
    ) -> ShelterResult<Vec<FeedItem>> {
        let window = FeedWindow {
            limit: window.limit.clamp(1, self.config.feed_max_limit.max(1)),
            offset: window.offset,
        };
        let fetch = window.fetch_size();

        let comments = if filter.includes_comments() {
            self.activity.recent_comments(group_id, fetch).await?
        } else {
            Vec::new()
        };
        let announcements = if filter.includes_announcements() {
            self.activity.recent_announcements(group_id, fetch).await?
        } else {
            Vec::new()
        };

        debug!(
            %group_id,
            ?filter,
            comments = comments.len(),
            announcements = announcements.len(),
            "Merging feed sources"
        );
        Ok(merge_window(comments, announcements, window))
    }

    /// [`get_feed`](Self::get_feed) from raw request parameters.
    ///
    /// Access is checked before the parameters are looked at, so a
    /// caller outside the group learns nothing from a malformed query.
    pub async fn get_feed_from_query(
        &self,
        principal: &Principal,
        group_id: Uuid,
        filter: Option<&str>,
        limit: Option<&str>,
        offset: Option<&str>,
    ) -> ShelterResult<Vec<FeedItem>> {
        self.access
            .require(principal, group_id, AccessLevel::Member)
            .await?;

        let window = FeedWindow::parse(
            limit,
            offset,
            self.config.feed_default_limit,
            self.config.feed_max_limit,
        )?;
        self.collect(group_id, FeedFilter::parse(filter), window)
            .await
    }
}
