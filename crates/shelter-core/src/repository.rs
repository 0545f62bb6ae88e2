//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Soft-deleted rows are never
//! returned by normal reads; only [`MaintenanceRepository`] targets
//! them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ShelterResult;
use crate::models::{
    animal::{Animal, AnimalStatus, CreateAnimal},
    announcement::{Announcement, CreateAnnouncement},
    comment::{AnimalComment, CommentTag, CreateComment, CreateCommentTag},
    feed::{AnnouncementEvent, CommentEvent},
    group::{CreateGroup, Group, GroupMember, MembershipRole},
    maintenance::PurgeTable,
    skill_tag::{CreateSkillTag, SkillTag},
    stats::{EntityTotals, FlaggedAnimal, GroupActivity},
    user::{CreateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Users & groups
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = ShelterResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ShelterResult<User>> + Send;
    /// Soft-delete: sets `deleted_at`.
    fn delete(&self, id: Uuid) -> impl Future<Output = ShelterResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = ShelterResult<PaginatedResult<User>>> + Send;
    /// Email addresses of every non-deleted user.
    fn active_emails(&self) -> impl Future<Output = ShelterResult<Vec<String>>> + Send;
}

/// The membership store. The `member_of` edge is the sole authority
/// for "is member of".
pub trait GroupRepository: Send + Sync {
    fn create(&self, input: CreateGroup) -> impl Future<Output = ShelterResult<Group>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ShelterResult<Group>> + Send;
    /// Soft-delete: sets `deleted_at`. Membership edges are kept.
    fn delete(&self, id: Uuid) -> impl Future<Output = ShelterResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = ShelterResult<PaginatedResult<Group>>> + Send;

    /// Add a user to a group, or change the role of an existing member.
    fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        role: MembershipRole,
    ) -> impl Future<Output = ShelterResult<()>> + Send;

    /// Remove a user from a group.
    fn remove_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = ShelterResult<()>> + Send;

    /// The role `user_id` holds in `group_id`, or `None` when there is
    /// no membership or the group does not exist (or is deleted).
    fn get_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = ShelterResult<Option<MembershipRole>>> + Send;

    /// Get all members of a group with their roles.
    fn get_members(
        &self,
        group_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = ShelterResult<PaginatedResult<GroupMember>>> + Send;

    /// Get all groups a user belongs to.
    fn get_user_groups(&self, user_id: Uuid) -> impl Future<Output = ShelterResult<Vec<Group>>> + Send;

    /// Email addresses of the group's non-deleted members.
    fn member_emails(&self, group_id: Uuid) -> impl Future<Output = ShelterResult<Vec<String>>> + Send;
}

// ---------------------------------------------------------------------------
// Group-owned content
// ---------------------------------------------------------------------------

pub trait AnimalRepository: Send + Sync {
    fn create(&self, input: CreateAnimal) -> impl Future<Output = ShelterResult<Animal>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ShelterResult<Animal>> + Send;
    fn update_status(
        &self,
        id: Uuid,
        status: AnimalStatus,
    ) -> impl Future<Output = ShelterResult<Animal>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ShelterResult<()>> + Send;
    fn list_by_group(&self, group_id: Uuid) -> impl Future<Output = ShelterResult<Vec<Animal>>> + Send;
}

pub trait CommentRepository: Send + Sync {
    fn create(
        &self,
        input: CreateComment,
    ) -> impl Future<Output = ShelterResult<AnimalComment>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ShelterResult<AnimalComment>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ShelterResult<()>> + Send;

    fn create_tag(
        &self,
        input: CreateCommentTag,
    ) -> impl Future<Output = ShelterResult<CommentTag>> + Send;
    fn list_tags(&self) -> impl Future<Output = ShelterResult<Vec<CommentTag>>> + Send;
    /// Tags among `ids` that exist. Unknown ids are silently absent.
    fn find_tags(&self, ids: &[Uuid]) -> impl Future<Output = ShelterResult<Vec<CommentTag>>> + Send;
}

pub trait AnnouncementRepository: Send + Sync {
    fn create(
        &self,
        input: CreateAnnouncement,
    ) -> impl Future<Output = ShelterResult<Announcement>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ShelterResult<Announcement>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ShelterResult<()>> + Send;
}

pub trait SkillTagRepository: Send + Sync {
    fn create(&self, input: CreateSkillTag) -> impl Future<Output = ShelterResult<SkillTag>> + Send;
    fn list_by_group(&self, group_id: Uuid) -> impl Future<Output = ShelterResult<Vec<SkillTag>>> + Send;
    /// Tags among `ids` owned by `group_id`.
    fn find_in_group(
        &self,
        group_id: Uuid,
        ids: &[Uuid],
    ) -> impl Future<Output = ShelterResult<Vec<SkillTag>>> + Send;
    /// The user's skill tags within one group, ordered by name.
    fn get_user_tags(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = ShelterResult<Vec<SkillTag>>> + Send;
    /// Atomically replace the user's tags within `group_id` with
    /// exactly `tag_ids`. Tags in other groups are untouched.
    fn replace_user_tags(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        tag_ids: &[Uuid],
    ) -> impl Future<Output = ShelterResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

/// Feed sources for one group. Each method returns at most `limit`
/// of the newest rows, ordered by timestamp then id, both descending.
pub trait ActivityRepository: Send + Sync {
    fn recent_comments(
        &self,
        group_id: Uuid,
        limit: u64,
    ) -> impl Future<Output = ShelterResult<Vec<CommentEvent>>> + Send;
    fn recent_announcements(
        &self,
        group_id: Uuid,
        limit: u64,
    ) -> impl Future<Output = ShelterResult<Vec<AnnouncementEvent>>> + Send;
}

/// Cross-group statistics. Each call is an independent read.
pub trait ReportRepository: Send + Sync {
    fn entity_totals(&self) -> impl Future<Output = ShelterResult<EntityTotals>> + Send;
    fn recent_users(&self, limit: u64) -> impl Future<Output = ShelterResult<Vec<User>>> + Send;
    /// Comment volume per group since `since`, unordered.
    fn comment_counts_by_group(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = ShelterResult<Vec<GroupActivity>>> + Send;
    /// Animals with system-tagged comments, most recently flagged first.
    fn flagged_animals(
        &self,
        limit: u64,
    ) -> impl Future<Output = ShelterResult<Vec<FlaggedAnimal>>> + Send;
    fn comment_count_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = ShelterResult<u64>> + Send;
    fn distinct_commenters_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = ShelterResult<u64>> + Send;
    fn new_user_count_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = ShelterResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

pub trait MaintenanceRepository: Send + Sync {
    /// Hard-delete rows of `table` soft-deleted before `deleted_before`.
    /// Returns the number of rows removed.
    fn purge_deleted(
        &self,
        table: PurgeTable,
        deleted_before: DateTime<Utc>,
    ) -> impl Future<Output = ShelterResult<u64>> + Send;
}
