//! Group access evaluation.
//!
//! [`AccessEvaluator::authorize`] is the predicate: site admins pass
//! unconditionally, everyone else needs a `member_of` edge with a
//! sufficient role. Any store error during the lookup is a denial.
//!
//! The `require*` helpers turn the predicate into errors. A caller that
//! is denied always sees [`ShelterError::AccessDenied`], even when the
//! target does not exist, so existence is never revealed to someone who
//! could not see the resource anyway.

use shelter_core::error::{ShelterError, ShelterResult};
use shelter_core::models::animal::Animal;
use shelter_core::models::announcement::Announcement;
use shelter_core::models::comment::AnimalComment;
use shelter_core::models::group::MembershipRole;
use shelter_core::repository::{
    AnimalRepository, AnnouncementRepository, CommentRepository, GroupRepository,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::principal::Principal;

/// The access a caller needs on a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Member,
    GroupAdmin,
}

impl AccessLevel {
    /// Whether a membership with `role` meets this level.
    pub fn is_satisfied_by(self, role: MembershipRole) -> bool {
        match self {
            AccessLevel::Member => true,
            AccessLevel::GroupAdmin => role.is_admin(),
        }
    }
}

/// Evaluates group access against current membership. Nothing is
/// cached; every call reads the store.
#[derive(Clone)]
pub struct AccessEvaluator<G: GroupRepository> {
    groups: G,
}

impl<G: GroupRepository> AccessEvaluator<G> {
    pub fn new(groups: G) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &G {
        &self.groups
    }

    pub async fn authorize(&self, principal: &Principal, group_id: Uuid, level: AccessLevel) -> bool {
        if principal.is_site_admin {
            return true;
        }

        match self.groups.get_membership(group_id, principal.user_id).await {
            Ok(Some(role)) => level.is_satisfied_by(role),
            Ok(None) => false,
            Err(e) => {
                warn!(
                    user_id = %principal.user_id,
                    %group_id,
                    error = ?e,
                    "Membership lookup failed, denying access"
                );
                false
            }
        }
    }

    /// Fail with `AccessDenied` unless `principal` holds `level` on
    /// `group_id`. Site admins get `NotFound` for a missing group.
    pub async fn require(
        &self,
        principal: &Principal,
        group_id: Uuid,
        level: AccessLevel,
    ) -> ShelterResult<()> {
        if !self.authorize(principal, group_id, level).await {
            debug!(user_id = %principal.user_id, %group_id, ?level, "Access denied");
            return Err(ShelterError::AccessDenied);
        }

        if principal.is_site_admin {
            self.groups.get_by_id(group_id).await?;
        }
        Ok(())
    }

    /// Resolve an animal and require `level` on its group.
    pub async fn require_for_animal<A: AnimalRepository>(
        &self,
        animals: &A,
        principal: &Principal,
        animal_id: Uuid,
        level: AccessLevel,
    ) -> ShelterResult<Animal> {
        let animal = animals
            .get_by_id(animal_id)
            .await
            .map_err(|e| conceal(principal, e))?;
        self.require(principal, animal.group_id, level).await?;
        Ok(animal)
    }

    /// Resolve a comment and its animal, then require `level` on the
    /// animal's group.
    pub async fn require_for_comment<C: CommentRepository, A: AnimalRepository>(
        &self,
        comments: &C,
        animals: &A,
        principal: &Principal,
        comment_id: Uuid,
        level: AccessLevel,
    ) -> ShelterResult<(AnimalComment, Animal)> {
        let comment = comments
            .get_by_id(comment_id)
            .await
            .map_err(|e| conceal(principal, e))?;
        let animal = self
            .require_for_animal(animals, principal, comment.animal_id, level)
            .await?;
        Ok((comment, animal))
    }

    /// Resolve an announcement and require `level` on its group.
    ///
    /// Global announcements have no group: anyone may read them
    /// (`Member`), only site admins may manage them (`GroupAdmin`).
    pub async fn require_for_announcement<N: AnnouncementRepository>(
        &self,
        announcements: &N,
        principal: &Principal,
        announcement_id: Uuid,
        level: AccessLevel,
    ) -> ShelterResult<Announcement> {
        let announcement = announcements
            .get_by_id(announcement_id)
            .await
            .map_err(|e| conceal(principal, e))?;

        match announcement.group_id {
            Some(group_id) => self.require(principal, group_id, level).await?,
            None if level == AccessLevel::Member || principal.is_site_admin => {}
            None => return Err(ShelterError::AccessDenied),
        }
        Ok(announcement)
    }
}

/// Collapse `NotFound` into `AccessDenied` for callers without the
/// site-wide view.
fn conceal(principal: &Principal, err: ShelterError) -> ShelterError {
    match err {
        ShelterError::NotFound { .. } if !principal.is_site_admin => ShelterError::AccessDenied,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use shelter_core::models::group::{CreateGroup, Group, GroupMember};
    use shelter_core::repository::{PaginatedResult, Pagination};

    use super::*;

    /// A membership store that only knows one answer.
    struct StubGroups {
        membership: Result<Option<MembershipRole>, ()>,
    }

    impl StubGroups {
        fn store_error() -> ShelterError {
            ShelterError::Database("connection reset".into())
        }
    }

    impl GroupRepository for StubGroups {
        async fn create(&self, _input: CreateGroup) -> ShelterResult<Group> {
            Err(Self::store_error())
        }
        async fn get_by_id(&self, id: Uuid) -> ShelterResult<Group> {
            Err(ShelterError::not_found("group", id))
        }
        async fn delete(&self, _id: Uuid) -> ShelterResult<()> {
            Err(Self::store_error())
        }
        async fn list(&self, _pagination: Pagination) -> ShelterResult<PaginatedResult<Group>> {
            Err(Self::store_error())
        }
        async fn add_member(
            &self,
            _group_id: Uuid,
            _user_id: Uuid,
            _role: MembershipRole,
        ) -> ShelterResult<()> {
            Err(Self::store_error())
        }
        async fn remove_member(&self, _group_id: Uuid, _user_id: Uuid) -> ShelterResult<()> {
            Err(Self::store_error())
        }
        async fn get_membership(
            &self,
            _group_id: Uuid,
            _user_id: Uuid,
        ) -> ShelterResult<Option<MembershipRole>> {
            self.membership.map_err(|()| Self::store_error())
        }
        async fn get_members(
            &self,
            _group_id: Uuid,
            _pagination: Pagination,
        ) -> ShelterResult<PaginatedResult<GroupMember>> {
            Err(Self::store_error())
        }
        async fn get_user_groups(&self, _user_id: Uuid) -> ShelterResult<Vec<Group>> {
            Err(Self::store_error())
        }
        async fn member_emails(&self, _group_id: Uuid) -> ShelterResult<Vec<String>> {
            Err(Self::store_error())
        }
    }

    fn evaluator(membership: Result<Option<MembershipRole>, ()>) -> AccessEvaluator<StubGroups> {
        AccessEvaluator::new(StubGroups { membership })
    }

    fn user() -> Principal {
        Principal::new(Uuid::now_v7(), false)
    }

    #[test]
    fn group_admin_level_needs_admin_role() {
        assert!(AccessLevel::Member.is_satisfied_by(MembershipRole::Member));
        assert!(AccessLevel::Member.is_satisfied_by(MembershipRole::Admin));
        assert!(!AccessLevel::GroupAdmin.is_satisfied_by(MembershipRole::Member));
        assert!(AccessLevel::GroupAdmin.is_satisfied_by(MembershipRole::Admin));
    }

    #[tokio::test]
    async fn store_error_denies() {
        let eval = evaluator(Err(()));
        let group = Uuid::now_v7();

        assert!(!eval.authorize(&user(), group, AccessLevel::Member).await);
        assert!(matches!(
            eval.require(&user(), group, AccessLevel::Member).await,
            Err(ShelterError::AccessDenied)
        ));
    }

    #[tokio::test]
    async fn site_admin_bypasses_membership_lookup() {
        let eval = evaluator(Err(()));
        let admin = Principal::new(Uuid::now_v7(), true);

        assert!(eval.authorize(&admin, Uuid::now_v7(), AccessLevel::GroupAdmin).await);
    }

    #[tokio::test]
    async fn site_admin_sees_missing_group_as_not_found() {
        let eval = evaluator(Ok(None));
        let admin = Principal::new(Uuid::now_v7(), true);

        assert!(matches!(
            eval.require(&admin, Uuid::now_v7(), AccessLevel::Member).await,
            Err(ShelterError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn plain_member_is_not_group_admin() {
        let eval = evaluator(Ok(Some(MembershipRole::Member)));
        let group = Uuid::now_v7();

        assert!(eval.authorize(&user(), group, AccessLevel::Member).await);
        assert!(!eval.authorize(&user(), group, AccessLevel::GroupAdmin).await);
    }

    #[test]
    fn conceal_hides_not_found_from_non_admins() {
        let missing = || ShelterError::not_found("animal", Uuid::nil());

        assert!(matches!(
            conceal(&user(), missing()),
            ShelterError::AccessDenied
        ));
        assert!(matches!(
            conceal(&Principal::new(Uuid::nil(), true), missing()),
            ShelterError::NotFound { .. }
        ));
        assert!(matches!(
            conceal(&user(), ShelterError::Database("x".into())),
            ShelterError::Database(_)
        ));
    }
}
