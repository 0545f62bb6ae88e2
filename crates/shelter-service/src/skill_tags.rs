//! Group-scoped skill tags and their assignment to members.

use shelter_auth::{AccessEvaluator, AccessLevel, Principal};
use shelter_core::error::{ShelterError, ShelterResult};
use shelter_core::models::skill_tag::{CreateSkillTag, SkillTag};
use shelter_core::repository::{GroupRepository, SkillTagRepository};
use tracing::info;
use uuid::Uuid;

use crate::comments::dedup_preserving_order;

pub struct SkillTagService<G: GroupRepository, S: SkillTagRepository> {
    access: AccessEvaluator<G>,
    skills: S,
}

impl<G: GroupRepository, S: SkillTagRepository> SkillTagService<G, S> {
    pub fn new(access: AccessEvaluator<G>, skills: S) -> Self {
        Self { access, skills }
    }

    pub async fn create_tag(
        &self,
        principal: &Principal,
        group_id: Uuid,
        name: &str,
    ) -> ShelterResult<SkillTag> {
        self.access
            .require(principal, group_id, AccessLevel::GroupAdmin)
            .await?;

        let name = name.trim();
        if name.is_empty() {
            return Err(ShelterError::validation("tag name must not be empty"));
        }
        self.skills
            .create(CreateSkillTag {
                group_id,
                name: name.to_string(),
            })
            .await
    }

    pub async fn list_tags(&self, principal: &Principal, group_id: Uuid) -> ShelterResult<Vec<SkillTag>> {
        self.access
            .require(principal, group_id, AccessLevel::Member)
            .await?;
        self.skills.list_by_group(group_id).await
    }

    pub async fn user_tags(
        &self,
        principal: &Principal,
        group_id: Uuid,
        user_id: Uuid,
    ) -> ShelterResult<Vec<SkillTag>> {
        self.access
            .require(principal, group_id, AccessLevel::Member)
            .await?;
        self.skills.get_user_tags(group_id, user_id).await
    }

    /// Make `tag_ids` the target's complete skill set in `group_id`.
    ///
    /// Every precondition is checked before anything is written: the
    /// caller must be a group admin, the target a member, and every tag
    /// must belong to the group. Tags the target holds in other groups
    /// are left alone. Returns the resulting set.
    pub async fn set_user_skill_tags(
        &self,
        principal: &Principal,
        group_id: Uuid,
        target_user_id: Uuid,
        tag_ids: &[Uuid],
    ) -> ShelterResult<Vec<SkillTag>> {
        self.access
            .require(principal, group_id, AccessLevel::GroupAdmin)
            .await?;

        if self
            .access
            .groups()
            .get_membership(group_id, target_user_id)
            .await?
            .is_none()
        {
            return Err(ShelterError::validation(format!(
                "user {target_user_id} is not a member of this group"
            )));
        }

        let tag_ids = dedup_preserving_order(tag_ids);
        let owned = self.skills.find_in_group(group_id, &tag_ids).await?;
        let foreign: Vec<String> = tag_ids
            .iter()
            .filter(|id| !owned.iter().any(|t| t.id == **id))
            .map(Uuid::to_string)
            .collect();
        if !foreign.is_empty() {
            return Err(ShelterError::validation(format!(
                "skill tags not in this group: {}",
                foreign.join(", ")
            )));
        }

        self.skills
            .replace_user_tags(group_id, target_user_id, &tag_ids)
            .await?;
        info!(
            %group_id,
            user_id = %target_user_id,
            by = %principal.user_id,
            count = tag_ids.len(),
            "Skill tags set"
        );

        self.skills.get_user_tags(group_id, target_user_id).await
    }
}
