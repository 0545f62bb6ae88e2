//! Posting and removing animal comments, and the global comment tag
//! catalogue.

use shelter_auth::{AccessEvaluator, AccessLevel, Principal};
use shelter_core::error::{ShelterError, ShelterResult};
use shelter_core::models::comment::{AnimalComment, CommentTag, CreateComment, CreateCommentTag};
use shelter_core::repository::{AnimalRepository, CommentRepository, GroupRepository};
use tracing::info;
use uuid::Uuid;

/// A comment as submitted by a caller. The author is always the caller.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub animal_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub tag_ids: Vec<Uuid>,
}

pub struct CommentService<G: GroupRepository, A: AnimalRepository, C: CommentRepository> {
    access: AccessEvaluator<G>,
    animals: A,
    comments: C,
}

impl<G, A, C> CommentService<G, A, C>
where
    G: GroupRepository,
    A: AnimalRepository,
    C: CommentRepository,
{
    pub fn new(access: AccessEvaluator<G>, animals: A, comments: C) -> Self {
        Self {
            access,
            animals,
            comments,
        }
    }

    pub async fn post_comment(
        &self,
        principal: &Principal,
        input: NewComment,
    ) -> ShelterResult<AnimalComment> {
        let animal = self
            .access
            .require_for_animal(&self.animals, principal, input.animal_id, AccessLevel::Member)
            .await?;

        let content = input.content.trim().to_string();
        if content.is_empty() && input.image_url.is_none() {
            return Err(ShelterError::validation(
                "a comment needs text or an image",
            ));
        }

        let tag_ids = dedup_preserving_order(&input.tag_ids);
        if !tag_ids.is_empty() {
            let known = self.comments.find_tags(&tag_ids).await?;
            let missing: Vec<String> = tag_ids
                .iter()
                .filter(|id| !known.iter().any(|t| t.id == **id))
                .map(Uuid::to_string)
                .collect();
            if !missing.is_empty() {
                return Err(ShelterError::validation(format!(
                    "unknown comment tags: {}",
                    missing.join(", ")
                )));
            }
        }

        let comment = self
            .comments
            .create(CreateComment {
                animal_id: animal.id,
                author_id: principal.user_id,
                content,
                image_url: input.image_url,
                tag_ids,
            })
            .await?;

        info!(
            comment_id = %comment.id,
            animal_id = %animal.id,
            group_id = %animal.group_id,
            "Comment posted"
        );
        Ok(comment)
    }

    /// Soft-delete a comment. Allowed for its author, for admins of the
    /// animal's group and for site admins.
    pub async fn delete_comment(&self, principal: &Principal, comment_id: Uuid) -> ShelterResult<()> {
        let (comment, animal) = self
            .access
            .require_for_comment(
                &self.comments,
                &self.animals,
                principal,
                comment_id,
                AccessLevel::Member,
            )
            .await?;

        let allowed = comment.author_id == principal.user_id
            || self
                .access
                .authorize(principal, animal.group_id, AccessLevel::GroupAdmin)
                .await;
        if !allowed {
            return Err(ShelterError::AccessDenied);
        }

        self.comments.delete(comment.id).await?;
        info!(%comment_id, user_id = %principal.user_id, "Comment deleted");
        Ok(())
    }

    pub async fn list_tags(&self) -> ShelterResult<Vec<CommentTag>> {
        self.comments.list_tags().await
    }

    /// Comment tags are global, so only site admins define them.
    pub async fn create_tag(
        &self,
        principal: &Principal,
        input: CreateCommentTag,
    ) -> ShelterResult<CommentTag> {
        if !principal.is_site_admin {
            return Err(ShelterError::AccessDenied);
        }
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ShelterError::validation("tag name must not be empty"));
        }
        self.comments
            .create_tag(CreateCommentTag {
                name,
                is_system: input.is_system,
            })
            .await
    }
}

pub(crate) fn dedup_preserving_order(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}
