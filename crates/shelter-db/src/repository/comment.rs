//! SurrealDB implementation of [`CommentRepository`].
//!
//! Tags are referenced from the comment through its `tag_ids` array.

use chrono::{DateTime, Utc};
use shelter_core::error::ShelterResult;
use shelter_core::models::comment::{AnimalComment, CommentTag, CreateComment, CreateCommentTag};
use shelter_core::repository::CommentRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::rows::{id_strings, parse_uuid};

#[derive(Debug, SurrealValue)]
struct CommentRow {
    animal_id: String,
    author_id: String,
    content: String,
    image_url: Option<String>,
    tag_ids: Vec<String>,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl CommentRow {
    fn into_comment(self, id: Uuid) -> Result<AnimalComment, DbError> {
        let tag_ids = self
            .tag_ids
            .iter()
            .map(|t| parse_uuid(t, "comment tag"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AnimalComment {
            id,
            animal_id: parse_uuid(&self.animal_id, "animal")?,
            author_id: parse_uuid(&self.author_id, "author")?,
            content: self.content,
            image_url: self.image_url,
            tag_ids,
            created_at: self.created_at,
            deleted_at: self.deleted_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CommentTagRow {
    name: String,
    is_system: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
pub(crate) struct CommentTagRowWithId {
    pub(crate) record_id: String,
    pub(crate) name: String,
    pub(crate) is_system: bool,
    pub(crate) created_at: DateTime<Utc>,
}

impl CommentTagRowWithId {
    pub(crate) fn try_into_tag(self) -> Result<CommentTag, DbError> {
        Ok(CommentTag {
            id: parse_uuid(&self.record_id, "comment tag")?,
            name: self.name,
            is_system: self.is_system,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Comment repository.
#[derive(Clone)]
pub struct SurrealCommentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCommentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CommentRepository for SurrealCommentRepository<C> {
    async fn create(&self, input: CreateComment) -> ShelterResult<AnimalComment> {
        let id = Uuid::now_v7();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('animal_comment', $id) SET \
                 animal_id = $animal_id, author_id = $author_id, \
                 content = $content, image_url = $image_url, \
                 tag_ids = $tag_ids",
            )
            .bind(("id", id_str.clone()))
            .bind(("animal_id", input.animal_id.to_string()))
            .bind(("author_id", input.author_id.to_string()))
            .bind(("content", input.content))
            .bind(("image_url", input.image_url))
            .bind(("tag_ids", id_strings(&input.tag_ids)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CommentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("animal_comment", &id_str))?;

        Ok(row.into_comment(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ShelterResult<AnimalComment> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('animal_comment', $id) \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CommentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("animal_comment", &id_str))?;

        Ok(row.into_comment(id)?)
    }

    async fn delete(&self, id: Uuid) -> ShelterResult<()> {
        self.db
            .query(
                "UPDATE type::record('animal_comment', $id) SET \
                 deleted_at = time::now() \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn create_tag(&self, input: CreateCommentTag) -> ShelterResult<CommentTag> {
        let id = Uuid::now_v7();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('comment_tag', $id) SET \
                 name = $name, is_system = $is_system",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("is_system", input.is_system))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CommentTagRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("comment_tag", &id_str))?;

        Ok(CommentTag {
            id,
            name: row.name,
            is_system: row.is_system,
            created_at: row.created_at,
        })
    }

    async fn list_tags(&self) -> ShelterResult<Vec<CommentTag>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM comment_tag ORDER BY name ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CommentTagRowWithId> = result.take(0).map_err(DbError::from)?;

        let tags = rows
            .into_iter()
            .map(|row| row.try_into_tag())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(tags)
    }

    async fn find_tags(&self, ids: &[Uuid]) -> ShelterResult<Vec<CommentTag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM comment_tag \
                 WHERE meta::id(id) IN $ids \
                 ORDER BY name ASC",
            )
            .bind(("ids", id_strings(ids)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CommentTagRowWithId> = result.take(0).map_err(DbError::from)?;

        let tags = rows
            .into_iter()
            .map(|row| row.try_into_tag())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(tags)
    }
}
