//! SurrealDB implementation of [`SkillTagRepository`].
//!
//! Assignments are `has_skill` edges from `user` to `skill_tag`,
//! stamped with the owning group so a whole group's set can be
//! replaced in one transaction.

use chrono::{DateTime, Utc};
use shelter_core::error::ShelterResult;
use shelter_core::models::skill_tag::{CreateSkillTag, SkillTag};
use shelter_core::repository::SkillTagRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::rows::{id_strings, parse_uuid};

#[derive(Debug, SurrealValue)]
struct SkillTagRow {
    group_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct SkillTagRowWithId {
    record_id: String,
    group_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl SkillTagRowWithId {
    fn try_into_tag(self) -> Result<SkillTag, DbError> {
        Ok(SkillTag {
            id: parse_uuid(&self.record_id, "skill tag")?,
            group_id: parse_uuid(&self.group_id, "group")?,
            name: self.name,
            created_at: self.created_at,
        })
    }
}

fn collect_tags(rows: Vec<SkillTagRowWithId>) -> Result<Vec<SkillTag>, DbError> {
    rows.into_iter().map(|row| row.try_into_tag()).collect()
}

/// SurrealDB implementation of the SkillTag repository.
#[derive(Clone)]
pub struct SurrealSkillTagRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSkillTagRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SkillTagRepository for SurrealSkillTagRepository<C> {
    async fn create(&self, input: CreateSkillTag) -> ShelterResult<SkillTag> {
        let id = Uuid::now_v7();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('skill_tag', $id) SET \
                 group_id = $group_id, name = $name",
            )
            .bind(("id", id_str.clone()))
            .bind(("group_id", input.group_id.to_string()))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SkillTagRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("skill_tag", &id_str))?;

        Ok(SkillTag {
            id,
            group_id: parse_uuid(&row.group_id, "group")?,
            name: row.name,
            created_at: row.created_at,
        })
    }

    async fn list_by_group(&self, group_id: Uuid) -> ShelterResult<Vec<SkillTag>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM skill_tag \
                 WHERE group_id = $group_id AND deleted_at = NONE \
                 ORDER BY name ASC",
            )
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SkillTagRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(collect_tags(rows)?)
    }

    async fn find_in_group(&self, group_id: Uuid, ids: &[Uuid]) -> ShelterResult<Vec<SkillTag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM skill_tag \
                 WHERE group_id = $group_id AND deleted_at = NONE \
                 AND meta::id(id) IN $ids \
                 ORDER BY name ASC",
            )
            .bind(("group_id", group_id.to_string()))
            .bind(("ids", id_strings(ids)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SkillTagRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(collect_tags(rows)?)
    }

    async fn get_user_tags(&self, group_id: Uuid, user_id: Uuid) -> ShelterResult<Vec<SkillTag>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM skill_tag \
                 WHERE group_id = $group_id AND deleted_at = NONE \
                 AND id IN (\
                     SELECT VALUE out FROM has_skill \
                     WHERE in = type::record('user', $user_id) \
                     AND group_id = $group_id\
                 ) \
                 ORDER BY name ASC",
            )
            .bind(("group_id", group_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SkillTagRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(collect_tags(rows)?)
    }

    async fn replace_user_tags(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        tag_ids: &[Uuid],
    ) -> ShelterResult<()> {
        let user_id_str = user_id.to_string();

        let mut query = String::from(
            "BEGIN TRANSACTION; \
             DELETE has_skill WHERE \
             in = type::record('user', $user_id) AND \
             group_id = $group_id; ",
        );
        for tag_id in tag_ids {
            query.push_str(&format!(
                "RELATE user:`{user_id_str}` -> has_skill -> skill_tag:`{tag_id}` \
                 SET group_id = $group_id; "
            ));
        }
        query.push_str("COMMIT TRANSACTION;");

        self.db
            .query(query)
            .bind(("user_id", user_id_str))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(%group_id, %user_id, count = tag_ids.len(), "Skill tags replaced");
        Ok(())
    }
}
