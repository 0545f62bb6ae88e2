//! SurrealDB implementation of [`GroupRepository`].
//!
//! Membership is a `member_of` edge from `user` to `group` whose
//! `role` field holds the [`MembershipRole`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shelter_core::error::ShelterResult;
use shelter_core::models::group::{CreateGroup, Group, GroupMember, MembershipRole};
use shelter_core::repository::{GroupRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::user::{EmailRow, UserRowWithId};
use crate::rows::{CountRow, first_count, parse_uuid};

/// Row read by known id.
#[derive(Debug, SurrealValue)]
struct GroupRow {
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

/// Row carrying its own id as `record_id`.
#[derive(Debug, SurrealValue)]
struct GroupRowWithId {
    record_id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl GroupRow {
    fn into_group(self, id: Uuid) -> Group {
        Group {
            id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

impl GroupRowWithId {
    fn try_into_group(self) -> Result<Group, DbError> {
        Ok(Group {
            id: parse_uuid(&self.record_id, "group")?,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct RoleRow {
    role: String,
}

#[derive(Debug, SurrealValue)]
struct MemberRoleRow {
    user_id: String,
    role: String,
}

fn parse_role(s: &str) -> Result<MembershipRole, DbError> {
    s.parse().map_err(DbError::Decode)
}

pub struct SurrealGroupRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealGroupRepository<C> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<C: Connection> SurrealGroupRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> GroupRepository for SurrealGroupRepository<C> {
    async fn create(&self, input: CreateGroup) -> ShelterResult<Group> {
        let id = Uuid::now_v7();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('group', $id) SET \
                 name = $name, description = $description",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("group", &id_str))?;

        Ok(row.into_group(id))
    }

    async fn get_by_id(&self, id: Uuid) -> ShelterResult<Group> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('group', $id) \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("group", &id_str))?;

        Ok(row.into_group(id))
    }

    async fn delete(&self, id: Uuid) -> ShelterResult<()> {
        self.db
            .query(
                "UPDATE type::record('group', $id) SET \
                 deleted_at = time::now(), updated_at = time::now() \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> ShelterResult<PaginatedResult<Group>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM group WHERE deleted_at = NONE GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = first_count(&count_rows);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE deleted_at = NONE \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        role: MembershipRole,
    ) -> ShelterResult<()> {
        let user_id_str = user_id.to_string();
        let group_id_str = group_id.to_string();

        let mut check = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE id = type::record('user', $user_id) \
                 AND deleted_at = NONE GROUP ALL; \
                 SELECT count() AS total FROM group \
                 WHERE id = type::record('group', $group_id) \
                 AND deleted_at = NONE GROUP ALL;",
            )
            .bind(("user_id", user_id_str.clone()))
            .bind(("group_id", group_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let user_count: Vec<CountRow> = check.take(0).map_err(DbError::from)?;
        if first_count(&user_count) == 0 {
            return Err(DbError::not_found("user", user_id_str).into());
        }

        let group_count: Vec<CountRow> = check.take(1).map_err(DbError::from)?;
        if first_count(&group_count) == 0 {
            return Err(DbError::not_found("group", group_id_str).into());
        }

        // Replacing the edge keeps exactly one membership per pair.
        let query = format!(
            "BEGIN TRANSACTION; \
             DELETE member_of WHERE \
             in = type::record('user', $user_id) AND \
             out = type::record('group', $group_id); \
             RELATE user:`{user_id_str}` -> member_of -> group:`{group_id_str}` \
             SET role = $role; \
             COMMIT TRANSACTION;"
        );

        self.db
            .query(query)
            .bind(("user_id", user_id_str))
            .bind(("group_id", group_id_str))
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(%group_id, %user_id, %role, "Group membership set");
        Ok(())
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> ShelterResult<()> {
        self.db
            .query(
                "DELETE member_of WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('group', $group_id)",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        info!(%group_id, %user_id, "Group membership removed");
        Ok(())
    }

    async fn get_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> ShelterResult<Option<MembershipRole>> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM group \
                 WHERE id = type::record('group', $group_id) \
                 AND deleted_at = NONE GROUP ALL; \
                 SELECT count() AS total FROM user \
                 WHERE id = type::record('user', $user_id) \
                 AND deleted_at = NONE GROUP ALL; \
                 SELECT role FROM member_of WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('group', $group_id);",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        // Edges of a soft-deleted group or user grant nothing.
        let group_count: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let user_count: Vec<CountRow> = result.take(1).map_err(DbError::from)?;
        if first_count(&group_count) == 0 || first_count(&user_count) == 0 {
            return Ok(None);
        }

        let roles: Vec<RoleRow> = result.take(2).map_err(DbError::from)?;
        let role = roles
            .first()
            .map(|r| parse_role(&r.role))
            .transpose()?;

        Ok(role)
    }

    async fn get_members(
        &self,
        group_id: Uuid,
        pagination: Pagination,
    ) -> ShelterResult<PaginatedResult<GroupMember>> {
        let group_id_str = group_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(in) AS user_id, role FROM member_of \
                 WHERE out = type::record('group', $group_id); \
                 SELECT count() AS total FROM user \
                 WHERE deleted_at = NONE \
                 AND id IN (\
                     SELECT VALUE in FROM member_of \
                     WHERE out = type::record('group', $group_id)\
                 ) GROUP ALL; \
                 SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE deleted_at = NONE \
                 AND id IN (\
                     SELECT VALUE in FROM member_of \
                     WHERE out = type::record('group', $group_id)\
                 ) \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset;",
            )
            .bind(("group_id", group_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let role_rows: Vec<MemberRoleRow> = result.take(0).map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(1).map_err(DbError::from)?;
        let user_rows: Vec<UserRowWithId> = result.take(2).map_err(DbError::from)?;

        let roles = role_rows
            .into_iter()
            .map(|r| parse_role(&r.role).map(|role| (r.user_id, role)))
            .collect::<Result<HashMap<_, _>, DbError>>()?;

        let mut items = Vec::with_capacity(user_rows.len());
        for row in user_rows {
            let user = row.try_into_user()?;
            let role = roles
                .get(&user.id.to_string())
                .copied()
                .unwrap_or(MembershipRole::Member);
            items.push(GroupMember { user, role });
        }

        Ok(PaginatedResult {
            items,
            total: first_count(&count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn get_user_groups(&self, user_id: Uuid) -> ShelterResult<Vec<Group>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE deleted_at = NONE \
                 AND id IN (\
                     SELECT VALUE out FROM member_of \
                     WHERE in = type::record('user', $user_id)\
                 ) \
                 ORDER BY name ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        let groups = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(groups)
    }

    async fn member_emails(&self, group_id: Uuid) -> ShelterResult<Vec<String>> {
        let mut result = self
            .db
            .query(
                "SELECT email FROM user \
                 WHERE deleted_at = NONE AND email != '' \
                 AND id IN (\
                     SELECT VALUE in FROM member_of \
                     WHERE out = type::record('group', $group_id)\
                 ) \
                 ORDER BY email ASC",
            )
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmailRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(|r| r.email).collect())
    }
}
