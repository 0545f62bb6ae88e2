//! SurrealDB implementation of [`ReportRepository`].
//!
//! Aggregations that cross tables (comment -> animal -> group) are done
//! with small per-table queries and joined here, which keeps every
//! statement a plain filtered SELECT. Animals of a soft-deleted group
//! and comments on them are left out of every figure.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use shelter_core::error::ShelterResult;
use shelter_core::models::stats::{EntityTotals, FlaggedAnimal, GroupActivity};
use shelter_core::models::user::User;
use shelter_core::repository::ReportRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::user::UserRowWithId;
use crate::error::DbError;
use crate::rows::{CountRow, clamp_limit, first_count, parse_uuid};

#[derive(Debug, SurrealValue)]
struct AnimalCountRow {
    animal_id: String,
    total: u64,
}

#[derive(Debug, SurrealValue)]
struct AnimalGroupRow {
    record_id: String,
    group_id: String,
    name: String,
}

#[derive(Debug, SurrealValue)]
struct IdRow {
    record_id: String,
}

#[derive(Debug, SurrealValue)]
struct NameRow {
    record_id: String,
    name: String,
}

#[derive(Debug, SurrealValue)]
struct FlaggedCommentRow {
    record_id: String,
    animal_id: String,
    tag_ids: Vec<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AuthorCountRow {
    author_id: String,
}

/// SurrealDB implementation of the Report repository.
#[derive(Clone)]
pub struct SurrealReportRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealReportRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Live groups among `ids`.
    async fn live_group_ids(&self, ids: Vec<String>) -> Result<HashSet<String>, DbError> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM group \
                 WHERE deleted_at = NONE AND meta::id(id) IN $ids",
            )
            .bind(("ids", ids))
            .await?;
        let rows: Vec<IdRow> = result.take(0)?;
        Ok(rows.into_iter().map(|r| r.record_id).collect())
    }

    /// Live animals among `ids` whose group is live too, keyed by
    /// record id.
    async fn live_animals(&self, ids: Vec<String>) -> Result<HashMap<String, AnimalGroupRow>, DbError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, group_id, name FROM animal \
                 WHERE deleted_at = NONE AND meta::id(id) IN $ids",
            )
            .bind(("ids", ids))
            .await?;
        let rows: Vec<AnimalGroupRow> = result.take(0)?;

        let groups = self
            .live_group_ids(rows.iter().map(|r| r.group_id.clone()).collect())
            .await?;
        Ok(rows
            .into_iter()
            .filter(|r| groups.contains(&r.group_id))
            .map(|r| (r.record_id.clone(), r))
            .collect())
    }

    /// Every live animal in a live group.
    async fn all_live_animal_ids(&self) -> Result<Vec<String>, DbError> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id FROM group WHERE deleted_at = NONE")
            .await?;
        let groups: Vec<IdRow> = result.take(0)?;
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM animal \
                 WHERE deleted_at = NONE AND group_id IN $groups",
            )
            .bind(("groups", groups.into_iter().map(|g| g.record_id).collect::<Vec<_>>()))
            .await?;
        let animals: Vec<IdRow> = result.take(0)?;
        Ok(animals.into_iter().map(|a| a.record_id).collect())
    }

    /// Live comments on `animals`, optionally only those created at or
    /// after `since`.
    async fn count_comments(&self, animals: Vec<String>, since: Option<DateTime<Utc>>) -> Result<u64, DbError> {
        if animals.is_empty() {
            return Ok(0);
        }
        let window = if since.is_some() { " AND created_at >= $since" } else { "" };
        let mut query = self
            .db
            .query(format!(
                "SELECT count() AS total FROM animal_comment \
                 WHERE deleted_at = NONE AND animal_id IN $animals{window} GROUP ALL"
            ))
            .bind(("animals", animals));
        if let Some(since) = since {
            query = query.bind(("since", since));
        }
        let mut result = query.await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(first_count(&rows))
    }
}

impl<C: Connection> ReportRepository for SurrealReportRepository<C> {
    async fn entity_totals(&self) -> ShelterResult<EntityTotals> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM user WHERE deleted_at = NONE GROUP ALL; \
                 SELECT count() AS total FROM group WHERE deleted_at = NONE GROUP ALL",
            )
            .await
            .map_err(DbError::from)?;

        let users: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let groups: Vec<CountRow> = result.take(1).map_err(DbError::from)?;

        let animals = self.all_live_animal_ids().await?;
        let animal_total = animals.len() as u64;
        let comments = self.count_comments(animals, None).await?;

        Ok(EntityTotals {
            users: first_count(&users),
            groups: first_count(&groups),
            animals: animal_total,
            comments,
        })
    }

    async fn recent_users(&self, limit: u64) -> ShelterResult<Vec<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE deleted_at = NONE \
                 ORDER BY created_at DESC, record_id DESC \
                 LIMIT $limit",
            )
            .bind(("limit", clamp_limit(limit)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let users = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(users)
    }

    async fn comment_counts_by_group(&self, since: DateTime<Utc>) -> ShelterResult<Vec<GroupActivity>> {
        let mut result = self
            .db
            .query(
                "SELECT animal_id, count() AS total FROM animal_comment \
                 WHERE deleted_at = NONE AND created_at >= $since \
                 GROUP BY animal_id",
            )
            .bind(("since", since))
            .await
            .map_err(DbError::from)?;
        let per_animal: Vec<AnimalCountRow> = result.take(0).map_err(DbError::from)?;
        if per_animal.is_empty() {
            return Ok(Vec::new());
        }

        let animals = self
            .live_animals(per_animal.iter().map(|r| r.animal_id.clone()).collect())
            .await?;

        let mut per_group: HashMap<String, u64> = HashMap::new();
        for row in per_animal {
            if let Some(animal) = animals.get(&row.animal_id) {
                *per_group.entry(animal.group_id.clone()).or_default() += row.total;
            }
        }
        if per_group.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, name FROM group \
                 WHERE deleted_at = NONE AND meta::id(id) IN $ids",
            )
            .bind(("ids", per_group.keys().cloned().collect::<Vec<_>>()))
            .await
            .map_err(DbError::from)?;
        let groups: Vec<NameRow> = result.take(0).map_err(DbError::from)?;

        let activity = groups
            .into_iter()
            .map(|g| {
                Ok(GroupActivity {
                    group_id: parse_uuid(&g.record_id, "group")?,
                    comment_count: per_group.get(&g.record_id).copied().unwrap_or(0),
                    name: g.name,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(activity)
    }

    async fn flagged_animals(&self, limit: u64) -> ShelterResult<Vec<FlaggedAnimal>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, name FROM comment_tag WHERE is_system = true")
            .await
            .map_err(DbError::from)?;
        let system_tags: Vec<NameRow> = result.take(0).map_err(DbError::from)?;
        if system_tags.is_empty() {
            return Ok(Vec::new());
        }
        let tag_names: HashMap<String, String> = system_tags
            .into_iter()
            .map(|t| (t.record_id, t.name))
            .collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, animal_id, tag_ids, created_at \
                 FROM animal_comment \
                 WHERE deleted_at = NONE AND tag_ids CONTAINSANY $tag_ids \
                 ORDER BY created_at DESC, record_id DESC",
            )
            .bind(("tag_ids", tag_names.keys().cloned().collect::<Vec<_>>()))
            .await
            .map_err(DbError::from)?;
        let mut comments: Vec<FlaggedCommentRow> = result.take(0).map_err(DbError::from)?;
        // Equal timestamps fall back to the later-created comment id.
        comments.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.record_id.cmp(&a.record_id))
        });

        // Newest comment first, so the first sighting of an animal is its
        // most recent flag.
        let mut order: Vec<String> = Vec::new();
        let mut flags: HashMap<String, (DateTime<Utc>, BTreeSet<String>)> = HashMap::new();
        for comment in comments {
            let names = comment
                .tag_ids
                .iter()
                .filter_map(|id| tag_names.get(id).cloned());
            match flags.get_mut(&comment.animal_id) {
                Some((_, set)) => set.extend(names),
                None => {
                    order.push(comment.animal_id.clone());
                    flags.insert(comment.animal_id, (comment.created_at, names.collect()));
                }
            }
        }

        let animals = self.live_animals(order.clone()).await?;

        let mut flagged = Vec::new();
        for animal_id in order {
            if flagged.len() as u64 >= limit {
                break;
            }
            let (Some(animal), Some((last_flagged_at, tags))) =
                (animals.get(&animal_id), flags.remove(&animal_id))
            else {
                continue;
            };
            flagged.push(FlaggedAnimal {
                animal_id: parse_uuid(&animal.record_id, "animal")?,
                animal_name: animal.name.clone(),
                group_id: parse_uuid(&animal.group_id, "group")?,
                tags: tags.into_iter().collect(),
                last_flagged_at,
            });
        }
        Ok(flagged)
    }

    async fn comment_count_since(&self, since: DateTime<Utc>) -> ShelterResult<u64> {
        let animals = self.all_live_animal_ids().await?;
        Ok(self.count_comments(animals, Some(since)).await?)
    }

    async fn distinct_commenters_since(&self, since: DateTime<Utc>) -> ShelterResult<u64> {
        let animals = self.all_live_animal_ids().await?;
        if animals.is_empty() {
            return Ok(0);
        }
        let mut result = self
            .db
            .query(
                "SELECT author_id FROM animal_comment \
                 WHERE deleted_at = NONE AND created_at >= $since \
                 AND animal_id IN $animals \
                 GROUP BY author_id",
            )
            .bind(("since", since))
            .bind(("animals", animals))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<AuthorCountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }

    async fn new_user_count_since(&self, since: DateTime<Utc>) -> ShelterResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE deleted_at = NONE AND created_at >= $since GROUP ALL",
            )
            .bind(("since", since))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_count(&rows))
    }
}

