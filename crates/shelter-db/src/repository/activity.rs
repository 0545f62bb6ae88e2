//! SurrealDB implementation of [`ActivityRepository`].
//!
//! Comments reach a group through their animal, so the group's live
//! animals are resolved first and the comment query is restricted to
//! them. Author names and tag names are joined in memory.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shelter_core::error::ShelterResult;
use shelter_core::models::feed::{AnnouncementEvent, CommentEvent, FeedAuthor};
use shelter_core::repository::ActivityRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;
use crate::rows::{clamp_limit, parse_uuid};

#[derive(Debug, SurrealValue)]
struct AnimalNameRow {
    record_id: String,
    name: String,
}

#[derive(Debug, SurrealValue)]
struct CommentFeedRow {
    record_id: String,
    animal_id: String,
    author_id: String,
    content: String,
    image_url: Option<String>,
    tag_ids: Vec<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AnnouncementFeedRow {
    record_id: String,
    author_id: String,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AuthorRow {
    record_id: String,
    username: String,
    display_name: String,
}

#[derive(Debug, SurrealValue)]
struct TagNameRow {
    record_id: String,
    name: String,
}

const UNKNOWN_AUTHOR: &str = "unknown";

/// Resolve author ids to display names. Soft-deleted users keep their
/// name so their past activity stays attributable.
async fn fetch_authors<C: Connection>(
    db: &Surreal<C>,
    ids: Vec<String>,
) -> Result<HashMap<String, String>, DbError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut result = db
        .query(
            "SELECT meta::id(id) AS record_id, username, display_name \
             FROM user WHERE meta::id(id) IN $ids",
        )
        .bind(("ids", ids))
        .await?;
    let rows: Vec<AuthorRow> = result.take(0)?;

    Ok(rows
        .into_iter()
        .map(|r| {
            let name = if r.display_name.is_empty() {
                r.username
            } else {
                r.display_name
            };
            (r.record_id, name)
        })
        .collect())
}

fn author(id: &str, names: &HashMap<String, String>) -> Result<FeedAuthor, DbError> {
    Ok(FeedAuthor {
        id: parse_uuid(id, "author")?,
        name: names
            .get(id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
    })
}

fn distinct(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut values: Vec<String> = values.into_iter().collect();
    values.sort();
    values.dedup();
    values
}

/// SurrealDB implementation of the Activity repository.
#[derive(Clone)]
pub struct SurrealActivityRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealActivityRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ActivityRepository for SurrealActivityRepository<C> {
    async fn recent_comments(&self, group_id: Uuid, limit: u64) -> ShelterResult<Vec<CommentEvent>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, name FROM animal \
                 WHERE group_id = $group_id AND deleted_at = NONE",
            )
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let animals: Vec<AnimalNameRow> = result.take(0).map_err(DbError::from)?;
        if animals.is_empty() {
            return Ok(Vec::new());
        }
        let animal_names: HashMap<String, String> = animals
            .into_iter()
            .map(|a| (a.record_id, a.name))
            .collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, animal_id, author_id, \
                 content, image_url, tag_ids, created_at \
                 FROM animal_comment \
                 WHERE deleted_at = NONE AND animal_id IN $animal_ids \
                 ORDER BY created_at DESC, record_id DESC \
                 LIMIT $limit",
            )
            .bind(("animal_ids", animal_names.keys().cloned().collect::<Vec<_>>()))
            .bind(("limit", clamp_limit(limit)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CommentFeedRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let authors = fetch_authors(
            &self.db,
            distinct(rows.iter().map(|r| r.author_id.clone())),
        )
        .await?;

        let tag_ids = distinct(rows.iter().flat_map(|r| r.tag_ids.iter().cloned()));
        let tag_names: HashMap<String, String> = if tag_ids.is_empty() {
            HashMap::new()
        } else {
            let mut result = self
                .db
                .query(
                    "SELECT meta::id(id) AS record_id, name FROM comment_tag \
                     WHERE meta::id(id) IN $ids",
                )
                .bind(("ids", tag_ids))
                .await
                .map_err(DbError::from)?;
            let tags: Vec<TagNameRow> = result.take(0).map_err(DbError::from)?;
            tags.into_iter().map(|t| (t.record_id, t.name)).collect()
        };

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let mut tags: Vec<String> = Vec::new();
            for tag_id in &row.tag_ids {
                if let Some(name) = tag_names.get(tag_id)
                    && !tags.contains(name)
                {
                    tags.push(name.clone());
                }
            }
            events.push(CommentEvent {
                id: parse_uuid(&row.record_id, "comment")?,
                timestamp: row.created_at,
                author: author(&row.author_id, &authors)?,
                animal_id: parse_uuid(&row.animal_id, "animal")?,
                animal_name: animal_names
                    .get(&row.animal_id)
                    .cloned()
                    .unwrap_or_default(),
                content: row.content,
                image_url: row.image_url,
                tags,
            });
        }

        debug!(%group_id, count = events.len(), "Loaded comment events");
        Ok(events)
    }

    async fn recent_announcements(
        &self,
        group_id: Uuid,
        limit: u64,
    ) -> ShelterResult<Vec<AnnouncementEvent>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, author_id, title, \
                 content, created_at \
                 FROM announcement \
                 WHERE group_id = $group_id AND deleted_at = NONE \
                 ORDER BY created_at DESC, record_id DESC \
                 LIMIT $limit",
            )
            .bind(("group_id", group_id.to_string()))
            .bind(("limit", clamp_limit(limit)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<AnnouncementFeedRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let authors = fetch_authors(
            &self.db,
            distinct(rows.iter().map(|r| r.author_id.clone())),
        )
        .await?;

        let events = rows
            .into_iter()
            .map(|row| {
                Ok(AnnouncementEvent {
                    id: parse_uuid(&row.record_id, "announcement")?,
                    timestamp: row.created_at,
                    author: author(&row.author_id, &authors)?,
                    title: row.title,
                    content: row.content,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        debug!(%group_id, count = events.len(), "Loaded announcement events");
        Ok(events)
    }
}
