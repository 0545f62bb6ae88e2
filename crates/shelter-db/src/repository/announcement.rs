//! SurrealDB implementation of [`AnnouncementRepository`].

use chrono::{DateTime, Utc};
use shelter_core::error::ShelterResult;
use shelter_core::models::announcement::{Announcement, CreateAnnouncement};
use shelter_core::repository::AnnouncementRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::rows::{parse_optional_uuid, parse_uuid};

#[derive(Debug, SurrealValue)]
struct AnnouncementRow {
    group_id: Option<String>,
    author_id: String,
    title: String,
    content: String,
    send_email: bool,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl AnnouncementRow {
    fn into_announcement(self, id: Uuid) -> Result<Announcement, DbError> {
        Ok(Announcement {
            id,
            group_id: parse_optional_uuid(self.group_id.as_deref(), "group")?,
            author_id: parse_uuid(&self.author_id, "author")?,
            title: self.title,
            content: self.content,
            send_email: self.send_email,
            created_at: self.created_at,
            deleted_at: self.deleted_at,
        })
    }
}

/// SurrealDB implementation of the Announcement repository.
#[derive(Clone)]
pub struct SurrealAnnouncementRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAnnouncementRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AnnouncementRepository for SurrealAnnouncementRepository<C> {
    async fn create(&self, input: CreateAnnouncement) -> ShelterResult<Announcement> {
        let id = Uuid::now_v7();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('announcement', $id) SET \
                 group_id = $group_id, author_id = $author_id, \
                 title = $title, content = $content, \
                 send_email = $send_email",
            )
            .bind(("id", id_str.clone()))
            .bind(("group_id", input.group_id.map(|g| g.to_string())))
            .bind(("author_id", input.author_id.to_string()))
            .bind(("title", input.title))
            .bind(("content", input.content))
            .bind(("send_email", input.send_email))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AnnouncementRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("announcement", &id_str))?;

        Ok(row.into_announcement(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ShelterResult<Announcement> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('announcement', $id) \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AnnouncementRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("announcement", &id_str))?;

        Ok(row.into_announcement(id)?)
    }

    async fn delete(&self, id: Uuid) -> ShelterResult<()> {
        self.db
            .query(
                "UPDATE type::record('announcement', $id) SET \
                 deleted_at = time::now() \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
