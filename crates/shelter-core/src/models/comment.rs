//! Animal comments and comment tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalComment {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub tag_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub animal_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub tag_ids: Vec<Uuid>,
}

/// A label attachable to comments. Tags with `is_system` set are
/// operational alerts (e.g. "Needs Attention") and feed the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentTag {
    pub id: Uuid,
    pub name: String,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentTag {
    pub name: String,
    pub is_system: bool,
}
