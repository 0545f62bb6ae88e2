//! Animal domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimalStatus {
    Available,
    Foster,
    Quarantine,
    Adopted,
    Archived,
}

impl AnimalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimalStatus::Available => "Available",
            AnimalStatus::Foster => "Foster",
            AnimalStatus::Quarantine => "Quarantine",
            AnimalStatus::Adopted => "Adopted",
            AnimalStatus::Archived => "Archived",
        }
    }
}

impl fmt::Display for AnimalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(AnimalStatus::Available),
            "Foster" => Ok(AnimalStatus::Foster),
            "Quarantine" => Ok(AnimalStatus::Quarantine),
            "Adopted" => Ok(AnimalStatus::Adopted),
            "Archived" => Ok(AnimalStatus::Archived),
            other => Err(format!("unknown animal status: {other}")),
        }
    }
}

/// An animal in the custody of exactly one group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animal {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub species: String,
    pub status: AnimalStatus,
    /// Public URL returned by the upload handler. Stored and echoed,
    /// never inspected.
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnimal {
    pub group_id: Uuid,
    pub name: String,
    pub species: String,
    /// Defaults to `Available`.
    pub status: Option<AnimalStatus>,
    pub image_url: Option<String>,
}
