//! Maintenance targets for hard-deleting soft-deleted rows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tables whose soft-deleted rows may be purged. Anything not listed
/// here cannot be named by the purge operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurgeTable {
    Animal,
    AnimalComment,
    Announcement,
    SkillTag,
}

impl PurgeTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            PurgeTable::Animal => "animal",
            PurgeTable::AnimalComment => "animal_comment",
            PurgeTable::Announcement => "announcement",
            PurgeTable::SkillTag => "skill_tag",
        }
    }
}

impl fmt::Display for PurgeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for PurgeTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "animal" | "animals" => Ok(PurgeTable::Animal),
            "animal_comment" | "comments" => Ok(PurgeTable::AnimalComment),
            "announcement" | "updates" => Ok(PurgeTable::Announcement),
            "skill_tag" | "skill_tags" => Ok(PurgeTable::SkillTag),
            other => Err(format!("table is not eligible for purge: {other}")),
        }
    }
}
