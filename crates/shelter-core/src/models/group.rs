//! Group domain model and the membership relation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::User;

/// A shelter group. Owns animals, announcements and skill tags, and
/// is the unit every access decision is scoped to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    pub description: String,
}

/// Role attached to a `member_of` edge. Group-admin is a property of
/// the membership, not a global role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MembershipRole {
    Member,
    Admin,
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Member => "Member",
            MembershipRole::Admin => "Admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, MembershipRole::Admin)
    }
}

impl fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Member" => Ok(MembershipRole::Member),
            "Admin" => Ok(MembershipRole::Admin),
            other => Err(format!("unknown membership role: {other}")),
        }
    }
}

/// A user together with the role they hold in a particular group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub user: User,
    pub role: MembershipRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_string_form_round_trips() {
        for role in [MembershipRole::Member, MembershipRole::Admin] {
            assert_eq!(role.as_str().parse::<MembershipRole>(), Ok(role));
        }
        assert!("Owner".parse::<MembershipRole>().is_err());
    }
}
