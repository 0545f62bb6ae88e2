//! Row helpers shared by the repository implementations.

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

pub(crate) fn first_count(rows: &[CountRow]) -> u64 {
    rows.first().map(|r| r.total).unwrap_or(0)
}

pub(crate) fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

pub(crate) fn parse_optional_uuid(value: Option<&str>, what: &str) -> Result<Option<Uuid>, DbError> {
    value.map(|v| parse_uuid(v, what)).transpose()
}

pub(crate) fn id_strings(ids: &[Uuid]) -> Vec<String> {
    ids.iter().map(Uuid::to_string).collect()
}

/// SurrealDB rejects LIMIT values beyond the signed 64-bit range.
pub(crate) fn clamp_limit(limit: u64) -> u64 {
    limit.min(i64::MAX as u64)
}
