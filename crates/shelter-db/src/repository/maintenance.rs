//! SurrealDB implementation of [`MaintenanceRepository`].

use chrono::{DateTime, Utc};
use shelter_core::error::ShelterResult;
use shelter_core::models::maintenance::PurgeTable;
use shelter_core::repository::MaintenanceRepository;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;
use crate::rows::{CountRow, first_count};

/// SurrealDB implementation of the Maintenance repository.
#[derive(Clone)]
pub struct SurrealMaintenanceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMaintenanceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MaintenanceRepository for SurrealMaintenanceRepository<C> {
    async fn purge_deleted(&self, table: PurgeTable, deleted_before: DateTime<Utc>) -> ShelterResult<u64> {
        // The table name comes from a closed enum, never from caller input.
        let name = table.table_name();

        let result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM {name} \
                 WHERE deleted_at != NONE AND deleted_at < $before GROUP ALL; \
                 DELETE {name} WHERE deleted_at != NONE AND deleted_at < $before;"
            ))
            .bind(("before", deleted_before))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let count = first_count(&rows);

        info!(table = name, count, %deleted_before, "Purged soft-deleted rows");
        Ok(count)
    }
}
