//! Operator-triggered purging of soft-deleted rows.

use chrono::{Duration, Utc};
use shelter_auth::Principal;
use shelter_core::error::{ShelterError, ShelterResult};
use shelter_core::models::maintenance::PurgeTable;
use shelter_core::repository::MaintenanceRepository;
use tracing::info;

use crate::config::ServiceConfig;

pub struct MaintenanceService<M: MaintenanceRepository> {
    maintenance: M,
    config: ServiceConfig,
}

impl<M: MaintenanceRepository> MaintenanceService<M> {
    pub fn new(maintenance: M, config: ServiceConfig) -> Self {
        Self {
            maintenance,
            config,
        }
    }

    /// Hard-delete rows of `table` that were soft-deleted more than
    /// `older_than_days` ago. Site admins only. `table` must name one of
    /// the purgeable tables and the age may not go below the configured
    /// retention floor. Returns the number of rows removed.
    pub async fn purge_deleted(
        &self,
        principal: &Principal,
        table: &str,
        older_than_days: i64,
    ) -> ShelterResult<u64> {
        if !principal.is_site_admin {
            return Err(ShelterError::AccessDenied);
        }

        let table: PurgeTable = table.parse().map_err(ShelterError::validation)?;

        let floor = self.config.purge_min_retention_days;
        if older_than_days < floor {
            return Err(ShelterError::validation(format!(
                "retention must be at least {floor} days"
            )));
        }
        let cutoff = Duration::try_days(older_than_days)
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .ok_or_else(|| ShelterError::validation("retention is out of range"))?;

        let purged = self.maintenance.purge_deleted(table, cutoff).await?;
        info!(%table, older_than_days, purged, by = %principal.user_id, "Purge completed");
        Ok(purged)
    }
}
