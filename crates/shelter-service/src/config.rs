//! Service-layer configuration.

use serde::Deserialize;
use shelter_core::models::feed::{DEFAULT_FEED_LIMIT, MAX_FEED_LIMIT};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Feed page size when the caller gives none (default: 20).
    pub feed_default_limit: u64,
    /// Largest feed page a caller may ask for (default: 100).
    pub feed_max_limit: u64,
    /// Concurrent email sends across all announcements (default: 4).
    pub email_workers: usize,
    /// Announcements waiting for delivery before new ones are refused
    /// (default: 256).
    pub email_queue_capacity: usize,
    /// Soft-deleted rows younger than this are never purged (default: 30).
    pub purge_min_retention_days: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            feed_default_limit: DEFAULT_FEED_LIMIT,
            feed_max_limit: MAX_FEED_LIMIT,
            email_workers: 4,
            email_queue_capacity: 256,
            purge_min_retention_days: 30,
        }
    }
}
