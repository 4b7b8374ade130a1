#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::{ConfigValues, SystemConfig};
use crate::transaction;
use sqlx::SqlitePool;

/// Repository trait for per-device configuration rows
pub trait SystemConfigRepository: Send + Sync {
    /// Configuration of a device, or the global row for `None`
    async fn find_for_device(&self, device_id: Option<i64>) -> StorageResult<Option<SystemConfig>>;

    /// Write the configuration of a device, creating the row if missing
    async fn upsert(
        &self,
        device_id: Option<i64>,
        values: &ConfigValues,
    ) -> StorageResult<SystemConfig>;
}

/// SQLite implementation of SystemConfigRepository
#[derive(Debug, Clone)]
pub struct SqliteSystemConfigRepository {
    pool: SqlitePool,
}

impl SqliteSystemConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SystemConfigRepository for SqliteSystemConfigRepository {
    async fn find_for_device(&self, device_id: Option<i64>) -> StorageResult<Option<SystemConfig>> {
        let config = sqlx::query_as::<_, SystemConfig>(
            r#"
            SELECT id, device_id, admin_pin, door_open_duration, max_login_attempts, updated_at
            FROM system_configs
            WHERE device_id IS ?
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(config)
    }

    async fn upsert(
        &self,
        device_id: Option<i64>,
        values: &ConfigValues,
    ) -> StorageResult<SystemConfig> {
        let mut tx = self.pool.begin().await?;
        let config = transaction::upsert_config(&mut tx, device_id, values).await?;
        tx.commit().await?;
        Ok(config)
    }
}
