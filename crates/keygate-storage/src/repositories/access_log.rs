#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::{AccessLog, AccessLogEntry, NewAccessLog};
use chrono::Utc;
use sqlx::SqlitePool;

/// Repository trait for the append-only access log
///
/// There is deliberately no update or delete: rows only disappear through the
/// device cascade.
pub trait AccessLogRepository: Send + Sync {
    /// Append a row stamped with the current time
    async fn create(&self, log: &NewAccessLog) -> StorageResult<AccessLog>;

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<AccessLog>>;

    /// Newest first (`access_time DESC, id DESC`); `None` lists every device
    async fn find_recent(
        &self,
        device_id: Option<i64>,
        limit: i64,
    ) -> StorageResult<Vec<AccessLogEntry>>;

    /// Row count; `None` counts every device
    async fn count(&self, device_id: Option<i64>) -> StorageResult<i64>;
}

const LOG_COLUMNS: &str = "id, device_id, user_id, access_time, success, reason, ip_address";

/// SQLite implementation of AccessLogRepository
#[derive(Debug, Clone)]
pub struct SqliteAccessLogRepository {
    pool: SqlitePool,
}

impl SqliteAccessLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AccessLogRepository for SqliteAccessLogRepository {
    async fn create(&self, log: &NewAccessLog) -> StorageResult<AccessLog> {
        let created = sqlx::query_as::<_, AccessLog>(&format!(
            r#"
            INSERT INTO access_logs (device_id, user_id, access_time, success, reason, ip_address)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {LOG_COLUMNS}
            "#
        ))
        .bind(log.device_id)
        .bind(log.user_id)
        .bind(Utc::now())
        .bind(log.success)
        .bind(log.reason.as_str())
        .bind(&log.ip_address)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<AccessLog>> {
        let log = sqlx::query_as::<_, AccessLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM access_logs WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(log)
    }

    async fn find_recent(
        &self,
        device_id: Option<i64>,
        limit: i64,
    ) -> StorageResult<Vec<AccessLogEntry>> {
        let logs = sqlx::query_as::<_, AccessLogEntry>(
            r#"
            SELECT l.id, l.device_id, d.name AS device_name,
                   l.user_id, u.username AS user_name,
                   l.access_time, l.success, l.reason, l.ip_address
            FROM access_logs l
            LEFT JOIN devices d ON d.id = l.device_id
            LEFT JOIN users u ON u.id = l.user_id
            WHERE ?1 IS NULL OR l.device_id = ?1
            ORDER BY l.access_time DESC, l.id DESC
            LIMIT ?2
            "#,
        )
        .bind(device_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    async fn count(&self, device_id: Option<i64>) -> StorageResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM access_logs WHERE ?1 IS NULL OR device_id = ?1")
                .bind(device_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
