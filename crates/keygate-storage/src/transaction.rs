//! Transaction-aware operations for multi-row writes.
//!
//! These functions take an open SQLite transaction so several statements can
//! be grouped into one atomic unit. Dropping the transaction without calling
//! `commit()` rolls every statement back.
//!
//! ```no_run
//! use keygate_core::AccessDefaults;
//! use keygate_storage::{Database, transaction};
//! use keygate_storage::models::{ConfigValues, NewDevice};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::in_memory().await?;
//! let device = NewDevice::new("Lobby", "10.0.0.5", None)?;
//! let config = ConfigValues::from_defaults(&AccessDefaults::default());
//!
//! let mut tx = db.pool().begin().await?;
//! let device = transaction::create_device_with_config(&mut tx, &device, &config).await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::StorageResult;
use crate::models::{ConfigValues, Device, NewDevice, SystemConfig};
use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, Transaction};

/// Insert a device and its configuration row in one transaction.
pub async fn create_device_with_config(
    tx: &mut Transaction<'_, Sqlite>,
    device: &NewDevice,
    config: &ConfigValues,
) -> StorageResult<Device> {
    let now = Utc::now();

    let created = sqlx::query_as::<_, Device>(
        r#"
        INSERT INTO devices (name, address, description, is_active, created_at, updated_at)
        VALUES (?, ?, ?, 1, ?, ?)
        RETURNING id, name, address, description, is_active, created_at, updated_at
        "#,
    )
    .bind(&device.name)
    .bind(&device.address)
    .bind(&device.description)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    upsert_config(&mut **tx, Some(created.id), config).await?;

    Ok(created)
}

/// Insert or replace the configuration row of a device (`None` is global).
///
/// Uses update-then-insert because the uniqueness index is an expression
/// (`IFNULL(device_id, -1)`), which `ON CONFLICT` cannot target.
pub async fn upsert_config(
    conn: &mut SqliteConnection,
    device_id: Option<i64>,
    config: &ConfigValues,
) -> StorageResult<SystemConfig> {
    let now = Utc::now();

    let updated = sqlx::query_as::<_, SystemConfig>(
        r#"
        UPDATE system_configs
        SET admin_pin = ?, door_open_duration = ?, max_login_attempts = ?, updated_at = ?
        WHERE device_id IS ?
        RETURNING id, device_id, admin_pin, door_open_duration, max_login_attempts, updated_at
        "#,
    )
    .bind(config.admin_pin.as_str())
    .bind(config.door_open_duration)
    .bind(config.max_login_attempts)
    .bind(now)
    .bind(device_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(config) = updated {
        return Ok(config);
    }

    let inserted = sqlx::query_as::<_, SystemConfig>(
        r#"
        INSERT INTO system_configs (device_id, admin_pin, door_open_duration, max_login_attempts, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, device_id, admin_pin, door_open_duration, max_login_attempts, updated_at
        "#,
    )
    .bind(device_id)
    .bind(config.admin_pin.as_str())
    .bind(config.door_open_duration)
    .bind(config.max_login_attempts)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(inserted)
}
