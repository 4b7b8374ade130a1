#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::{NewUser, User};
use chrono::Utc;
use keygate_core::Pin;
use sqlx::SqlitePool;

/// Repository trait for User entity operations
///
/// `device_id = None` addresses the deviceless users of the implicit default
/// device, never "all devices".
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<User>>;

    async fn find_by_device_and_username(
        &self,
        device_id: Option<i64>,
        username: &str,
    ) -> StorageResult<Option<User>>;

    /// Active users of the device holding `pin`, lowest id first
    async fn find_active_by_device_and_pin(
        &self,
        device_id: Option<i64>,
        pin: &Pin,
    ) -> StorageResult<Vec<User>>;

    /// Users of one device ordered by username
    async fn list_by_device(&self, device_id: Option<i64>) -> StorageResult<Vec<User>>;

    /// Every user ordered by device then username
    async fn list_all(&self) -> StorageResult<Vec<User>>;

    async fn create(&self, user: &NewUser) -> StorageResult<User>;

    async fn set_active(&self, id: i64, active: bool) -> StorageResult<User>;

    /// Delete a user; its access logs survive with `user_id` cleared
    async fn delete(&self, id: i64) -> StorageResult<()>;
}

const USER_COLUMNS: &str = "id, device_id, username, first_name, last_name, pin, password, \
                            is_active, created_at, updated_at";

/// SQLite implementation of UserRepository
#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl UserRepository for SqliteUserRepository {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_device_and_username(
        &self,
        device_id: Option<i64>,
        username: &str,
    ) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE device_id IS ? AND username = ?"
        ))
        .bind(device_id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_active_by_device_and_pin(
        &self,
        device_id: Option<i64>,
        pin: &Pin,
    ) -> StorageResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE device_id IS ? AND pin = ? AND is_active = 1
            ORDER BY id
            "#
        ))
        .bind(device_id)
        .bind(pin.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn list_by_device(&self, device_id: Option<i64>) -> StorageResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE device_id IS ? ORDER BY username"
        ))
        .bind(device_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn list_all(&self) -> StorageResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY device_id, username"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn create(&self, user: &NewUser) -> StorageResult<User> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (
                device_id, username, first_name, last_name, pin, password,
                is_active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.device_id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.pin.as_str())
        .bind(&user.password)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn set_active(&self, id: i64, active: bool) -> StorageResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = ?, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(active)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("User", "id", id))
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("User", "id", id));
        }

        Ok(())
    }
}
