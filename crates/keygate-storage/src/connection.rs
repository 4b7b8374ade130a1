//! SQLite pool for the access-control database.
//!
//! One file holds devices, users, configuration and the audit trail. The pool
//! runs in WAL mode so verification reads never wait on the audit writer, and
//! every connection enforces foreign keys (device deletion cascades rely on
//! it).

use crate::error::{StorageError, StorageResult};
use sqlx::ConnectOptions;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Where the database lives and how the pool behaves under load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// SQLite file; parent directories are created on open
    pub path: String,

    pub max_connections: u32,
    pub min_connections: u32,

    /// Connections are recycled after this long
    pub max_lifetime: Duration,

    /// A verification waiting longer than this for a connection fails with a
    /// persistence error instead of hanging
    pub acquire_timeout: Duration,

    /// How long a writer waits on SQLite's file lock
    pub busy_timeout: Duration,

    /// Apply embedded migrations right after opening
    pub migrate_on_open: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "keygate.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            max_lifetime: Duration::from_secs(30 * 60),
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(10),
            migrate_on_open: true,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn max_connections(self, max_connections: u32) -> Self {
        Self {
            max_connections,
            ..self
        }
    }

    #[must_use]
    pub fn min_connections(self, min_connections: u32) -> Self {
        Self {
            min_connections,
            ..self
        }
    }

    #[must_use]
    pub fn acquire_timeout(self, acquire_timeout: Duration) -> Self {
        Self {
            acquire_timeout,
            ..self
        }
    }

    #[must_use]
    pub fn busy_timeout(self, busy_timeout: Duration) -> Self {
        Self {
            busy_timeout,
            ..self
        }
    }

    #[must_use]
    pub fn migrate_on_open(self, migrate_on_open: bool) -> Self {
        Self {
            migrate_on_open,
            ..self
        }
    }

    /// Reject settings the pool would refuse when connecting.
    pub fn validate(&self) -> StorageResult<()> {
        let problem = if self.path.trim().is_empty() {
            Some("database path must not be empty".to_string())
        } else if self.max_connections == 0 {
            Some("max_connections must be at least 1".to_string())
        } else if self.min_connections > self.max_connections {
            Some(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            ))
        } else if self.acquire_timeout.is_zero() {
            Some("acquire_timeout must be positive".to_string())
        } else {
            None
        };

        match problem {
            Some(msg) => Err(StorageError::Configuration(msg)),
            None => Ok(()),
        }
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            .disable_statement_logging()
    }
}

/// Handle to the pooled database. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the file database described by `config`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use keygate_storage::{Database, DatabaseConfig};
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = Database::new(
    ///     DatabaseConfig::new("/var/lib/keygate/keygate.db")
    ///         .max_connections(16)
    ///         .acquire_timeout(Duration::from_secs(5)),
    /// )
    /// .await?;
    /// db.health_check().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(config: DatabaseConfig) -> StorageResult<Self> {
        config.validate()?;
        ensure_parent_dir(Path::new(&config.path))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .max_lifetime(Some(config.max_lifetime))
            .acquire_timeout(config.acquire_timeout)
            .connect_with(config.connect_options())
            .await?;

        info!(
            path = %config.path,
            max_connections = config.max_connections,
            "Database pool opened"
        );

        let db = Self { pool };
        if config.migrate_on_open {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// Private in-memory database with the schema applied, for tests and
    /// benchmarks.
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);

        // The database lives only as long as its single connection; the pool
        // must never open a second one or reap the first
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply embedded migrations. Safe to run repeatedly.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        debug!("Schema up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for checked-out connections and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// One round-trip to the database.
    pub async fn health_check(&self) -> StorageResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> StorageResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Configuration(format!(
                    "cannot create database directory {}: {e}",
                    parent.display()
                ))
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = DatabaseConfig::new("/tmp/kg.db")
            .max_connections(4)
            .min_connections(0)
            .acquire_timeout(Duration::from_millis(250))
            .busy_timeout(Duration::from_secs(1))
            .migrate_on_open(false);

        assert_eq!(config.path, "/tmp/kg.db");
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.min_connections, 0);
        assert_eq!(config.acquire_timeout, Duration::from_millis(250));
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
        assert!(!config.migrate_on_open);
        assert_eq!(config.max_lifetime, DatabaseConfig::default().max_lifetime);
    }

    #[test]
    fn test_validate() {
        assert!(DatabaseConfig::default().validate().is_ok());

        for bad in [
            DatabaseConfig::new("  "),
            DatabaseConfig::new("kg.db").max_connections(0),
            DatabaseConfig::new("kg.db").max_connections(2).min_connections(3),
            DatabaseConfig::new("kg.db").acquire_timeout(Duration::ZERO),
        ] {
            assert!(
                matches!(bad.validate(), Err(StorageError::Configuration(_))),
                "{bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_config() {
        let result = Database::new(DatabaseConfig::new("kg.db").max_connections(0)).await;
        assert!(matches!(result, Err(StorageError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_in_memory_is_migrated() {
        let db = Database::in_memory().await.unwrap();
        db.health_check().await.unwrap();

        let devices: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(devices, 0);

        db.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_in_memory_connection_is_never_recycled() {
        let db = Database::in_memory().await.unwrap();
        let options = db.pool().options();
        assert_eq!(options.get_max_connections(), 1);
        assert_eq!(options.get_min_connections(), 1);
        assert!(options.get_idle_timeout().is_none());
        assert!(options.get_max_lifetime().is_none());

        sqlx::query("INSERT INTO devices (name, address) VALUES ('Lobby', '10.0.0.5')")
            .execute(db.pool())
            .await
            .unwrap();
        let devices: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(devices, 1);
    }
}
