use anyhow::Context;
use keygate_storage::{AccessService, Database, RegistrationService, SqliteAccessStore};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;

pub struct AppState {
    pub config: Config,

    pub db: Database,

    pub access: AccessService<SqliteAccessStore>,

    pub registration: RegistrationService,

    /// Parsed `server.trusted_proxy_ips`
    pub trusted_proxies: Vec<IpAddr>,

    pub start_time: Instant,
}

impl AppState {
    /// Open the configured database (running migrations) and build the
    /// services on top of it.
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let db = Database::new(config.database_config())
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path))?;
        Self::with_database(config, db)
    }

    /// Build the state over an already opened database.
    pub fn with_database(config: Config, db: Database) -> anyhow::Result<Arc<Self>> {
        let defaults = config.access_defaults()?;
        let tenancy = config.access.tenancy;
        let trusted_proxies = config.trusted_proxies()?;

        let access = AccessService::new(
            SqliteAccessStore::new(db.pool().clone()),
            defaults.clone(),
            tenancy,
        );
        let registration = RegistrationService::new(db.pool().clone(), defaults, tenancy);

        Ok(Arc::new(Self {
            config,
            db,
            access,
            registration,
            trusted_proxies,
            start_time: Instant::now(),
        }))
    }
}
