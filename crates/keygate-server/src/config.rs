//! Server configuration loaded from a TOML file.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working single-machine setup.
//!
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0:8000"
//! cors_allowed_origins = ["*"]
//! trusted_proxy_ips = ["127.0.0.1"]
//!
//! [database]
//! path = "keygate.db"
//! max_connections = 10
//!
//! [access]
//! tenancy = "multi"
//! default_admin_pin = "8729"
//! door_open_duration = 5
//! max_login_attempts = 3
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use anyhow::{Context, Result, bail};
use keygate_core::constants::{
    DEFAULT_ADMIN_PIN, DEFAULT_DOOR_OPEN_DURATION_SECS, DEFAULT_MAX_LOGIN_ATTEMPTS,
};
use keygate_core::{AccessDefaults, Pin, TenancyMode};
use keygate_storage::DatabaseConfig;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "keygate.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub access: AccessConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,

    /// `"*"` allows any origin
    pub cors_allowed_origins: Vec<String>,

    /// Peers allowed to report the device address in `X-Forwarded-For`.
    ///
    /// When empty, forwarded headers are ignored and the socket peer address
    /// identifies the device.
    pub trusted_proxy_ips: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            trusted_proxy_ips: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "keygate.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub tenancy: TenancyMode,

    /// Admin PIN for devices without a configuration row, and the value
    /// written into every new device configuration
    pub default_admin_pin: String,

    pub door_open_duration: u32,

    /// Stored in new configurations; not enforced
    pub max_login_attempts: u32,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            tenancy: TenancyMode::default(),
            default_admin_pin: DEFAULT_ADMIN_PIN.to_string(),
            door_open_duration: DEFAULT_DOOR_OPEN_DURATION_SECS,
            max_login_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,keygate_server=info,keygate_storage=info,tower_http=info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load from `path` if given, else `./keygate.toml` if present, else
    /// built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            info!("Loading config from: {}", path.display());
            return Self::load_from_path(path);
        }

        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            info!("Loading config from: {}", fallback.display());
            return Self::load_from_path(&fallback);
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Reject settings that would fail later at runtime.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        self.trusted_proxies()?;
        self.access_defaults()?;

        if self.database.path.trim().is_empty() {
            bail!("database.path cannot be empty");
        }
        if self.database.max_connections == 0 {
            bail!("database.max_connections must be > 0");
        }
        if self.database.min_connections > self.database.max_connections {
            bail!("database.min_connections cannot exceed database.max_connections");
        }
        if self.database.acquire_timeout_secs == 0 {
            bail!("database.acquire_timeout_secs must be > 0");
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind_addr
            .parse()
            .with_context(|| format!("Invalid server.bind_addr: {}", self.server.bind_addr))
    }

    pub fn trusted_proxies(&self) -> Result<Vec<IpAddr>> {
        self.server
            .trusted_proxy_ips
            .iter()
            .map(|ip| {
                ip.trim()
                    .parse::<IpAddr>()
                    .with_context(|| format!("Invalid trusted proxy IP: {ip}"))
            })
            .collect()
    }

    /// The `[access]` section as the defaults injected into the core.
    pub fn access_defaults(&self) -> Result<AccessDefaults> {
        let pin = Pin::new(&self.access.default_admin_pin)
            .context("Invalid access.default_admin_pin")?;

        let defaults = AccessDefaults {
            admin_pin: pin,
            door_open_duration: self.access.door_open_duration,
            max_login_attempts: self.access.max_login_attempts,
        };
        defaults.validate().context("Invalid [access] section")?;
        Ok(defaults)
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .acquire_timeout(Duration::from_secs(self.database.acquire_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.access.tenancy, TenancyMode::MultiTenant);
        assert_eq!(config.access_defaults().unwrap(), AccessDefaults::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [access]
            tenancy = "single"
            default_admin_pin = "1357"

            [logging]
            json = true
            "#,
        )
        .unwrap();

        assert!(config.access.tenancy.is_single_tenant());
        assert_eq!(config.access.door_open_duration, 5);
        assert!(config.access_defaults().unwrap().admin_pin.matches("1357"));
        assert_eq!(config.server.bind_addr, "0.0.0.0:8000");
        assert!(config.logging.json);
    }

    #[rstest]
    #[case("[access]\ndefault_admin_pin = \"12\"")]
    #[case("[access]\ndoor_open_duration = 0")]
    #[case("[access]\nmax_login_attempts = 0")]
    #[case("[server]\nbind_addr = \"nowhere\"")]
    #[case("[server]\ntrusted_proxy_ips = [\"proxy.local\"]")]
    #[case("[database]\nmax_connections = 0")]
    #[case("[database]\nmin_connections = 20")]
    fn test_invalid_config_rejected(#[case] toml_str: &str) {
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_tenancy_fails_to_parse() {
        assert!(toml::from_str::<Config>("[access]\ntenancy = \"shared\"").is_err());
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keygate.toml");
        std::fs::write(&path, "[database]\npath = \"/var/lib/keygate/keygate.db\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.database.path, "/var/lib/keygate/keygate.db");

        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_database_config_mapping() {
        let mut config = Config::default();
        config.database.acquire_timeout_secs = 3;
        let db = config.database_config();
        assert_eq!(db.acquire_timeout, Duration::from_secs(3));
        assert_eq!(db.max_connections, 10);
    }
}
