pub mod access_log;
pub mod device;
pub mod system_config;
pub mod user;

pub use access_log::{AccessLogRepository, SqliteAccessLogRepository};
pub use device::{DeviceRepository, SqliteDeviceRepository};
pub use system_config::{SqliteSystemConfigRepository, SystemConfigRepository};
pub use user::{SqliteUserRepository, UserRepository};
