pub mod access_log;
pub mod device;
pub mod system_config;
pub mod user;

pub use access_log::{AccessLog, AccessLogEntry, NewAccessLog};
pub use device::{Device, NewDevice};
pub use system_config::{ConfigUpdate, ConfigValues, SystemConfig};
pub use user::{NewUser, User};
