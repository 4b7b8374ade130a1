//! Device Registry: maps a requesting client onto the device it speaks for.

use crate::error::{AccessError, AccessResult};
use crate::models::Device;
use crate::store::AccessStore;
use keygate_core::{TenancyMode, canonical_ip};
use std::net::IpAddr;
use tracing::{debug, warn};

/// The device a verification runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceScope {
    /// A registered, active device
    Device(Device),
    /// The implicit device of a single-tenant deployment
    Default,
}

impl DeviceScope {
    /// Key used for device-scoped rows; `None` for the default device.
    pub fn device_id(&self) -> Option<i64> {
        match self {
            DeviceScope::Device(device) => Some(device.id),
            DeviceScope::Default => None,
        }
    }

    pub fn device(&self) -> Option<&Device> {
        match self {
            DeviceScope::Device(device) => Some(device),
            DeviceScope::Default => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.device().map(|d| d.name.as_str())
    }
}

/// Resolves request origins to devices. Read-only.
#[derive(Debug, Clone)]
pub struct DeviceRegistry<S> {
    store: S,
    tenancy: TenancyMode,
}

impl<S: AccessStore> DeviceRegistry<S> {
    pub fn new(store: S, tenancy: TenancyMode) -> Self {
        Self { store, tenancy }
    }

    pub fn tenancy(&self) -> TenancyMode {
        self.tenancy
    }

    /// Find the active device registered at `origin`.
    ///
    /// In single-tenant mode every origin resolves to [`DeviceScope::Default`].
    ///
    /// # Errors
    ///
    /// `AccessError::DeviceNotFound` when no active device has this address,
    /// `AccessError::Persistence` when the lookup fails.
    pub async fn resolve_device(&self, origin: IpAddr) -> AccessResult<DeviceScope> {
        if self.tenancy.is_single_tenant() {
            return Ok(DeviceScope::Default);
        }

        let address = canonical_ip(origin).to_string();
        match self.store.find_active_device_by_address(&address).await? {
            Some(device) => {
                debug!(device_id = device.id, device = %device.name, %address, "Device resolved by address");
                Ok(DeviceScope::Device(device))
            }
            None => {
                warn!(%address, "No active device registered for origin address");
                Err(AccessError::DeviceNotFound(format!(
                    "no active device registered at {address}"
                )))
            }
        }
    }

    /// Resolve the scope of a verification request.
    ///
    /// Multi-tenant requests are always resolved from `origin`. A `claimed`
    /// id is only accepted when it names that same device, so a keypad cannot
    /// borrow another door's users. Single-tenant deployments may target a
    /// registered device by id; otherwise they use the default scope.
    ///
    /// # Errors
    ///
    /// `AccessError::DeviceNotFound` when the origin matches no active
    /// device or the claimed id disagrees with it.
    pub async fn resolve_request(
        &self,
        origin: IpAddr,
        claimed: Option<i64>,
    ) -> AccessResult<DeviceScope> {
        if self.tenancy.is_single_tenant() {
            return match claimed {
                Some(id) => self.resolve_device_by_id(id).await,
                None => Ok(DeviceScope::Default),
            };
        }

        let scope = self.resolve_device(origin).await?;
        match claimed {
            Some(id) if scope.device_id() != Some(id) => {
                warn!(
                    claimed_id = id,
                    resolved_id = ?scope.device_id(),
                    origin = %canonical_ip(origin),
                    "Device id does not match the origin address"
                );
                Err(AccessError::DeviceNotFound(format!(
                    "device {id} is not registered at {}",
                    canonical_ip(origin)
                )))
            }
            _ => Ok(scope),
        }
    }

    /// Find an active device by id, regardless of tenancy.
    pub async fn resolve_device_by_id(&self, id: i64) -> AccessResult<DeviceScope> {
        match self.store.find_active_device_by_id(id).await? {
            Some(device) => {
                debug!(device_id = device.id, device = %device.name, "Device resolved by id");
                Ok(DeviceScope::Device(device))
            }
            None => {
                warn!(device_id = id, "No active device with this id");
                Err(AccessError::DeviceNotFound(format!(
                    "no active device with id {id}"
                )))
            }
        }
    }
}
