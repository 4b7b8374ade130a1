//! The verify-and-record unit of work.
//!
//! ```text
//! PIN shape → device resolution → decision → audit row → outcome
//! ```
//!
//! A malformed PIN or an unknown device stops the flow before any row is
//! written. Once a decision exists it is always recorded, and it is only
//! returned if the record succeeded.

use crate::audit::AuditLogger;
use crate::engine::{AccessDecisionEngine, Verdict, validate_pin};
use crate::error::AccessResult;
use crate::models::AccessLog;
use crate::registry::{DeviceRegistry, DeviceScope};
use crate::store::AccessStore;
use keygate_core::{AccessDefaults, TenancyMode};
use std::net::IpAddr;
use tracing::{info, warn};

/// Inbound verification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub pin: Option<String>,
    /// Address of the requesting device
    pub origin: IpAddr,
    /// Device the keypad claims to be; must agree with `origin` in
    /// multi-tenant mode
    pub device_id: Option<i64>,
}

impl VerificationRequest {
    pub fn new(pin: impl Into<String>, origin: IpAddr) -> Self {
        Self {
            pin: Some(pin.into()),
            origin,
            device_id: None,
        }
    }

    pub fn with_device_id(mut self, device_id: i64) -> Self {
        self.device_id = Some(device_id);
        self
    }
}

/// A recorded decision.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub scope: DeviceScope,
    pub verdict: Verdict,
    pub log: AccessLog,
}

impl VerificationOutcome {
    pub fn granted(&self) -> bool {
        self.verdict.granted
    }

    pub fn message(&self) -> String {
        self.verdict.message()
    }
}

/// Composes the registry, engine and audit logger over one store.
#[derive(Debug, Clone)]
pub struct AccessService<S> {
    registry: DeviceRegistry<S>,
    engine: AccessDecisionEngine<S>,
    audit: AuditLogger<S>,
}

impl<S: AccessStore + Clone> AccessService<S> {
    pub fn new(store: S, defaults: AccessDefaults, tenancy: TenancyMode) -> Self {
        Self {
            registry: DeviceRegistry::new(store.clone(), tenancy),
            engine: AccessDecisionEngine::new(store.clone(), defaults),
            audit: AuditLogger::new(store),
        }
    }

    pub fn tenancy(&self) -> TenancyMode {
        self.registry.tenancy()
    }

    /// Verify a PIN and record the decision.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a missing or malformed PIN (nothing recorded)
    /// - `DeviceNotFound` when the origin matches no active device, or the
    ///   request names a different device than its origin (nothing recorded)
    /// - `Persistence` when a read or the audit write fails
    pub async fn verify_access(
        &self,
        request: &VerificationRequest,
    ) -> AccessResult<VerificationOutcome> {
        let pin = validate_pin(request.pin.as_deref())?;

        let scope = self
            .registry
            .resolve_request(request.origin, request.device_id)
            .await?;

        let verdict = self.engine.decide(&scope, &pin).await?;

        let log = self
            .audit
            .record(
                &scope,
                verdict.matched_user.as_ref(),
                verdict.reason,
                request.origin,
            )
            .await?;

        if verdict.granted {
            info!(
                device = scope.name().unwrap_or("default"),
                reason = %verdict.reason,
                user_id = ?verdict.matched_user.as_ref().map(|u| u.id),
                origin = %request.origin,
                log_id = log.id,
                "Access granted"
            );
        } else {
            warn!(
                device = scope.name().unwrap_or("default"),
                origin = %request.origin,
                log_id = log.id,
                "Access denied"
            );
        }

        Ok(VerificationOutcome {
            scope,
            verdict,
            log,
        })
    }
}
