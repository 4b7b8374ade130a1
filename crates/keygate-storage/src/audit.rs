//! Audit Logger: one append-only row per completed access decision.

use crate::error::{AccessError, AccessResult};
use crate::models::{AccessLog, NewAccessLog, User};
use crate::registry::DeviceScope;
use crate::store::AccessStore;
use keygate_core::{AccessReason, canonical_ip};
use std::net::IpAddr;
use tracing::error;

#[derive(Debug, Clone)]
pub struct AuditLogger<S> {
    store: S,
}

impl<S: AccessStore> AuditLogger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Append the row for a decision.
    ///
    /// `success` follows from `reason`. The user reference is kept only for
    /// user grants.
    ///
    /// # Errors
    ///
    /// `AccessError::Persistence` if the row could not be written. Callers must
    /// not report the decision in that case.
    pub async fn record(
        &self,
        scope: &DeviceScope,
        matched_user: Option<&User>,
        reason: AccessReason,
        origin: IpAddr,
    ) -> AccessResult<AccessLog> {
        let user_id = match reason {
            AccessReason::User => matched_user.map(|u| u.id),
            AccessReason::Admin | AccessReason::NoMatch => None,
        };
        let entry = NewAccessLog::new(
            scope.device_id(),
            user_id,
            reason,
            Some(canonical_ip(origin).to_string()),
        );

        self.store.insert_access_log(&entry).await.map_err(|e| {
            error!(
                device_id = ?entry.device_id,
                reason = %reason,
                error = %e,
                "Failed to record access decision"
            );
            AccessError::Persistence(e)
        })
    }
}
