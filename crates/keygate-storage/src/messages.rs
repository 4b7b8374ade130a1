//! Messages returned to devices and administrators.
//!
//! Keypad displays are small and not always UTF-8 capable, so every message is
//! plain ASCII Portuguese.
//!
//! ```
//! use keygate_storage::messages::DisplayMessages;
//!
//! assert_eq!(DisplayMessages::user_granted("ana"), "Acesso autorizado para ana");
//! ```

use keygate_core::AccessReason;

/// Display messages for access verification results (Portuguese/Brazilian)
pub struct DisplayMessages;

impl DisplayMessages {
    /// Admin override PIN accepted
    pub const ADMIN_GRANTED: &'static str = "Acesso admin autorizado";

    /// Neither the admin PIN nor any user PIN matched
    pub const ACCESS_DENIED: &'static str = "PIN invalido - Acesso negado";

    /// Request carried no PIN
    pub const PIN_MISSING: &'static str = "PIN nao fornecido";

    /// PIN is not exactly four digits
    pub const PIN_MALFORMED: &'static str = "PIN deve ter exatamente 4 digitos";

    /// Request origin does not match an active registered device
    pub const DEVICE_NOT_FOUND: &'static str = "Dispositivo nao cadastrado";

    /// Decision could not be recorded
    pub const INTERNAL_ERROR: &'static str = "Erro interno - tente novamente";

    /// User PIN accepted
    pub fn user_granted(username: &str) -> String {
        format!("Acesso autorizado para {username}")
    }

    /// Message for a completed decision.
    pub fn for_reason(reason: AccessReason, username: Option<&str>) -> String {
        match (reason, username) {
            (AccessReason::Admin, _) => Self::ADMIN_GRANTED.to_string(),
            (AccessReason::User, Some(name)) => Self::user_granted(name),
            (AccessReason::User, None) => "Acesso autorizado".to_string(),
            (AccessReason::NoMatch, _) => Self::ACCESS_DENIED.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_ascii() {
        for message in [
            DisplayMessages::ADMIN_GRANTED,
            DisplayMessages::ACCESS_DENIED,
            DisplayMessages::PIN_MISSING,
            DisplayMessages::PIN_MALFORMED,
            DisplayMessages::DEVICE_NOT_FOUND,
            DisplayMessages::INTERNAL_ERROR,
        ] {
            assert!(!message.is_empty());
            assert!(message.is_ascii(), "non-ASCII message: {message}");
        }
    }

    #[test]
    fn test_for_reason() {
        assert_eq!(
            DisplayMessages::for_reason(AccessReason::Admin, None),
            "Acesso admin autorizado"
        );
        assert_eq!(
            DisplayMessages::for_reason(AccessReason::User, Some("ana")),
            "Acesso autorizado para ana"
        );
        assert_eq!(
            DisplayMessages::for_reason(AccessReason::NoMatch, Some("ignored")),
            DisplayMessages::ACCESS_DENIED
        );
    }
}
