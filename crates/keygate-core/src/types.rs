use crate::{Result, constants::PIN_LENGTH, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use subtle::ConstantTimeEq;

/// Four-digit numeric PIN as typed on a device keypad.
///
/// Construction is the only place where the PIN shape is checked, so holding a
/// `Pin` means the value is exactly [`PIN_LENGTH`] ASCII digits.
///
/// # Security
/// Equality is constant-time and `Debug` never prints the digits.
#[derive(Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pin(pub(crate) String);

impl Pin {
    /// Create a new PIN with validation.
    ///
    /// No normalization is applied: surrounding whitespace makes the PIN invalid.
    ///
    /// # Errors
    /// Returns `Error::InvalidPin` if the value is not exactly 4 ASCII digits.
    pub fn new(pin: &str) -> Result<Self> {
        if pin.len() != PIN_LENGTH {
            return Err(Error::InvalidPin(format!(
                "PIN must have exactly {PIN_LENGTH} digits, got {}",
                pin.chars().count()
            )));
        }

        if !pin.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidPin(
                "PIN must contain only digits".to_string(),
            ));
        }

        Ok(Pin(pin.to_string()))
    }

    /// Get the PIN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a stored PIN string in constant time.
    #[must_use]
    pub fn matches(&self, stored: &str) -> bool {
        self.0.as_bytes().ct_eq(stored.as_bytes()).into()
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

impl PartialEq for Pin {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl std::str::FromStr for Pin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Pin::new(s)
    }
}

impl TryFrom<String> for Pin {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Pin::new(&value)
    }
}

impl From<Pin> for String {
    fn from(pin: Pin) -> String {
        pin.0
    }
}

/// Why an access decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    /// The submitted PIN equals the device admin PIN
    Admin,
    /// The submitted PIN belongs to an active user of the device
    User,
    /// Neither the admin PIN nor any user PIN matched
    NoMatch,
}

impl AccessReason {
    /// Stable wire/database representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AccessReason::Admin => "admin",
            AccessReason::User => "user",
            AccessReason::NoMatch => "no_match",
        }
    }

    /// Returns `true` when the reason implies a granted access.
    #[inline]
    #[must_use]
    pub fn is_grant(self) -> bool {
        !matches!(self, AccessReason::NoMatch)
    }
}

impl fmt::Display for AccessReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessReason {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(AccessReason::Admin),
            "user" => Ok(AccessReason::User),
            "no_match" => Ok(AccessReason::NoMatch),
            other => Err(Error::UnknownReason(other.to_string())),
        }
    }
}

/// Deployment shape of the device namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenancyMode {
    /// Every request is resolved to a registered device; PINs and
    /// configuration are scoped per device.
    #[default]
    #[serde(rename = "multi")]
    MultiTenant,
    /// One implicit device: deviceless users and the global configuration.
    #[serde(rename = "single")]
    SingleTenant,
}

impl TenancyMode {
    /// Returns `true` for single-tenant deployments.
    #[inline]
    #[must_use]
    pub fn is_single_tenant(self) -> bool {
        matches!(self, TenancyMode::SingleTenant)
    }
}

/// Parse a device network address into its canonical textual form.
///
/// Devices are matched on the exact string stored in the database, so every
/// address goes through this function before it is written or compared.
///
/// # Errors
/// Returns `Error::InvalidAddress` if the value is not an IPv4 or IPv6 address.
///
/// # Examples
///
/// ```
/// use keygate_core::canonical_address;
///
/// assert_eq!(canonical_address(" 10.0.0.5 ").unwrap(), "10.0.0.5");
/// assert_eq!(canonical_address("::FFFF:10.0.0.5").unwrap(), "10.0.0.5");
/// assert!(canonical_address("lobby").is_err());
/// ```
pub fn canonical_address(address: &str) -> Result<String> {
    let ip: IpAddr = address
        .trim()
        .parse()
        .map_err(|_| Error::InvalidAddress(format!("'{}' is not an IP address", address.trim())))?;
    Ok(canonical_ip(ip).to_string())
}

/// Fold IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) onto plain IPv4.
///
/// Dual-stack listeners report IPv4 peers in mapped form.
#[must_use]
pub fn canonical_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map_or(IpAddr::V6(v6), IpAddr::V4),
        v4 => v4,
    }
}
