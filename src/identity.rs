//! Device identity: the wireless adapter's hardware address.
//!
//! Identity feeds the binding record, not authentication, so an adapter that
//! reports nothing degrades to [`DeviceIdentity::UNAVAILABLE`] instead of
//! failing. A value that is present but malformed is an error.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::error::{Result, SetupError};

/// Hardware address of this host, or the all-zero sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    /// Reported when the adapter exposes no address (usually missing permissions)
    pub const UNAVAILABLE: &'static str = "00:00:00:00:00:00";

    pub fn unavailable() -> Self {
        Self(Self::UNAVAILABLE.to_string())
    }

    /// Parse `aa:bb:cc:dd:ee:ff` (either case); stored upper-case.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let octets: Vec<&str> = trimmed.split(':').collect();
        let well_formed = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
        if !well_formed {
            return Err(SetupError::identity(format!(
                "'{}' is not a hardware address",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unavailable(&self) -> bool {
        self.0 == Self::UNAVAILABLE
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the raw hardware address.
pub trait IdentityProvider {
    /// Raw address as reported by the platform, `None` when it reports nothing.
    fn hardware_address(&self) -> Option<String>;
}

impl<P: IdentityProvider + ?Sized> IdentityProvider for &P {
    fn hardware_address(&self) -> Option<String> {
        (**self).hardware_address()
    }
}

/// Reads `/sys/class/net/<iface>/address`.
#[derive(Debug, Clone)]
pub struct SysfsIdentityProvider {
    interface: String,
    sysfs_root: PathBuf,
}

impl SysfsIdentityProvider {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            sysfs_root: PathBuf::from("/sys/class/net"),
        }
    }

    /// Point at a different tree (tests, containers with a bind-mounted sysfs)
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    fn address_path(&self) -> PathBuf {
        self.sysfs_root.join(&self.interface).join("address")
    }
}

impl IdentityProvider for SysfsIdentityProvider {
    fn hardware_address(&self) -> Option<String> {
        let path = self.address_path();
        match fs::read_to_string(&path) {
            Ok(raw) => Some(raw.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) => {
                log::debug!("Cannot read {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Always reports the same value. Used when the operator pins an address in config.
#[derive(Debug, Clone)]
pub struct FixedIdentityProvider(pub Option<String>);

impl IdentityProvider for FixedIdentityProvider {
    fn hardware_address(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Resolve this host's identity, falling back to the sentinel when the
/// provider reports nothing.
pub fn resolve_identity(provider: &dyn IdentityProvider) -> Result<DeviceIdentity> {
    match provider.hardware_address() {
        Some(raw) if !raw.trim().is_empty() => DeviceIdentity::parse(&raw),
        _ => {
            log::warn!(
                "Hardware address unavailable; permissions may not be granted. Using {}",
                DeviceIdentity::UNAVAILABLE
            );
            Ok(DeviceIdentity::unavailable())
        }
    }
}
