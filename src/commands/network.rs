//! Network-facing commands: reachability probe and interface control.
//!
//! - `PingArgs` for `ping -c <count> <host>`
//! - `InterfaceStateArgs` for `ifconfig <iface> up|down`
//! - `InterfaceModeArgs` for `iwconfig <iface> mode <mode>`

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::command_args::CommandArgs;

// ============================================================================
// Reachability probe
// ============================================================================

/// Arguments for a single-shot `ping`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingArgs {
    pub host: String,
    /// Number of echo requests; the probe's own bound on how long it can take.
    pub count: u32,
}

impl PingArgs {
    pub fn single(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            count: 1,
        }
    }
}

impl CommandArgs for PingArgs {
    fn program(&self) -> &str {
        "ping"
    }

    fn to_args(&self) -> Vec<String> {
        vec!["-c".to_string(), self.count.to_string(), self.host.clone()]
    }

    /// A probe is read-only.
    fn is_mutating(&self) -> bool {
        false
    }
}

// ============================================================================
// Interface link state
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LinkState {
    Up,
    Down,
}

/// Arguments for `ifconfig <iface> up|down`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceStateArgs {
    pub interface: String,
    pub state: LinkState,
}

impl CommandArgs for InterfaceStateArgs {
    fn program(&self) -> &str {
        "ifconfig"
    }

    fn to_args(&self) -> Vec<String> {
        vec![self.interface.clone(), self.state.to_string()]
    }
}

// ============================================================================
// Wireless mode
// ============================================================================

/// Wireless operating mode as understood by `iwconfig`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterfaceMode {
    /// Capture every frame in range
    #[default]
    Monitor,
    /// Normal station mode
    Managed,
}

/// Arguments for `iwconfig <iface> mode <mode>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceModeArgs {
    pub interface: String,
    pub mode: InterfaceMode,
}

impl CommandArgs for InterfaceModeArgs {
    fn program(&self) -> &str {
        "iwconfig"
    }

    fn to_args(&self) -> Vec<String> {
        vec![
            self.interface.clone(),
            "mode".to_string(),
            self.mode.to_string(),
        ]
    }
}
