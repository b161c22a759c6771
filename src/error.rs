//! Error handling module for the installer
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Outcomes that are not failures (user cancellation, already installed) are
//! modelled by `installer::RunOutcome`, never by these variants.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the installer library
#[derive(Error, Debug)]
pub enum SetupError {
    /// IO errors (state files, artifact, stdin)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The device identity could not be turned into a usable value
    #[error("Device identity unusable: {0}")]
    Identity(String),

    /// Stored binding does not match this artifact/device pair
    #[error("Binding mismatch: installer was already bound to another device or build")]
    BindingMismatch {
        stored_fingerprint: String,
        stored_device: String,
        fingerprint: String,
        device: String,
    },

    /// Binding record exists but is not `hash,device`
    #[error("Binding record at {path:?} is corrupt: {reason}")]
    CorruptBinding { path: PathBuf, reason: String },

    /// The installer artifact could not be read for fingerprinting
    #[error("Cannot read installer artifact {path:?}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reachability probe failed
    #[error("No internet connection (probe to {host} exited with {status})")]
    Connectivity { host: String, status: i32 },

    /// Install state machine transition errors
    #[error("Install transition error: {0}")]
    Transition(#[from] crate::install_state::StageTransitionError),

    /// Prompt read failures
    #[error("Prompt error: {0}")]
    Prompt(String),
}

/// Result type alias for installer operations
pub type Result<T> = std::result::Result<T, SetupError>;

impl SetupError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an identity error
    pub fn identity(msg: impl Into<String>) -> Self {
        Self::Identity(msg.into())
    }

    /// Create a prompt error
    pub fn prompt(msg: impl Into<String>) -> Self {
        Self::Prompt(msg.into())
    }
}
