//! wifite-setup library
//!
//! One-shot provisioning for wifite2: a device binding gate, operator
//! confirmation, an ordered failure-tolerant install pipeline, and a
//! lock-marker/self-removal lifecycle that makes reruns no-ops.

pub mod binding;
pub mod cli;
pub mod command_args;
pub mod command_runner;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod error;
pub mod identity;
pub mod install_state;
pub mod installer;
pub mod lifecycle;
pub mod logging;
pub mod pipeline;
pub mod process_guard;

// Re-export main types for convenience
pub use binding::{fingerprint_file, verify_binding, BindingRecord, BindingState, BindingStore};
pub use command_args::CommandArgs;
pub use command_runner::{CommandRunner, CommandSpec, DryRunRunner, ExecutionResult, ProcessRunner};
pub use config::{InstallerConfig, RepositorySpec, WordlistSpec};
pub use confirm::{AffirmativeSet, FixedAnswer, LinePrompter, Prompter};
pub use error::{Result, SetupError};
pub use identity::{DeviceIdentity, IdentityProvider, SysfsIdentityProvider};
pub use install_state::{InstallStage, ProvisioningContext, StageTransitionError};
pub use installer::{Installer, RunOptions, RunOutcome};
pub use lifecycle::{ArtifactRemoval, LockMarker};
pub use pipeline::{Pipeline, PipelineReport, StageOutcome, WordlistPolicy};
