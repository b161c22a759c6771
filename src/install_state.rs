//! Provisioning State Machine
//!
//! Authoritative record of how far the provisioning pipeline has progressed.
//! Transitions are validated so a stage can never be skipped or re-entered.
//!
//! # Stage Flow
//!
//! ```text
//! NotStarted            (requires operator confirmation to leave)
//!     ↓
//! CheckingConnectivity  (the only stage whose failure is fatal)
//!     ↓
//! InstallingDependencies
//!     ↓
//! FetchingRepository
//!     ↓
//! EnablingMonitorMode
//!     ↓
//! FetchingWordlists
//!     ↓
//! Finalizing
//!     ↓
//! Completed
//!
//! (Any non-terminal stage can transition to Failed)
//! ```

use strum::Display;
use thiserror::Error;

/// Provisioning stages in sequential order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[repr(u8)]
pub enum InstallStage {
    #[strum(serialize = "Not started")]
    NotStarted = 0,

    /// Single reachability probe
    #[strum(serialize = "Checking internet connection")]
    CheckingConnectivity = 1,

    #[strum(serialize = "Installing dependencies")]
    InstallingDependencies = 2,

    /// Clone of the tool repository (skipped if already present)
    #[strum(serialize = "Fetching tool repository")]
    FetchingRepository = 3,

    /// Best-effort interface down / mode monitor / up
    #[strum(serialize = "Enabling monitor mode")]
    EnablingMonitorMode = 4,

    /// Optional, operator-gated
    #[strum(serialize = "Fetching wordlists")]
    FetchingWordlists = 5,

    /// Lock marker, grace period, artifact removal
    #[strum(serialize = "Finalizing installation")]
    Finalizing = 6,

    #[strum(serialize = "Installation complete")]
    Completed = 7,

    #[strum(serialize = "Installation failed")]
    Failed = 255,
}

impl InstallStage {
    #[inline]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Returns true if this is a terminal state (Completed or Failed)
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns the next stage in the sequence, or None if at a terminal state
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::CheckingConnectivity),
            Self::CheckingConnectivity => Some(Self::InstallingDependencies),
            Self::InstallingDependencies => Some(Self::FetchingRepository),
            Self::FetchingRepository => Some(Self::EnablingMonitorMode),
            Self::EnablingMonitorMode => Some(Self::FetchingWordlists),
            Self::FetchingWordlists => Some(Self::Finalizing),
            Self::Finalizing => Some(Self::Completed),
            Self::Completed | Self::Failed => None,
        }
    }

    /// Returns all stages in order (excluding Failed)
    pub const fn all_stages() -> &'static [Self] {
        &[
            Self::NotStarted,
            Self::CheckingConnectivity,
            Self::InstallingDependencies,
            Self::FetchingRepository,
            Self::EnablingMonitorMode,
            Self::FetchingWordlists,
            Self::Finalizing,
            Self::Completed,
        ]
    }
}

/// Errors that can occur during state transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageTransitionError {
    #[error("Cannot skip from {from} to {to}")]
    SkippedStage { from: InstallStage, to: InstallStage },

    #[error("Cannot go backwards from {from} to {to} (provisioning is forward-only)")]
    BackwardTransition { from: InstallStage, to: InstallStage },

    #[error("Cannot transition from terminal state {from}")]
    FromTerminalState { from: InstallStage },

    /// Leaving NotStarted before the confirmation gate passed
    #[error("Stage {stage} requires operator confirmation")]
    MissingConfirmation { stage: InstallStage },

    #[error("Already at stage {stage}")]
    AlreadyAtStage { stage: InstallStage },
}

/// Owns the current provisioning stage and validates every transition.
///
/// ```
/// use wifite_setup::install_state::{InstallStage, ProvisioningContext};
///
/// let mut ctx = ProvisioningContext::new();
/// ctx.confirm_operator();
/// ctx.advance().unwrap();
/// assert_eq!(ctx.current_stage(), InstallStage::CheckingConnectivity);
/// assert!(ctx.transition_to(InstallStage::Finalizing).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ProvisioningContext {
    current: InstallStage,
    failed_at: Option<InstallStage>,
    /// (stage, unix timestamp) for every transition taken
    stage_history: Vec<(InstallStage, u64)>,
    operator_confirmed: bool,
}

impl Default for ProvisioningContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvisioningContext {
    pub fn new() -> Self {
        Self {
            current: InstallStage::NotStarted,
            failed_at: None,
            stage_history: Vec::with_capacity(InstallStage::all_stages().len()),
            operator_confirmed: false,
        }
    }

    #[inline]
    pub fn current_stage(&self) -> InstallStage {
        self.current
    }

    #[inline]
    pub fn failed_at(&self) -> Option<InstallStage> {
        self.failed_at
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.current == InstallStage::Completed
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        self.current == InstallStage::Failed
    }

    pub fn stage_history(&self) -> &[(InstallStage, u64)] {
        &self.stage_history
    }

    /// Record that both confirmation prompts were answered affirmatively.
    /// One-way; cannot be revoked.
    pub fn confirm_operator(&mut self) {
        self.operator_confirmed = true;
    }

    /// Advance to the next stage in sequence.
    pub fn advance(&mut self) -> Result<InstallStage, StageTransitionError> {
        let Some(next_stage) = self.current.next() else {
            return Err(StageTransitionError::FromTerminalState { from: self.current });
        };
        self.transition_to(next_stage)
    }

    /// Transition to `target`, which must be the immediate next stage.
    pub fn transition_to(
        &mut self,
        target: InstallStage,
    ) -> Result<InstallStage, StageTransitionError> {
        if self.current.is_terminal() {
            return Err(StageTransitionError::FromTerminalState { from: self.current });
        }
        if target == self.current {
            return Err(StageTransitionError::AlreadyAtStage { stage: target });
        }
        // Failed is only reachable through fail()
        if target == InstallStage::Failed {
            return Err(StageTransitionError::SkippedStage {
                from: self.current,
                to: target,
            });
        }
        if target.order() < self.current.order() {
            return Err(StageTransitionError::BackwardTransition {
                from: self.current,
                to: target,
            });
        }
        if self.current.next() != Some(target) {
            return Err(StageTransitionError::SkippedStage {
                from: self.current,
                to: target,
            });
        }
        if self.current == InstallStage::NotStarted && !self.operator_confirmed {
            return Err(StageTransitionError::MissingConfirmation { stage: target });
        }

        self.record_stage_transition(target);
        self.current = target;
        log::debug!("Stage -> {}", target);
        Ok(target)
    }

    /// Mark provisioning as failed at the current stage.
    pub fn fail(&mut self) -> Result<(), StageTransitionError> {
        if self.current.is_terminal() {
            return Err(StageTransitionError::FromTerminalState { from: self.current });
        }
        self.failed_at = Some(self.current);
        self.record_stage_transition(InstallStage::Failed);
        self.current = InstallStage::Failed;
        Ok(())
    }

    fn record_stage_transition(&mut self, stage: InstallStage) {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.stage_history.push((stage, timestamp));
    }
}
