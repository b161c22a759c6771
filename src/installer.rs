//! Top-level run: binding gate, confirmation gate, lock check, pipeline,
//! completion.
//!
//! ```text
//! binding gate ──mismatch──────────────────────────────▶ Err (exit 1)
//!      │
//! confirmation gate ──refused──────────────────────────▶ Cancelled (exit 0)
//!      │
//! lock marker present ─────────────────────────────────▶ AlreadyInstalled (exit 0)
//!      │
//! identity re-check ──unusable─────────────────────────▶ Err (exit 1)
//!      │
//! pipeline ──connectivity failure──────────────────────▶ Err (exit 1)
//!      │  (a first run writes the binding record once connectivity passes)
//!      │
//! completion (lock, grace period, remove installer) ───▶ Completed (exit 0)
//! ```

use std::path::{Path, PathBuf};

use crate::binding::{fingerprint_file, verify_binding, BindingRecord, BindingState, BindingStore};
use crate::command_runner::CommandRunner;
use crate::config::InstallerConfig;
use crate::confirm::{confirmation_gate, Confirmation, FixedAnswer, Prompter};
use crate::error::Result;
use crate::identity::{resolve_identity, DeviceIdentity, IdentityProvider};
use crate::install_state::ProvisioningContext;
use crate::lifecycle::{ArtifactRemoval, Completion, Delay, LockMarker};
use crate::pipeline::{Pipeline, PipelineReport, WordlistPolicy};

/// Per-invocation switches that are not part of the persisted configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub wordlists: WordlistPolicy,
    pub keep_artifact: bool,
    /// Answer both confirmation prompts with yes (the wordlist question is still asked)
    pub assume_yes: bool,
    /// Leave binding record, lock marker and artifact untouched
    pub dry_run: bool,
}

/// How a run that did not hit a fatal error ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed {
        report: PipelineReport,
        artifact: ArtifactRemoval,
    },
    /// Operator declined a confirmation prompt
    Cancelled,
    /// Lock marker already present
    AlreadyInstalled,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        0
    }
}

/// Process exit code for a finished run.
pub fn exit_code(result: &Result<RunOutcome>) -> i32 {
    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(_) => 1,
    }
}

/// Wires the components together. All collaborators are borrowed so the
/// caller decides which concrete runner, identity source and delay to use.
pub struct Installer<'a> {
    config: &'a InstallerConfig,
    runner: &'a dyn CommandRunner,
    identity: &'a dyn IdentityProvider,
    delay: &'a dyn Delay,
    options: RunOptions,
}

impl<'a> Installer<'a> {
    pub fn new(
        config: &'a InstallerConfig,
        runner: &'a dyn CommandRunner,
        identity: &'a dyn IdentityProvider,
        delay: &'a dyn Delay,
    ) -> Self {
        Self {
            config,
            runner,
            identity,
            delay,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Fingerprint the artifact and compare against the stored binding.
    /// Returns the gate state and the record this run would store.
    pub fn binding_gate(&self, artifact: &Path) -> Result<(BindingState, BindingRecord)> {
        let paths = self.config.state_paths()?;
        let fingerprint = fingerprint_file(artifact)?;
        let device = resolve_identity(self.identity)?;
        let candidate = BindingRecord::new(fingerprint, &device);
        let state = verify_binding(&BindingStore::new(paths.binding), &candidate)?;
        Ok((state, candidate))
    }

    fn commit_binding(&self, store: &BindingStore, record: &BindingRecord) -> Result<()> {
        if self.options.dry_run {
            log::info!("[dry-run] would bind installer to {}", record.device);
            return Ok(());
        }
        store.create(record)?;
        log::info!("Installer bound to device {}", record.device);
        Ok(())
    }

    /// Identity check right before the pipeline: the address must still be
    /// readable as a hardware address.
    fn require_identity(&self) -> Result<DeviceIdentity> {
        resolve_identity(self.identity).inspect_err(|e| {
            log::error!("Could not obtain the device address. Exiting... ({})", e);
        })
    }

    pub fn run(&self, prompter: &mut dyn Prompter) -> Result<RunOutcome> {
        let paths = self.config.state_paths()?;
        let artifact = self.config.resolve_artifact()?;

        let (binding, candidate) = self.binding_gate(&artifact)?;

        let mut ctx = ProvisioningContext::new();
        let confirmed = if self.options.assume_yes {
            confirmation_gate(&mut FixedAnswer(true))?
        } else {
            confirmation_gate(prompter)?
        };
        if confirmed == Confirmation::Cancelled {
            return Ok(RunOutcome::Cancelled);
        }
        ctx.confirm_operator();

        let lock = LockMarker::new(&paths.lock);
        if lock.is_present() {
            log::info!("The installer has already been run. Exiting...");
            return Ok(RunOutcome::AlreadyInstalled);
        }

        let device = self.require_identity()?;
        log::info!("Welcome to the Wifite installer for Termux (device {})", device);

        let store = BindingStore::new(&paths.binding);
        let report = Pipeline::new(self.config, self.runner).run(
            &mut ctx,
            self.options.wordlists,
            prompter,
            &mut || match binding {
                BindingState::Unbound => self.commit_binding(&store, &candidate),
                BindingState::Verified => Ok(()),
            },
        )?;

        ctx.advance()?;
        let artifact = self.complete(lock, artifact)?;
        ctx.advance()?;

        log::info!("Summary:");
        report.log_summary();
        Ok(RunOutcome::Completed { report, artifact })
    }

    fn complete(&self, lock: LockMarker, artifact: PathBuf) -> Result<ArtifactRemoval> {
        if self.options.dry_run {
            log::info!(
                "[dry-run] would write {} and remove {}",
                lock.path().display(),
                artifact.display()
            );
            return Ok(ArtifactRemoval::Kept);
        }
        Completion {
            lock,
            artifact,
            grace_period: self.config.grace_period(),
            launch_hint: self.config.launch_hint.clone(),
            keep_artifact: self.options.keep_artifact,
        }
        .finish(self.delay)
    }
}

/// Read-only view of the persisted state, for `status`.
#[derive(Debug)]
pub struct StateReport {
    pub binding_path: PathBuf,
    /// `Ok(None)` when unbound; `Err` when the record is corrupt or unreadable
    pub binding: Result<Option<BindingRecord>>,
    pub lock_path: PathBuf,
    pub lock_present: bool,
}

pub fn inspect_state(config: &InstallerConfig) -> Result<StateReport> {
    let paths = config.state_paths()?;
    Ok(StateReport {
        binding: BindingStore::new(&paths.binding).load(),
        binding_path: paths.binding,
        lock_present: LockMarker::new(&paths.lock).is_present(),
        lock_path: paths.lock,
    })
}
