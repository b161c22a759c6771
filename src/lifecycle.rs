//! Completion lifecycle: lock marker and installer self-removal.
//!
//! The lock marker's existence is the only signal that provisioning finished;
//! its content is informational. Once the marker is written, removing the
//! installer is cosmetic, so a failed removal is logged and swallowed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

pub const LOCK_CONTENT: &str = "Wifite installed";

/// File whose presence means "already provisioned on this host".
#[derive(Debug, Clone)]
pub struct LockMarker {
    path: PathBuf,
}

impl LockMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_present(&self) -> bool {
        self.path.exists()
    }

    pub fn create(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, LOCK_CONTENT)?;
        log::debug!("Lock marker written to {}", self.path.display());
        Ok(())
    }
}

/// What happened to the installer artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactRemoval {
    Removed,
    /// Operator asked to keep it
    Kept,
    /// Removal was attempted and failed; the message is the OS error
    Failed(String),
}

/// Sleeps for the grace period. Injected so tests don't wait.
pub trait Delay {
    fn wait(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Delay for ThreadSleep {
    fn wait(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Settings for the final step.
#[derive(Debug, Clone)]
pub struct Completion {
    pub lock: LockMarker,
    pub artifact: PathBuf,
    pub grace_period: Duration,
    pub launch_hint: String,
    pub keep_artifact: bool,
}

impl Completion {
    /// Write the lock marker, announce completion, wait, remove the artifact.
    ///
    /// Only a failure to write the lock marker is an error.
    pub fn finish(&self, delay: &dyn Delay) -> Result<ArtifactRemoval> {
        self.lock.create()?;
        log::info!(
            "Installation complete. You can run Wifite with '{}'",
            self.launch_hint
        );

        if self.keep_artifact {
            log::info!("Keeping installer at {}", self.artifact.display());
            return Ok(ArtifactRemoval::Kept);
        }

        log::info!(
            "The installer will be removed in {} seconds...",
            self.grace_period.as_secs()
        );
        delay.wait(self.grace_period);

        Ok(remove_artifact(&self.artifact))
    }
}

/// Delete the installer file. Never fails; errors are logged and returned as data.
pub fn remove_artifact(path: &Path) -> ArtifactRemoval {
    match fs::remove_file(path) {
        Ok(()) => {
            log::info!("Installer removed.");
            ArtifactRemoval::Removed
        }
        Err(e) => {
            log::error!("Error removing installer {}: {}", path.display(), e);
            ArtifactRemoval::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingDelay(Cell<u32>);

    impl Delay for CountingDelay {
        fn wait(&self, _duration: Duration) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn completion(dir: &Path, keep: bool) -> Completion {
        Completion {
            lock: LockMarker::new(dir.join(".wifite_installed")),
            artifact: dir.join("installer"),
            grace_period: Duration::from_secs(3),
            launch_hint: "python wifite2/wifite.py".into(),
            keep_artifact: keep,
        }
    }

    #[test]
    fn test_finish_writes_lock_and_removes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let done = completion(dir.path(), false);
        fs::write(&done.artifact, "bin").unwrap();
        let delay = CountingDelay(Cell::new(0));

        assert_eq!(done.finish(&delay).unwrap(), ArtifactRemoval::Removed);
        assert!(done.lock.is_present());
        assert!(!done.artifact.exists());
        assert_eq!(delay.0.get(), 1);
    }

    #[test]
    fn test_missing_artifact_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let done = completion(dir.path(), false);
        let outcome = done.finish(&CountingDelay(Cell::new(0))).unwrap();
        assert!(matches!(outcome, ArtifactRemoval::Failed(_)));
        assert!(done.lock.is_present());
    }

    #[test]
    fn test_keep_artifact_skips_wait_and_removal() {
        let dir = tempfile::tempdir().unwrap();
        let done = completion(dir.path(), true);
        fs::write(&done.artifact, "bin").unwrap();
        let delay = CountingDelay(Cell::new(0));
        assert_eq!(done.finish(&delay).unwrap(), ArtifactRemoval::Kept);
        assert!(done.artifact.exists());
        assert_eq!(delay.0.get(), 0);
    }

    #[test]
    fn test_lock_marker_presence() {
        let dir = tempfile::tempdir().unwrap();
        let lock = LockMarker::new(dir.path().join("nested").join(".lock"));
        assert!(!lock.is_present());
        lock.create().unwrap();
        assert!(lock.is_present());
        assert_eq!(fs::read_to_string(lock.path()).unwrap(), LOCK_CONTENT);
    }
}
