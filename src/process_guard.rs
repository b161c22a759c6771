//! Child process cleanup on interrupt
//!
//! Package installs, clones and downloads can run for minutes. If the operator
//! hits Ctrl+C (or the terminal goes away) the installer must not leave a
//! half-finished `pkg install` or `wget` running on its own.
//!
//! - every child is spawned as the leader of its own process group, with a
//!   parent-death signal set
//! - running children are tracked in a registry
//! - on SIGINT/SIGTERM/SIGHUP each tracked group gets SIGTERM, then SIGKILL
//!   after a grace period

use nix::libc;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

static CHILD_REGISTRY: OnceLock<Arc<Mutex<ChildRegistry>>> = OnceLock::new();

/// PIDs of children currently being waited on.
#[derive(Debug, Default)]
pub struct ChildRegistry {
    pids: HashSet<u32>,
    terminating: bool,
}

impl ChildRegistry {
    /// Process-wide registry shared with the signal thread
    pub fn global() -> Arc<Mutex<ChildRegistry>> {
        CHILD_REGISTRY
            .get_or_init(|| Arc::new(Mutex::new(ChildRegistry::default())))
            .clone()
    }

    pub fn register(&mut self, pid: u32) {
        self.pids.insert(pid);
        log::debug!("Tracking child PID {}", pid);
    }

    pub fn unregister(&mut self, pid: u32) {
        self.pids.remove(&pid);
        log::debug!("Child PID {} finished", pid);
    }

    pub fn count(&self) -> usize {
        self.pids.len()
    }

    /// SIGTERM every tracked group, wait up to `grace`, SIGKILL survivors.
    /// Only the first call does anything.
    pub fn terminate_all(&mut self, grace: Duration) {
        if self.terminating {
            return;
        }
        self.terminating = true;

        if self.pids.is_empty() {
            return;
        }

        let targets: Vec<u32> = self.pids.iter().copied().collect();
        log::warn!("Stopping {} running command(s)", targets.len());

        for &pid in &targets {
            if signal_group(pid, Signal::SIGTERM).is_err() {
                let _ = signal_pid(pid, Signal::SIGTERM);
            }
        }

        let start = Instant::now();
        while start.elapsed() < grace {
            if targets.iter().all(|&pid| !is_process_alive(pid)) {
                self.pids.clear();
                return;
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        for &pid in targets.iter().filter(|&&pid| is_process_alive(pid)) {
            log::warn!("PID {} ignored SIGTERM, sending SIGKILL", pid);
            if signal_group(pid, Signal::SIGKILL).is_err() {
                let _ = signal_pid(pid, Signal::SIGKILL);
            }
        }
        self.pids.clear();
    }
}

fn signal_pid(pid: u32, sig: Signal) -> Result<(), nix::Error> {
    signal::kill(Pid::from_raw(pid as i32), sig)
}

/// Negative PID addresses the whole group (wget spawned by a shell, etc.)
fn signal_group(pgid: u32, sig: Signal) -> Result<(), nix::Error> {
    signal::kill(Pid::from_raw(-(pgid as i32)), sig)
}

/// Alive means the PID exists and is not a zombie.
fn is_process_alive(pid: u32) -> bool {
    if signal::kill(Pid::from_raw(pid as i32), None).is_err() {
        return false;
    }
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => stat
            .split_whitespace()
            .nth(2)
            .map(|state| !matches!(state, "Z" | "X"))
            .unwrap_or(true),
        Err(_) => true,
    }
}

/// Install the SIGINT/SIGTERM/SIGHUP handler thread.
///
/// The handler kills tracked children and exits with `128 + signal`.
pub fn init_signal_handlers() -> Result<(), std::io::Error> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            log::warn!("Interrupted by signal {}, aborting installation", sig);
            if let Ok(mut registry) = ChildRegistry::global().lock() {
                registry.terminate_all(Duration::from_secs(3));
            }
            std::process::exit(128 + sig);
        }
    });

    Ok(())
}

/// Extension trait for `std::process::Command`
pub trait CommandProcessGroup {
    /// Run the command as leader of a new process group that dies with us
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        // SAFETY: only async-signal-safe calls (setpgid, prctl) run in the child
        unsafe {
            self.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .map_err(std::io::Error::other)?;
                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
        self
    }
}
