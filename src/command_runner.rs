//! The single chokepoint for running external commands.
//!
//! Every package install, clone, interface change, probe and download goes
//! through a [`CommandRunner`]. A runner never returns an error: launch
//! failures and non-zero exits are both reported through
//! [`ExecutionResult::status`], so callers decide per stage whether a failure
//! is fatal or merely logged.

use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Status reported when the process could not be launched at all.
pub const LAUNCH_FAILURE_STATUS: i32 = 1;

/// Status reported when the child was killed by a signal.
pub const SIGNALLED_STATUS: i32 = -1;

/// What to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// Program plus argument vector, no shell involved
    Argv { program: String, args: Vec<String> },
    /// Raw string handed to `sh -c`
    Shell(String),
}

/// A command line plus the directory to run it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub line: CommandLine,
    pub current_dir: Option<PathBuf>,
    /// Only observes the host; dry runs still execute it
    pub read_only: bool,
}

impl CommandSpec {
    pub fn new<S: Into<String>>(program: impl Into<String>, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            line: CommandLine::Argv {
                program: program.into(),
                args: args.into_iter().map(Into::into).collect(),
            },
            current_dir: None,
            read_only: false,
        }
    }

    pub fn shell(script: impl Into<String>) -> Self {
        Self {
            line: CommandLine::Shell(script.into()),
            current_dir: None,
            read_only: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Program name (`sh` for shell lines)
    pub fn program(&self) -> &str {
        match &self.line {
            CommandLine::Argv { program, .. } => program,
            CommandLine::Shell(_) => "sh",
        }
    }

    /// Full argument vector as it would be passed to `execvp`
    pub fn argv(&self) -> Vec<String> {
        match &self.line {
            CommandLine::Argv { program, args } => {
                std::iter::once(program.clone()).chain(args.iter().cloned()).collect()
            }
            CommandLine::Shell(script) => vec!["sh".into(), "-c".into(), script.clone()],
        }
    }

    fn to_command(&self) -> Command {
        let mut cmd = match &self.line {
            CommandLine::Argv { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            CommandLine::Shell(script) => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(script);
                cmd
            }
        };
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.line {
            CommandLine::Argv { .. } => write!(f, "{}", self.argv().join(" ")),
            CommandLine::Shell(script) => write!(f, "sh -c '{}'", script),
        }
    }
}

/// Captured output of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl ExecutionResult {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            status: 0,
        }
    }

    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            status,
        }
    }

    /// The command never started (missing binary, permission denied, ...)
    pub fn launch_failure(description: impl Into<String>) -> Self {
        Self::failure(LAUNCH_FAILURE_STATUS, description)
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// Runs commands. Implemented by the real process runner, the dry-run runner
/// and test fakes.
pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec) -> ExecutionResult;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, spec: &CommandSpec) -> ExecutionResult {
        (**self).run(spec)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self, spec: &CommandSpec) -> ExecutionResult {
        (**self).run(spec)
    }
}

/// Spawns real processes, blocking until each exits.
///
/// Children get an empty stdin, have their stdout/stderr captured, and are
/// tracked in [`ChildRegistry`] while running. A child leads its own process
/// group, so reading the terminal would stop it with SIGTTIN; a command that
/// wants an answer sees end of input and fails instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, spec: &CommandSpec) -> ExecutionResult {
        log::debug!("exec: {}", spec);

        let mut cmd = spec.to_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .in_new_process_group();

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                log::error!("Error running command {}: {}", spec, e);
                return ExecutionResult::launch_failure(format!(
                    "failed to launch {}: {}",
                    spec.program(),
                    e
                ));
            }
        };

        let pid = child.id();
        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.register(pid);
        }

        let waited = child.wait_with_output();

        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.unregister(pid);
        }

        match waited {
            Ok(output) => ExecutionResult {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                status: output.status.code().unwrap_or(SIGNALLED_STATUS),
            },
            Err(e) => {
                log::error!("Error waiting for command {}: {}", spec, e);
                ExecutionResult::launch_failure(format!("failed waiting for {}: {}", spec.program(), e))
            }
        }
    }
}

/// Logs each mutating command and reports success without spawning it.
/// Read-only commands (the reachability probe) still run for real.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, spec: &CommandSpec) -> ExecutionResult {
        if spec.read_only {
            return ProcessRunner.run(spec);
        }
        log::info!("[dry-run] would execute: {}", spec);
        ExecutionResult::success("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout_and_status() {
        let result = ProcessRunner.run(&CommandSpec::new("sh", ["-c", "echo hello; exit 3"]));
        assert_eq!(result.stdout.trim(), "hello");
        assert_eq!(result.status, 3);
        assert!(!result.is_success());
    }

    #[test]
    fn test_shell_line_captures_stderr() {
        let result = ProcessRunner.run(&CommandSpec::shell("echo oops >&2"));
        assert!(result.is_success());
        assert_eq!(result.stderr.trim(), "oops");
    }

    #[test]
    fn test_command_reading_stdin_sees_end_of_input() {
        let started = std::time::Instant::now();
        let result = ProcessRunner.run(&CommandSpec::shell("read answer || exit 7; echo got $answer"));
        assert_eq!(result.status, 7);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));

        let cat = ProcessRunner.run(&CommandSpec::new("cat", Vec::<String>::new()));
        assert!(cat.is_success());
        assert!(cat.stdout.is_empty());
    }

    #[test]
    fn test_missing_binary_is_status_one() {
        let result = ProcessRunner.run(&CommandSpec::new(
            "this_binary_definitely_does_not_exist_12345",
            Vec::<String>::new(),
        ));
        assert_eq!(result.status, LAUNCH_FAILURE_STATUS);
        assert!(result.stderr.contains("failed to launch"));
    }

    #[test]
    fn test_runs_in_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProcessRunner.run(&CommandSpec::new("pwd", Vec::<String>::new()).in_dir(dir.path()));
        assert!(result.is_success());
        let reported = std::fs::canonicalize(result.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn test_argv_and_display() {
        let spec = CommandSpec::new("ping", ["-c", "1", "8.8.8.8"]);
        assert_eq!(spec.argv(), vec!["ping", "-c", "1", "8.8.8.8"]);
        assert_eq!(spec.to_string(), "ping -c 1 8.8.8.8");

        let shell = CommandSpec::shell("pkg update");
        assert_eq!(shell.program(), "sh");
        assert_eq!(shell.argv(), vec!["sh", "-c", "pkg update"]);
    }

    #[test]
    fn test_dry_run_skips_mutating_commands() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("touched");
        let spec = CommandSpec::new("touch", [marker.display().to_string()]);
        assert!(DryRunRunner.run(&spec).is_success());
        assert!(!marker.exists());
    }

    #[test]
    fn test_dry_run_executes_read_only_commands() {
        let result = DryRunRunner.run(&CommandSpec::new("false", Vec::<String>::new()).read_only());
        assert!(!result.is_success());
    }
}
