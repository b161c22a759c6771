//! Provisioning pipeline.
//!
//! Stages run strictly in order. Connectivity is the only stage whose failure
//! stops the run; every other stage logs failures and reports a degraded
//! outcome. Nothing is retried: a rerun of the whole installer is the retry.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::command_args::CommandArgs;
use crate::command_runner::{CommandRunner, ExecutionResult};
use crate::commands::fetch::{file_name_from_url, DownloadArgs, GitCloneArgs};
use crate::commands::network::{InterfaceModeArgs, InterfaceStateArgs, LinkState, PingArgs};
use crate::config::InstallerConfig;
use crate::confirm::Prompter;
use crate::error::{Result, SetupError};
use crate::install_state::{InstallStage, ProvisioningContext};

/// How a non-fatal stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Succeeded,
    /// Nothing to do (already present, operator declined)
    Skipped(String),
    /// Some commands failed; the stage still completed
    Degraded { failures: usize },
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "ok"),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            Self::Degraded { failures } => write!(f, "degraded ({} failure(s))", failures),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: InstallStage,
    pub outcome: StageOutcome,
}

/// Outcome of every stage that ran, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    pub fn outcome(&self, stage: InstallStage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| &r.outcome)
    }

    pub fn is_clean(&self) -> bool {
        !self
            .stages
            .iter()
            .any(|r| matches!(r.outcome, StageOutcome::Degraded { .. }))
    }

    pub fn log_summary(&self) {
        for report in &self.stages {
            log::info!("  {:<30} {}", report.stage.to_string(), report.outcome);
        }
    }
}

/// Whether the optional wordlist stage asks, always runs, or never runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordlistPolicy {
    #[default]
    Ask,
    Always,
    Never,
}

pub const WORDLIST_QUESTION: &str = "Download wordlists for dictionary attacks?";

fn log_result(result: &ExecutionResult) {
    if result.is_success() {
        let out = result.stdout.trim();
        if !out.is_empty() {
            log::info!("{}", out);
        }
    } else {
        log::error!("Error (status {}): {}", result.status, result.stderr.trim());
    }
}

/// Runs the stages against a command runner.
pub struct Pipeline<'a> {
    config: &'a InstallerConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a InstallerConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    fn work_dir(&self) -> &Path {
        &self.config.work_dir
    }

    fn exec(&self, args: &dyn CommandArgs) -> ExecutionResult {
        let spec = args.to_spec_in(self.work_dir());
        log::info!("Running: {}", spec);
        let result = self.runner.run(&spec);
        log_result(&result);
        result
    }

    /// Stage 1: single reachability probe. Failure is fatal.
    pub fn check_connectivity(&self) -> Result<StageOutcome> {
        log::info!("Checking internet connection...");
        let probe = PingArgs::single(&self.config.probe_host);
        let result = self.runner.run(&probe.to_spec());
        if !result.is_success() {
            log::error!("No internet connection. Exiting...");
            return Err(SetupError::Connectivity {
                host: self.config.probe_host.clone(),
                status: result.status,
            });
        }
        log::info!("Internet connection verified.");
        Ok(StageOutcome::Succeeded)
    }

    /// Stage 2: every configured package-manager invocation, in order.
    pub fn install_dependencies(&self) -> StageOutcome {
        log::info!("Installing dependencies...");
        let failures = self
            .config
            .dependencies
            .iter()
            .map(|step| step.to_args(&self.config.package_manager, &self.config.pip))
            .filter(|args| !self.exec(args.as_ref()).is_success())
            .count();
        degraded_if(failures)
    }

    pub fn repository_path(&self) -> PathBuf {
        self.work_dir().join(&self.config.repository.directory)
    }

    /// Stage 3: clone the tool repository unless its directory exists.
    pub fn fetch_repository(&self) -> StageOutcome {
        let repo = &self.config.repository;
        log::info!("Cloning {}...", repo.url);

        if self.repository_path().exists() {
            log::info!("{} is already cloned. Skipping clone...", repo.directory);
            return StageOutcome::Skipped(format!("{} exists", repo.directory));
        }

        // git names the checkout after the URL; only pass a directory when that differs
        let implied = file_name_from_url(&repo.url).map(|n| n.trim_end_matches(".git"));
        let clone = GitCloneArgs {
            url: repo.url.clone(),
            directory: (implied != Some(repo.directory.as_str())).then(|| repo.directory.clone()),
        };
        degraded_if(usize::from(!self.exec(&clone).is_success()))
    }

    /// Stage 4: interface down, set mode, interface up. Stops at the first
    /// failing command and carries on without monitor mode.
    pub fn enable_monitor_mode(&self) -> StageOutcome {
        log::info!("Enabling monitor mode...");
        let iface = &self.config.monitor_interface;
        let sequence: [Box<dyn CommandArgs>; 3] = [
            Box::new(InterfaceStateArgs {
                interface: iface.clone(),
                state: LinkState::Down,
            }),
            Box::new(InterfaceModeArgs {
                interface: iface.clone(),
                mode: self.config.monitor_mode,
            }),
            Box::new(InterfaceStateArgs {
                interface: iface.clone(),
                state: LinkState::Up,
            }),
        ];

        for args in &sequence {
            if !self.exec(args.as_ref()).is_success() {
                log::warn!("Could not enable monitor mode. Continuing without it.");
                return StageOutcome::Degraded { failures: 1 };
            }
        }
        StageOutcome::Succeeded
    }

    pub fn wordlist_path(&self, filename: &str) -> PathBuf {
        self.work_dir().join(filename)
    }

    /// Stage 5: optional wordlist downloads, skipping files already present.
    /// An unreadable answer counts as no; this stage never aborts the run.
    pub fn fetch_wordlists(
        &self,
        policy: WordlistPolicy,
        prompter: &mut dyn Prompter,
    ) -> StageOutcome {
        let wanted = match policy {
            WordlistPolicy::Always => true,
            WordlistPolicy::Never => false,
            WordlistPolicy::Ask => prompter.confirm(WORDLIST_QUESTION).unwrap_or_else(|e| {
                log::warn!("{}. Skipping wordlists.", e);
                false
            }),
        };
        if !wanted {
            return StageOutcome::Skipped("declined".to_string());
        }

        log::info!("Downloading wordlists...");
        let mut failures = 0;
        let mut downloaded = 0;
        for list in &self.config.wordlists {
            if self.wordlist_path(&list.filename).exists() {
                log::info!("{} already exists. Skipping download.", list.filename);
                continue;
            }
            log::info!("Downloading {}...", list.filename);
            let download = DownloadArgs {
                url: list.url.clone(),
                output: PathBuf::from(&list.filename),
            };
            if self.exec(&download).is_success() {
                downloaded += 1;
                log::info!("Download complete: {}", list.filename);
            } else {
                failures += 1;
            }
        }

        match (failures, downloaded) {
            (0, 0) => StageOutcome::Skipped("all present".to_string()),
            (0, _) => StageOutcome::Succeeded,
            (failures, _) => StageOutcome::Degraded { failures },
        }
    }

    /// Run stages 1-5, advancing `ctx` through each. On return the context
    /// sits at `FetchingWordlists`, or at `Failed` if connectivity failed.
    ///
    /// `on_connected` runs once the probe has passed; an error from it aborts
    /// the run like a failed probe.
    pub fn run(
        &self,
        ctx: &mut ProvisioningContext,
        wordlists: WordlistPolicy,
        prompter: &mut dyn Prompter,
        on_connected: &mut dyn FnMut() -> Result<()>,
    ) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();

        ctx.transition_to(InstallStage::CheckingConnectivity)?;
        match self.check_connectivity().and_then(|outcome| {
            on_connected()?;
            Ok(outcome)
        }) {
            Ok(outcome) => report.push(ctx.current_stage(), outcome),
            Err(e) => {
                ctx.fail()?;
                return Err(e);
            }
        }

        ctx.transition_to(InstallStage::InstallingDependencies)?;
        report.push(ctx.current_stage(), self.install_dependencies());

        ctx.transition_to(InstallStage::FetchingRepository)?;
        report.push(ctx.current_stage(), self.fetch_repository());

        ctx.transition_to(InstallStage::EnablingMonitorMode)?;
        report.push(ctx.current_stage(), self.enable_monitor_mode());

        ctx.transition_to(InstallStage::FetchingWordlists)?;
        report.push(ctx.current_stage(), self.fetch_wordlists(wordlists, prompter));

        Ok(report)
    }
}

impl PipelineReport {
    fn push(&mut self, stage: InstallStage, outcome: StageOutcome) {
        self.stages.push(StageReport { stage, outcome });
    }
}

fn degraded_if(failures: usize) -> StageOutcome {
    if failures == 0 {
        StageOutcome::Succeeded
    } else {
        StageOutcome::Degraded { failures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_runner::CommandSpec;
    use crate::confirm::FixedAnswer;
    use std::cell::RefCell;

    /// Records argv and fails any command whose program is in `failing`.
    struct Recorder {
        calls: RefCell<Vec<Vec<String>>>,
        failing: Vec<&'static str>,
    }

    impl Recorder {
        fn new(failing: Vec<&'static str>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                failing,
            }
        }

        fn programs(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|c| c[0].clone()).collect()
        }
    }

    impl CommandRunner for Recorder {
        fn run(&self, spec: &CommandSpec) -> ExecutionResult {
            self.calls.borrow_mut().push(spec.argv());
            if self.failing.contains(&spec.program()) {
                ExecutionResult::failure(1, "boom")
            } else {
                ExecutionResult::success("")
            }
        }
    }

    fn config_in(dir: &Path) -> InstallerConfig {
        InstallerConfig {
            work_dir: dir.to_path_buf(),
            ..InstallerConfig::default()
        }
    }

    #[test]
    fn test_connectivity_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let runner = Recorder::new(vec!["ping"]);
        let err = Pipeline::new(&config, &runner).check_connectivity().unwrap_err();
        assert!(matches!(err, SetupError::Connectivity { status: 1, .. }));
    }

    #[test]
    fn test_dependency_failures_do_not_stop_stage() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let runner = Recorder::new(vec!["pkg"]);
        let outcome = Pipeline::new(&config, &runner).install_dependencies();
        assert_eq!(outcome, StageOutcome::Degraded { failures: 2 });
        assert_eq!(runner.programs(), vec!["pkg", "pkg", "pip"]);
    }

    #[test]
    fn test_clone_skipped_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("wifite2")).unwrap();
        let config = config_in(dir.path());
        let runner = Recorder::new(vec![]);
        let outcome = Pipeline::new(&config, &runner).fetch_repository();
        assert!(matches!(outcome, StageOutcome::Skipped(_)));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_clone_uses_implied_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let runner = Recorder::new(vec![]);
        Pipeline::new(&config, &runner).fetch_repository();
        assert_eq!(
            runner.calls.borrow()[0],
            vec!["git", "clone", "https://github.com/derv82/wifite2.git"]
        );
    }

    #[test]
    fn test_monitor_mode_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let runner = Recorder::new(vec!["iwconfig"]);
        let outcome = Pipeline::new(&config, &runner).enable_monitor_mode();
        assert_eq!(outcome, StageOutcome::Degraded { failures: 1 });
        assert_eq!(runner.programs(), vec!["ifconfig", "iwconfig"]);
    }

    #[test]
    fn test_wordlists_declined_issue_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let runner = Recorder::new(vec![]);
        let outcome = Pipeline::new(&config, &runner)
            .fetch_wordlists(WordlistPolicy::Ask, &mut FixedAnswer(false));
        assert_eq!(outcome, StageOutcome::Skipped("declined".into()));
        assert!(runner.calls.borrow().is_empty());
    }

    /// Prompter whose input is gone.
    struct BrokenInput;

    impl Prompter for BrokenInput {
        fn confirm(&mut self, _question: &str) -> Result<bool> {
            Err(SetupError::prompt("cannot read answer: broken pipe"))
        }
    }

    #[test]
    fn test_unreadable_wordlist_answer_is_decline() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let runner = Recorder::new(vec![]);
        let outcome = Pipeline::new(&config, &runner).fetch_wordlists(WordlistPolicy::Ask, &mut BrokenInput);
        assert_eq!(outcome, StageOutcome::Skipped("declined".into()));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_wordlists_skip_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rockyou.txt"), "").unwrap();
        let config = config_in(dir.path());
        let runner = Recorder::new(vec![]);
        let outcome = Pipeline::new(&config, &runner)
            .fetch_wordlists(WordlistPolicy::Always, &mut FixedAnswer(false));
        assert_eq!(outcome, StageOutcome::Succeeded);
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][3], "10-million-password-list-top-10000.txt");
    }

    #[test]
    fn test_run_fails_context_on_connectivity() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let runner = Recorder::new(vec!["ping"]);
        let mut ctx = ProvisioningContext::new();
        ctx.confirm_operator();
        let mut connected = false;
        let result = Pipeline::new(&config, &runner).run(
            &mut ctx,
            WordlistPolicy::Always,
            &mut FixedAnswer(true),
            &mut || {
                connected = true;
                Ok(())
            },
        );
        assert!(result.is_err());
        assert!(!connected);
        assert_eq!(ctx.failed_at(), Some(InstallStage::CheckingConnectivity));
        assert_eq!(runner.programs(), vec!["ping"]);
    }

    #[test]
    fn test_run_reaches_wordlists_despite_failures() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let runner = Recorder::new(vec!["pkg", "pip", "git", "ifconfig", "wget"]);
        let mut ctx = ProvisioningContext::new();
        ctx.confirm_operator();
        let report = Pipeline::new(&config, &runner)
            .run(
                &mut ctx,
                WordlistPolicy::Always,
                &mut FixedAnswer(true),
                &mut || Ok(()),
            )
            .unwrap();
        assert_eq!(ctx.current_stage(), InstallStage::FetchingWordlists);
        assert_eq!(report.stages.len(), 5);
        assert!(!report.is_clean());
        assert_eq!(
            report.outcome(InstallStage::FetchingWordlists),
            Some(&StageOutcome::Degraded { failures: 2 })
        );
    }

    #[test]
    fn test_hook_error_aborts_after_probe() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let runner = Recorder::new(vec![]);
        let mut ctx = ProvisioningContext::new();
        ctx.confirm_operator();
        let result = Pipeline::new(&config, &runner).run(
            &mut ctx,
            WordlistPolicy::Never,
            &mut FixedAnswer(false),
            &mut || Err(SetupError::Prompt("hook".into())),
        );
        assert!(result.is_err());
        assert!(ctx.is_failed());
        assert_eq!(runner.programs(), vec!["ping"]);
    }
}
