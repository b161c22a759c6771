use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::InstallerConfig;
use crate::installer::RunOptions;
use crate::pipeline::WordlistPolicy;

/// wifite-setup - one-shot wifite2 installer for Termux
#[derive(Parser, Debug)]
#[command(name = "wifite-setup")]
#[command(about = "Bind, provision and self-remove: installs wifite2 and its dependencies once per device")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// JSON configuration file (missing fields keep their defaults)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for the binding record, lock marker and log (default: $HOME)
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the installer (default)
    Run(RunArgs),
    /// Show binding and lock state without changing anything
    Status,
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        file: PathBuf,
    },
    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        file: PathBuf,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Log every command instead of executing it; no state is written
    #[arg(long)]
    pub dry_run: bool,

    /// Answer yes to both confirmation prompts
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Download wordlists without asking
    #[arg(long, conflicts_with = "no_wordlists")]
    pub wordlists: bool,

    /// Skip wordlists without asking
    #[arg(long)]
    pub no_wordlists: bool,

    /// Do not delete the installer after completion
    #[arg(long)]
    pub keep_artifact: bool,

    /// Where the repository and wordlists are placed
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl RunArgs {
    pub fn wordlist_policy(&self) -> WordlistPolicy {
        match (self.wordlists, self.no_wordlists) {
            (true, _) => WordlistPolicy::Always,
            (_, true) => WordlistPolicy::Never,
            _ => WordlistPolicy::Ask,
        }
    }

    pub fn options(&self) -> RunOptions {
        RunOptions {
            wordlists: self.wordlist_policy(),
            keep_artifact: self.keep_artifact,
            assume_yes: self.yes,
            dry_run: self.dry_run,
        }
    }

    /// Apply flags that override configuration values.
    pub fn apply(&self, config: &mut InstallerConfig) {
        if let Some(dir) = &self.work_dir {
            config.work_dir = dir.clone();
        }
    }
}
