//! wifite-setup - main entry point

use anyhow::{Context, Result};
use log::{debug, error, info};
use std::io;

use wifite_setup::cli::{Cli, Commands, RunArgs};
use wifite_setup::command_runner::{CommandRunner, DryRunRunner, ProcessRunner};
use wifite_setup::config::InstallerConfig;
use wifite_setup::confirm::LinePrompter;
use wifite_setup::identity::{FixedIdentityProvider, IdentityProvider, SysfsIdentityProvider};
use wifite_setup::installer::{exit_code, inspect_state, Installer};
use wifite_setup::lifecycle::ThreadSleep;
use wifite_setup::logging::init_logger;
use wifite_setup::process_guard;

fn load_config(cli: &Cli) -> Result<InstallerConfig> {
    let mut config = match &cli.config {
        Some(path) => InstallerConfig::load_from_file(path)?,
        None => InstallerConfig::default(),
    };
    if let Some(dir) = &cli.state_dir {
        config.state_dir = Some(dir.clone());
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() {
    let cli = Cli::parse_args();

    // Commands that don't touch state run before logging is set up
    match &cli.command {
        Some(Commands::Validate { file }) => {
            let result = InstallerConfig::load_from_file(file).and_then(|c| c.validate());
            match result {
                Ok(()) => println!("✓ Configuration file is valid: {}", file.display()),
                Err(e) => {
                    eprintln!("✗ Configuration validation failed: {:#}", e);
                    std::process::exit(1);
                }
            }
            return;
        }
        Some(Commands::InitConfig { file }) => {
            if let Err(e) = InstallerConfig::default().save_to_file(file) {
                eprintln!("✗ {:#}", e);
                std::process::exit(1);
            }
            println!("✓ Default configuration written to {}", file.display());
            return;
        }
        _ => {}
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ {:#}", e);
            std::process::exit(1);
        }
    };

    let log_path = config.state_paths().ok().map(|p| p.log);
    init_logger(log_path.as_deref(), cli.verbose);

    match &cli.command {
        Some(Commands::Status) => {
            if let Err(e) = print_status(&config) {
                error!("{:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Run(args)) => std::process::exit(run_installer(config, args)),
        _ => std::process::exit(run_installer(config, &cli.run)),
    }
}

fn run_installer(mut config: InstallerConfig, args: &RunArgs) -> i32 {
    if let Err(e) = process_guard::init_signal_handlers() {
        log::warn!("Failed to initialize signal handlers: {}", e);
    }
    debug!("Signal handlers initialized");

    args.apply(&mut config);

    let runner: Box<dyn CommandRunner> = if args.dry_run {
        info!("Dry-run mode: commands are logged, not executed");
        Box::new(DryRunRunner)
    } else {
        Box::new(ProcessRunner)
    };

    let identity: Box<dyn IdentityProvider> = match &config.device_address {
        Some(address) => Box::new(FixedIdentityProvider(Some(address.clone()))),
        None => Box::new(SysfsIdentityProvider::new(config.identity_interface.clone())),
    };

    let mut prompter = LinePrompter::new(
        io::stdin().lock(),
        io::stdout(),
        config.affirmative_set(),
    );

    let result = Installer::new(&config, runner.as_ref(), identity.as_ref(), &ThreadSleep)
        .with_options(args.options())
        .run(&mut prompter);

    if let Err(e) = &result {
        error!("{}", e);
    }
    exit_code(&result)
}

fn print_status(config: &InstallerConfig) -> Result<()> {
    let state = inspect_state(config)?;

    match &state.binding {
        Ok(Some(record)) => println!(
            "binding:  {} (device {}, fingerprint {})",
            state.binding_path.display(),
            record.device,
            record.fingerprint
        ),
        Ok(None) => println!("binding:  none ({})", state.binding_path.display()),
        Err(e) => println!("binding:  unreadable: {}", e),
    }
    println!(
        "lock:     {} ({})",
        if state.lock_present { "present" } else { "absent" },
        state.lock_path.display()
    );
    Ok(())
}
