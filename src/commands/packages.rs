//! Package manager invocations.
//!
//! The installer targets Termux, so system packages go through `pkg` and the
//! Python helper package through `pip`. Both program names are configurable.

use serde::{Deserialize, Serialize};

use crate::command_args::CommandArgs;

/// `pkg update`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexUpdateArgs {
    pub manager: String,
}

impl CommandArgs for IndexUpdateArgs {
    fn program(&self) -> &str {
        &self.manager
    }

    fn to_args(&self) -> Vec<String> {
        vec!["update".to_string()]
    }
}

/// `pkg install -y <names...>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInstallArgs {
    pub manager: String,
    pub packages: Vec<String>,
    /// Answer package-manager questions automatically
    pub assume_yes: bool,
}

impl CommandArgs for PackageInstallArgs {
    fn program(&self) -> &str {
        &self.manager
    }

    fn to_args(&self) -> Vec<String> {
        let mut args = vec!["install".to_string()];
        if self.assume_yes {
            args.push("-y".to_string());
        }
        args.extend(self.packages.iter().cloned());
        args
    }
}

/// `pip install <names...>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipInstallArgs {
    pub pip: String,
    pub packages: Vec<String>,
}

impl CommandArgs for PipInstallArgs {
    fn program(&self) -> &str {
        &self.pip
    }

    fn to_args(&self) -> Vec<String> {
        let mut args = vec!["install".to_string()];
        args.extend(self.packages.iter().cloned());
        args
    }
}

/// One entry of the ordered dependency list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencyStep {
    /// Refresh the package index
    IndexUpdate,
    /// Install system packages non-interactively
    Packages { names: Vec<String> },
    /// Install scripting-support packages through pip
    PythonPackages { names: Vec<String> },
}

impl DependencyStep {
    /// Package names carried by this step (empty for an index update)
    pub fn names(&self) -> &[String] {
        match self {
            Self::IndexUpdate => &[],
            Self::Packages { names } | Self::PythonPackages { names } => names,
        }
    }

    /// Resolve to the concrete command for the given tool names.
    pub fn to_args(&self, manager: &str, pip: &str) -> Box<dyn CommandArgs> {
        match self {
            Self::IndexUpdate => Box::new(IndexUpdateArgs {
                manager: manager.to_string(),
            }),
            Self::Packages { names } => Box::new(PackageInstallArgs {
                manager: manager.to_string(),
                packages: names.clone(),
                assume_yes: true,
            }),
            Self::PythonPackages { names } => Box::new(PipInstallArgs {
                pip: pip.to_string(),
                packages: names.clone(),
            }),
        }
    }
}

/// Default dependency list, in execution order.
pub fn default_dependencies() -> Vec<DependencyStep> {
    let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    vec![
        DependencyStep::IndexUpdate,
        DependencyStep::Packages {
            names: names(&["python", "nmap", "tshark", "tcpdump", "git", "wget"]),
        },
        DependencyStep::PythonPackages {
            names: names(&["pyarmor"]),
        },
    ]
}
