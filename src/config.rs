//! Installer configuration.
//!
//! Every command shape the pipeline issues is data here, with defaults that
//! reproduce the stock Termux wifite2 setup. A JSON file may override any
//! subset of fields; missing fields keep their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::fetch::file_name_from_url;
use crate::commands::network::InterfaceMode;
use crate::commands::packages::{default_dependencies, DependencyStep};
use crate::confirm::AffirmativeSet;
use crate::error::SetupError;

/// Tool repository to clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySpec {
    pub url: String,
    /// Checkout directory, relative to the work directory
    pub directory: String,
}

impl Default for RepositorySpec {
    fn default() -> Self {
        Self {
            url: "https://github.com/derv82/wifite2.git".to_string(),
            directory: "wifite2".to_string(),
        }
    }
}

/// One wordlist download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordlistSpec {
    pub url: String,
    /// Destination file name inside the work directory
    pub filename: String,
}

impl WordlistSpec {
    /// Name the destination after the URL's last path segment.
    pub fn from_url(url: &str) -> Option<Self> {
        file_name_from_url(url).map(|name| Self {
            url: url.to_string(),
            filename: name.to_string(),
        })
    }
}

fn default_wordlists() -> Vec<WordlistSpec> {
    [
        "https://github.com/danielmiessler/SecLists/raw/master/Passwords/Common-Credentials/10-million-password-list-top-10000.txt",
        "https://github.com/brannondorsey/naive-hashcat/releases/download/data/rockyou.txt",
    ]
    .into_iter()
    .filter_map(WordlistSpec::from_url)
    .collect()
}

/// Resolved locations of the persisted state files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub binding: PathBuf,
    pub lock: PathBuf,
    pub log: PathBuf,
}

/// Installer configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    // Persisted state
    /// Directory holding binding, lock and log files; `$HOME` when unset
    pub state_dir: Option<PathBuf>,
    pub binding_file: String,
    pub lock_file: String,
    pub log_file: String,

    // Artifact & identity
    /// Installer file to fingerprint and finally delete; the running executable when unset
    pub artifact: Option<PathBuf>,
    /// Interface whose hardware address identifies the device
    pub identity_interface: String,
    /// Pin the identity instead of reading it from the adapter
    pub device_address: Option<String>,

    // Pipeline
    /// Directory where the repository and wordlists are placed
    pub work_dir: PathBuf,
    pub probe_host: String,
    pub package_manager: String,
    pub pip: String,
    pub dependencies: Vec<DependencyStep>,
    pub repository: RepositorySpec,
    pub monitor_interface: String,
    pub monitor_mode: InterfaceMode,
    pub wordlists: Vec<WordlistSpec>,

    // Prompts & lifecycle
    pub affirmative: Vec<String>,
    pub grace_period_secs: u64,
    /// Printed on completion
    pub launch_hint: String,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            binding_file: ".wifite_hash".to_string(),
            lock_file: ".wifite_installed".to_string(),
            log_file: "wifite_installer.log".to_string(),
            artifact: None,
            identity_interface: "wlan0".to_string(),
            device_address: None,
            work_dir: PathBuf::from("."),
            probe_host: "8.8.8.8".to_string(),
            package_manager: "pkg".to_string(),
            pip: "pip".to_string(),
            dependencies: default_dependencies(),
            repository: RepositorySpec::default(),
            monitor_interface: "wlan0".to_string(),
            monitor_mode: InterfaceMode::Monitor,
            wordlists: default_wordlists(),
            affirmative: vec!["s".to_string()],
            grace_period_secs: 3,
            launch_hint: "python wifite2/wifite.py".to_string(),
        }
    }
}

impl InstallerConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;
        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let non_empty = [
            ("binding_file", &self.binding_file),
            ("lock_file", &self.lock_file),
            ("log_file", &self.log_file),
            ("identity_interface", &self.identity_interface),
            ("probe_host", &self.probe_host),
            ("package_manager", &self.package_manager),
            ("pip", &self.pip),
            ("repository.url", &self.repository.url),
            ("repository.directory", &self.repository.directory),
            ("monitor_interface", &self.monitor_interface),
        ];
        for (field, value) in non_empty {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", field);
            }
        }

        for (field, name) in [
            ("binding_file", &self.binding_file),
            ("lock_file", &self.lock_file),
            ("log_file", &self.log_file),
        ] {
            if name.contains('/') {
                anyhow::bail!("{} must be a plain file name, got '{}'", field, name);
            }
        }

        if self.binding_file == self.lock_file {
            anyhow::bail!("binding_file and lock_file must differ");
        }

        if AffirmativeSet::new(&self.affirmative).is_empty() {
            anyhow::bail!("affirmative must contain at least one non-blank token");
        }

        for (i, step) in self.dependencies.iter().enumerate() {
            if !matches!(step, DependencyStep::IndexUpdate) && step.names().is_empty() {
                anyhow::bail!("dependencies[{}] lists no packages", i);
            }
            if step.names().iter().any(|n| n.trim().is_empty()) {
                anyhow::bail!("dependencies[{}] contains a blank package name", i);
            }
        }

        for (i, list) in self.wordlists.iter().enumerate() {
            if list.url.trim().is_empty() {
                anyhow::bail!("wordlists[{}] has an empty url", i);
            }
            let name = list.filename.trim();
            if name.is_empty() || name == "." || name == ".." || name.contains('/') {
                anyhow::bail!(
                    "wordlists[{}] filename '{}' must be a plain file name",
                    i,
                    list.filename
                );
            }
        }

        if let Some(address) = &self.device_address {
            crate::identity::DeviceIdentity::parse(address)
                .map_err(|e| anyhow::anyhow!("device_address: {}", e))?;
        }

        Ok(())
    }

    pub fn affirmative_set(&self) -> AffirmativeSet {
        AffirmativeSet::new(&self.affirmative)
    }

    pub fn grace_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.grace_period_secs)
    }

    /// State directory, defaulting to `$HOME`.
    pub fn resolve_state_dir(&self) -> crate::error::Result<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::var_os("HOME")
                .filter(|h| !h.is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| SetupError::config("HOME is not set and no state_dir configured")),
        }
    }

    pub fn state_paths(&self) -> crate::error::Result<StatePaths> {
        let dir = self.resolve_state_dir()?;
        Ok(StatePaths {
            binding: dir.join(&self.binding_file),
            lock: dir.join(&self.lock_file),
            log: dir.join(&self.log_file),
        })
    }

    /// Installer artifact, defaulting to the running executable.
    pub fn resolve_artifact(&self) -> crate::error::Result<PathBuf> {
        match &self.artifact {
            Some(path) => Ok(path.clone()),
            None => Ok(std::env::current_exe()?),
        }
    }
}
