//! Remote acquisition: repository clone and file download.

use std::path::PathBuf;

use crate::command_args::CommandArgs;

/// `git clone <url> [<dir>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCloneArgs {
    pub url: String,
    /// Explicit checkout directory; git derives it from the URL when absent.
    pub directory: Option<String>,
}

impl CommandArgs for GitCloneArgs {
    fn program(&self) -> &str {
        "git"
    }

    fn to_args(&self) -> Vec<String> {
        let mut args = vec!["clone".to_string(), self.url.clone()];
        if let Some(dir) = &self.directory {
            args.push(dir.clone());
        }
        args
    }
}

/// `wget <url> -O <output>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArgs {
    pub url: String,
    pub output: PathBuf,
}

impl CommandArgs for DownloadArgs {
    fn program(&self) -> &str {
        "wget"
    }

    fn to_args(&self) -> Vec<String> {
        vec![
            self.url.clone(),
            "-O".to_string(),
            self.output.display().to_string(),
        ]
    }
}

/// Last path segment of a URL, ignoring any query string or fragment.
///
/// Returns `None` when the URL ends in `/` or has no path.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let without_suffix = url.split(['?', '#']).next().unwrap_or(url);
    let path = without_suffix
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_suffix);
    let (_, tail) = path.split_once('/')?;
    let name = tail.rsplit('/').next()?;
    (!name.is_empty()).then_some(name)
}
