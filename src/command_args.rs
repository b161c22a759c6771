//! Type-safe command argument contracts.
//!
//! Every external command the installer issues is described by a struct that
//! implements [`CommandArgs`]. The struct is the single source of truth for
//! the argument shape, so `iwconfig wlan0 mode monitor` can never be
//! accidentally issued as `iwconfig mode wlan0 monitor`.

use crate::command_runner::CommandSpec;
use std::path::Path;

/// Trait for typed command arguments.
///
/// # Contract
///
/// - `program()`: executable name resolved through `PATH`.
/// - `to_args()`: arguments exactly as the program expects them.
/// - `is_mutating()`: whether running the command changes host state.
pub trait CommandArgs {
    fn program(&self) -> &str;

    fn to_args(&self) -> Vec<String>;

    /// Commands that only observe (reachability probe) return false.
    fn is_mutating(&self) -> bool {
        true
    }

    /// Build a runnable spec from the typed arguments.
    fn to_spec(&self) -> CommandSpec {
        let spec = CommandSpec::new(self.program(), self.to_args());
        if self.is_mutating() { spec } else { spec.read_only() }
    }

    /// Same as [`to_spec`](Self::to_spec) but run inside `dir`.
    fn to_spec_in(&self, dir: &Path) -> CommandSpec {
        self.to_spec().in_dir(dir)
    }
}
