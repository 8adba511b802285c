//! Preflight checks for host-side transfers.
//!
//! Validates that the copy tool is available before any artifact is touched,
//! so a missing binary fails the run up front instead of mid-import.
//!
//! # Example
//!
//! ```rust
//! use artifact_transfer::preflight::{check_required_tools, command_exists};
//!
//! if !command_exists("rsync") {
//!     println!("rsync not installed");
//! }
//!
//! let tools = &[("rsync", "rsync")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::transfer::DEFAULT_RSYNC_BIN;

/// Environment variable overriding the copy tool binary.
pub const RSYNC_BIN_ENV: &str = "ARTIFACT_TRANSFER_RSYNC";

/// Check if a command exists on the host system.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Host tools needed to execute transfers locally.
///
/// Each tuple is (command_name, package_name).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[("rsync", "rsync")];

/// Check that specific tools are available.
///
/// # Returns
///
/// * `Ok(())` if all tools are found
/// * `Err` with list of missing tools and their packages
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check that all tools in [`REQUIRED_TOOLS`] are available.
pub fn check_host_tools() -> Result<()> {
    check_required_tools(REQUIRED_TOOLS)
}

/// Resolve the copy tool binary.
///
/// Resolution order:
/// 1. `ARTIFACT_TRANSFER_RSYNC` env var
/// 2. `configured` (the config file's `rsync_bin`)
/// 3. `rsync` on `PATH`, falling back to the bare name so the command stays
///    renderable for build units whose `PATH` differs from the host's
pub fn resolve_rsync_bin(configured: Option<&Path>) -> PathBuf {
    resolve_rsync_bin_from(std::env::var_os(RSYNC_BIN_ENV).map(PathBuf::from), configured)
}

fn resolve_rsync_bin_from(from_env: Option<PathBuf>, configured: Option<&Path>) -> PathBuf {
    if let Some(path) = from_env.filter(|p| !p.as_os_str().is_empty()) {
        return path;
    }
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    which::which(DEFAULT_RSYNC_BIN).unwrap_or_else(|_| PathBuf::from(DEFAULT_RSYNC_BIN))
}
