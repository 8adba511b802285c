//! Host-side execution of transfer commands.
//!
//! [`HostRunner`] treats the host itself as the build unit: the command runs
//! directly with `std::process::Command` and the staging volume is just a
//! directory. Pair it with [`StagingLayout::host_only`] so the staging path
//! seen by both hops is the same directory.
//!
//! [`StagingLayout::host_only`]: crate::transfer::StagingLayout::host_only

use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{Result, TransferError};
use crate::pipeline::BuildUnitRunner;
use crate::transfer::{BuildUnit, StagingMount, TransferCommand};

/// Runs transfer commands on the local machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostRunner;

impl BuildUnitRunner for HostRunner {
    fn run_in_unit(
        &self,
        unit: &BuildUnit,
        command: &TransferCommand,
        staging: &StagingMount,
    ) -> Result<()> {
        prepare_staging_dir(&staging.host_path)?;
        run_transfer(unit.as_str(), command)
    }
}

/// Recreate an empty staging directory so stale files from an earlier run
/// never leak into the destination.
pub fn prepare_staging_dir(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Execute one transfer and map a non-zero exit to `ExecutionFailure`.
pub fn run_transfer(unit: &str, command: &TransferCommand) -> Result<()> {
    debug!(unit, command = %command, "running transfer");
    let output = Command::new(&command.rsync_bin)
        .args(command.args())
        .output()?;
    if output.status.success() {
        return Ok(());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(TransferError::ExecutionFailure {
        unit: unit.to_string(),
        status: output.status.to_string(),
        output: format!("{}\n{}", stdout.trim(), stderr.trim())
            .trim()
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ApplyOutcome, ArtifactStage, StageInstructions};
    use crate::transfer::{
        ArtifactDescriptor, CopyOptions, HostIdentity, StagingLayout, TransferPlanner,
        DEFAULT_RSYNC_BIN,
    };
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn source_tree(temp: &TempDir) -> std::path::PathBuf {
        let src = temp.path().join("src");
        write(&src, "app/config/main.toml", "main");
        write(&src, "app/config/secret/key", "hidden");
        write(&src, "app/bin/tool", "tool");
        write(&src, "README", "readme");
        write(&src, "build.log", "log");
        src
    }

    fn stage(temp: &TempDir) -> ArtifactStage<StagingLayout> {
        let planner = TransferPlanner::new(
            DEFAULT_RSYNC_BIN,
            HostIdentity::current(),
            StagingLayout::host_only(temp.path().join("staging")),
        );
        ArtifactStage::new(planner, false)
    }

    #[test]
    fn test_prepare_staging_dir_clears_previous_contents() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging/web");
        write(&staging, "stale", "old");

        prepare_staging_dir(&staging).unwrap();

        assert!(staging.is_dir());
        assert!(!staging.join("stale").exists());
    }

    #[test]
    fn test_missing_binary_is_io_error() {
        let command = TransferCommand::new(
            "/definitely/not/rsync",
            "/src",
            "/dst",
            Default::default(),
            Default::default(),
        );
        let err = run_transfer("host", &command).unwrap_err();
        assert!(matches!(err, TransferError::Io(_)));
    }

    #[test]
    #[ignore = "requires rsync"]
    fn test_two_hop_copy_honors_include_and_exclude() {
        let temp = TempDir::new().unwrap();
        let src = source_tree(&temp);
        let dst = temp.path().join("dst");

        let mut options = CopyOptions::new(&src, &dst);
        options.include_paths = vec!["app/config".into()];
        options.exclude_paths = vec!["app/config/secret".into()];
        let descriptor = ArtifactDescriptor::new("web", BuildUnit::new("host"), options);

        let mut step = StageInstructions::default();
        let outcome = stage(&temp)
            .apply_artifact(&descriptor, &HostRunner, &mut step)
            .unwrap();
        let ApplyOutcome::Applied(plan) = outcome else {
            panic!("expected an applied plan");
        };

        let staged = temp.path().join("staging/artifact/web");
        assert!(staged.join("app/config/main.toml").is_file());
        assert!(!staged.join("app/config/secret").exists());
        assert!(!staged.join("app/bin").exists());
        assert!(!staged.join("README").exists());

        run_transfer("host", &plan.inject).unwrap();
        assert_eq!(
            fs::read_to_string(dst.join("app/config/main.toml")).unwrap(),
            "main"
        );
        assert!(!dst.join("app/config/secret").exists());
        assert!(!dst.join("README").exists());
    }

    #[test]
    #[ignore = "requires rsync"]
    fn test_exclude_only_copy_keeps_everything_else() {
        let temp = TempDir::new().unwrap();
        let src = source_tree(&temp);
        let dst = temp.path().join("dst");

        let mut options = CopyOptions::new(&src, &dst);
        options.exclude_paths = vec!["*.log".into(), "app/bin".into()];
        let descriptor = ArtifactDescriptor::new("all", BuildUnit::new("host"), options);

        let mut step = StageInstructions::default();
        let ApplyOutcome::Applied(plan) = stage(&temp)
            .apply_artifact(&descriptor, &HostRunner, &mut step)
            .unwrap()
        else {
            panic!("expected an applied plan");
        };
        run_transfer("host", &plan.inject).unwrap();

        assert!(dst.join("README").is_file());
        assert!(dst.join("app/config/secret/key").is_file());
        assert!(!dst.join("build.log").exists());
        assert!(!dst.join("app/bin").exists());
    }

    #[test]
    #[ignore = "requires rsync"]
    fn test_failed_transfer_reports_execution_failure() {
        let temp = TempDir::new().unwrap();
        let command = TransferCommand::new(
            DEFAULT_RSYNC_BIN,
            temp.path().join("does-not-exist"),
            temp.path().join("dst"),
            Default::default(),
            Default::default(),
        );
        let err = run_transfer("host", &command).unwrap_err();
        assert!(matches!(err, TransferError::ExecutionFailure { ref unit, .. } if unit == "host"));
    }
}
