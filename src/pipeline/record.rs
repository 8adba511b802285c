//! In-memory collaborators that record side effects instead of performing
//! them. Used by the `plan` command and by tests.

use std::sync::Mutex;

use serde::Serialize;

use super::{BuildUnitRunner, DestinationStep};
use crate::error::Result;
use crate::transfer::{BuildUnit, StagingMount, TransferCommand};

/// A hop-1 execution that was requested but not performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedRun {
    pub unit: String,
    pub argv: Vec<String>,
    pub volume: String,
}

#[derive(Debug, Default)]
pub struct RecordingRunner {
    runs: Mutex<Vec<RecordedRun>>,
}

impl RecordingRunner {
    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl BuildUnitRunner for RecordingRunner {
    fn run_in_unit(
        &self,
        unit: &BuildUnit,
        command: &TransferCommand,
        staging: &StagingMount,
    ) -> Result<()> {
        self.runs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedRun {
                unit: unit.to_string(),
                argv: command.argv(),
                volume: staging.to_string(),
            });
        Ok(())
    }
}

/// Build instructions accumulated for a destination image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageInstructions {
    pub commands: Vec<String>,
    pub volumes: Vec<StagingMount>,
}

impl StageInstructions {
    /// Volumes as `HOST:CONTAINER:ro` strings.
    pub fn volume_specs(&self) -> Vec<String> {
        self.volumes.iter().map(ToString::to_string).collect()
    }
}

impl DestinationStep for StageInstructions {
    fn add_volume(&mut self, mount: StagingMount) {
        if !self.volumes.contains(&mount) {
            self.volumes.push(mount);
        }
    }

    fn has_volume(&self, mount: &StagingMount) -> bool {
        self.volumes.contains(mount)
    }

    fn add_command(&mut self, command: &TransferCommand) {
        self.commands.push(command.to_shell());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterRules;
    use crate::transfer::Ownership;

    #[test]
    fn test_add_volume_is_idempotent() {
        let mut step = StageInstructions::default();
        let mount = StagingMount::read_only("/h", "/c");
        step.add_volume(mount.clone());
        step.add_volume(mount.clone());
        assert_eq!(step.volumes.len(), 1);
        assert!(step.has_volume(&mount));
        assert!(!step.has_volume(&mount.writable()));
    }

    #[test]
    fn test_add_command_renders_shell_line() {
        let mut step = StageInstructions::default();
        let command = TransferCommand::new(
            "rsync",
            "/c",
            "/app",
            Ownership::default(),
            FilterRules::default(),
        );
        step.add_command(&command);
        assert_eq!(step.commands, vec!["rsync --archive --links /c/ /app"]);
    }
}
