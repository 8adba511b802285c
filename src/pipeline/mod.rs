//! Applying transfer plans to the surrounding build pipeline.
//!
//! The pipeline owns two collaborators this crate does not implement for
//! real containers:
//!
//! - [`BuildUnitRunner`] runs hop 1 inside the source build unit, with the
//!   staging volume mounted writable.
//! - [`DestinationStep`] is the destination image's build step; it receives
//!   the read-only staging volume and hop 2 as a build instruction.
//!
//! [`ArtifactStage`] sequences them. In simulate-only mode it returns before
//! any rule is built.

pub mod record;

use tracing::{debug, info};

use crate::error::{Result, TransferError};
use crate::transfer::{
    ArtifactDescriptor, BuildUnit, StagingMount, StagingPaths, TransferCommand, TransferPlan,
    TransferPlanner,
};

pub use record::{RecordedRun, RecordingRunner, StageInstructions};

/// Executes a transfer command inside a build unit's execution context.
pub trait BuildUnitRunner {
    /// Run `command` in `unit` with `staging` mounted. Failures are returned
    /// unchanged; nothing is retried.
    fn run_in_unit(
        &self,
        unit: &BuildUnit,
        command: &TransferCommand,
        staging: &StagingMount,
    ) -> Result<()>;
}

/// Build step of the destination image.
pub trait DestinationStep {
    fn add_volume(&mut self, mount: StagingMount);

    fn has_volume(&self, mount: &StagingMount) -> bool;

    /// Append a command to run when the image is assembled.
    fn add_command(&mut self, command: &TransferCommand);
}

/// Result of applying one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Simulate-only run; nothing was planned or recorded.
    Skipped,
    Applied(Box<TransferPlan>),
}

/// Imports artifacts into one destination build step.
#[derive(Debug, Clone)]
pub struct ArtifactStage<S> {
    planner: TransferPlanner<S>,
    dry_run: bool,
}

impl<S: StagingPaths> ArtifactStage<S> {
    pub fn new(planner: TransferPlanner<S>, dry_run: bool) -> Self {
        Self { planner, dry_run }
    }

    pub fn apply_artifact<R, D>(
        &self,
        descriptor: &ArtifactDescriptor,
        runner: &R,
        destination: &mut D,
    ) -> Result<ApplyOutcome>
    where
        R: BuildUnitRunner + ?Sized,
        D: DestinationStep + ?Sized,
    {
        if self.dry_run {
            info!(artifact = %descriptor.name, "dry run, skipping artifact import");
            return Ok(ApplyOutcome::Skipped);
        }

        let plan = self.planner.plan_transfer(descriptor)?;
        debug!(
            artifact = %plan.name,
            extract = %plan.extract,
            inject = %plan.inject,
            "planned artifact transfer"
        );

        info!(artifact = %plan.name, unit = %plan.source, "extracting artifact into staging");
        runner.run_in_unit(&plan.source, &plan.extract, &plan.extraction_mount())?;

        destination.add_volume(plan.mount.clone());
        ensure_staging_mount(destination, &plan)?;
        destination.add_command(&plan.inject);
        info!(
            artifact = %plan.name,
            volume = %plan.mount,
            destination = %plan.inject.destination.display(),
            "artifact import added to destination step"
        );

        Ok(ApplyOutcome::Applied(Box::new(plan)))
    }

    /// Apply artifacts in order, stopping at the first failure.
    pub fn apply_all<R, D>(
        &self,
        descriptors: &[ArtifactDescriptor],
        runner: &R,
        destination: &mut D,
    ) -> Result<Vec<ApplyOutcome>>
    where
        R: BuildUnitRunner + ?Sized,
        D: DestinationStep + ?Sized,
    {
        descriptors
            .iter()
            .map(|descriptor| self.apply_artifact(descriptor, runner, destination))
            .collect()
    }
}

/// Hop 2 reads the staging directory; appending it without the volume is a
/// contract violation of the destination step.
fn ensure_staging_mount<D>(destination: &D, plan: &TransferPlan) -> Result<()>
where
    D: DestinationStep + ?Sized,
{
    if destination.has_volume(&plan.mount) {
        return Ok(());
    }
    Err(TransferError::MissingStagingMount {
        name: plan.name.clone(),
        container_path: plan.mount.container_path.clone(),
    })
}
