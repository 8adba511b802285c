//! Two-hop artifact transfer planning.
//!
//! An artifact moves from a source build unit into a destination image in
//! two filtered copies that share one rule set:
//!
//! ```text
//! source unit: <cwd>/  ──hop 1──▶  staging dir (host-backed volume)
//!                                       │
//! destination image:  <to>  ◀──hop 2────┘  (volume mounted read-only)
//! ```
//!
//! Hop 1 runs inside the source unit and hands the files to the host user.
//! Hop 2 becomes a build instruction of the destination image and applies
//! the requested ownership. Planning is pure: either both hops and the mount
//! are produced, or an error is returned and nothing was touched.

pub mod command;
pub mod identity;
pub mod staging;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransferError};
use crate::filter::{build_rules, validate_patterns, FilterRules};

pub use command::{Ownership, TransferCommand, DEFAULT_RSYNC_BIN};
pub use identity::HostIdentity;
pub use staging::{StagingLayout, StagingMount, StagingPaths, DEFAULT_CONTAINER_STAGING_ROOT};

/// Opaque handle to the container or image providing an artifact's files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildUnit(String);

impl BuildUnit {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to copy and how it should land in the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyOptions {
    pub working_directory: PathBuf,
    pub include_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub destination_path: PathBuf,
    pub owner: Option<String>,
    pub group: Option<String>,
}

impl CopyOptions {
    pub fn new(working_directory: impl Into<PathBuf>, destination_path: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
            include_paths: Vec::new(),
            exclude_paths: Vec::new(),
            destination_path: destination_path.into(),
            owner: None,
            group: None,
        }
    }

    pub fn ownership(&self) -> Ownership {
        Ownership::new(self.owner.clone(), self.group.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    pub name: String,
    pub source: BuildUnit,
    pub options: CopyOptions,
}

impl ArtifactDescriptor {
    pub fn new(name: impl Into<String>, source: BuildUnit, options: CopyOptions) -> Self {
        Self {
            name: name.into(),
            source,
            options,
        }
    }

    /// Reject relative working/destination directories and malformed
    /// include/exclude patterns.
    pub fn validate(&self) -> Result<()> {
        // Rules are anchored with the `/` modifier, which only matches
        // absolute path names.
        self.require_absolute("working directory", &self.options.working_directory)?;
        self.require_absolute("destination path", &self.options.destination_path)?;
        validate_patterns(&self.name, &self.options.include_paths)?;
        validate_patterns(&self.name, &self.options.exclude_paths)
    }

    fn require_absolute(&self, field: &'static str, path: &Path) -> Result<()> {
        if path.is_absolute() {
            return Ok(());
        }
        Err(TransferError::InvalidPath {
            artifact: self.name.clone(),
            field,
            path: path.to_path_buf(),
        })
    }

    fn rules_for(&self, base: &Path) -> FilterRules {
        build_rules(
            &base.to_string_lossy(),
            &self.options.include_paths,
            &self.options.exclude_paths,
        )
    }
}

/// Everything the surrounding pipeline needs to carry out one artifact copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferPlan {
    pub name: String,
    pub source: BuildUnit,
    /// Hop 1: source unit working directory into staging.
    pub extract: TransferCommand,
    /// Hop 2: staging into the destination path.
    pub inject: TransferCommand,
    /// Read-only staging volume for the destination step.
    pub mount: StagingMount,
}

impl TransferPlan {
    /// Writable view of the staging volume for the source unit running hop 1.
    pub fn extraction_mount(&self) -> StagingMount {
        self.mount.writable()
    }

    pub fn into_parts(self) -> (TransferCommand, TransferCommand, StagingMount) {
        (self.extract, self.inject, self.mount)
    }
}

/// Plans transfers against a fixed copy tool, host identity and staging layout.
#[derive(Debug, Clone)]
pub struct TransferPlanner<S> {
    rsync_bin: PathBuf,
    identity: HostIdentity,
    staging: S,
}

impl<S: StagingPaths> TransferPlanner<S> {
    pub fn new(rsync_bin: impl Into<PathBuf>, identity: HostIdentity, staging: S) -> Self {
        Self {
            rsync_bin: rsync_bin.into(),
            identity,
            staging,
        }
    }

    pub fn plan_transfer(&self, descriptor: &ArtifactDescriptor) -> Result<TransferPlan> {
        descriptor.validate()?;

        let options = &descriptor.options;
        let staging_path = self.staging.staging_path(&descriptor.name);

        let extract = TransferCommand::new(
            &self.rsync_bin,
            &options.working_directory,
            &staging_path,
            self.identity.ownership(),
            descriptor.rules_for(&options.working_directory),
        );

        let inject = TransferCommand::new(
            &self.rsync_bin,
            &staging_path,
            &options.destination_path,
            options.ownership(),
            descriptor.rules_for(&staging_path),
        );

        let mount = StagingMount::read_only(
            self.staging.host_tmp_path(&descriptor.name),
            staging_path,
        );

        Ok(TransferPlan {
            name: descriptor.name.clone(),
            source: descriptor.source.clone(),
            extract,
            inject,
            mount,
        })
    }

    /// Plan several artifacts; fails without partial output on the first
    /// invalid descriptor.
    pub fn plan_transfers(&self, descriptors: &[ArtifactDescriptor]) -> Result<Vec<TransferPlan>> {
        descriptors
            .iter()
            .map(|descriptor| self.plan_transfer(descriptor))
            .collect()
    }
}
