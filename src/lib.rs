//! Filtered artifact copies between container build stages.
//!
//! A build step can import files produced by another build unit. The caller
//! names a working directory, optional include/exclude sub-paths and a
//! destination; this crate decides exactly which files move and with what
//! ownership, expressed as rsync filter rules.
//!
//! - **Filter rules** - [`filter::build_rules`] turns include/exclude paths
//!   into an ordered, first-match-wins rule list
//! - **Transfer planning** - [`transfer::TransferPlanner`] produces the two
//!   hops (source unit -> staging, staging -> destination) and the staging
//!   volume
//! - **Pipeline integration** - [`pipeline::ArtifactStage`] hands the hops
//!   to the runner and destination step collaborators
//! - **Host execution** - [`executor::HostRunner`] runs transfers locally
//!
//! # Architecture
//!
//! ```text
//! config (TOML) ──▶ ArtifactDescriptor
//!                        │
//!                        ▼
//!              TransferPlanner::plan_transfer
//!                 │ build_rules(cwd, ..)      ─▶ hop 1 (extract)
//!                 │ build_rules(staging, ..)  ─▶ hop 2 (inject)
//!                 └ StagingMount (ro)
//!                        │
//!                        ▼
//!              ArtifactStage::apply_artifact
//!                 ├ BuildUnitRunner::run_in_unit(hop 1)
//!                 ├ DestinationStep::add_volume(mount)
//!                 └ DestinationStep::add_command(hop 2)
//! ```
//!
//! # Example
//!
//! ```rust
//! use artifact_transfer::pipeline::{ArtifactStage, RecordingRunner, StageInstructions};
//! use artifact_transfer::transfer::{
//!     ArtifactDescriptor, BuildUnit, CopyOptions, HostIdentity, StagingLayout, TransferPlanner,
//! };
//!
//! let planner = TransferPlanner::new(
//!     "rsync",
//!     HostIdentity::new(1000, 1000),
//!     StagingLayout::new("/var/tmp/build", "/.build/tmp"),
//! );
//! let stage = ArtifactStage::new(planner, false);
//!
//! let mut options = CopyOptions::new("/src", "/app");
//! options.include_paths = vec!["dist".into()];
//! let artifact = ArtifactDescriptor::new("web", BuildUnit::new("builder"), options);
//!
//! let runner = RecordingRunner::default();
//! let mut step = StageInstructions::default();
//! stage.apply_artifact(&artifact, &runner, &mut step)?;
//!
//! assert_eq!(runner.runs().len(), 1);
//! assert_eq!(step.volume_specs(), ["/var/tmp/build/artifact/web:/.build/tmp/artifact/web:ro"]);
//! # Ok::<(), artifact_transfer::TransferError>(())
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod pipeline;
pub mod preflight;
pub mod transfer;

pub use error::TransferError;
pub use filter::{build_rules, FilterRule, FilterRules, FilterSign};
pub use pipeline::{ApplyOutcome, ArtifactStage, BuildUnitRunner, DestinationStep};
pub use transfer::{ArtifactDescriptor, CopyOptions, TransferCommand, TransferPlan, TransferPlanner};
