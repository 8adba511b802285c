//! Staging directory naming and the volume that bridges the two hops.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Container-side root used when no staging layout is configured.
pub const DEFAULT_CONTAINER_STAGING_ROOT: &str = "/.build/tmp";

/// Subdirectory of both staging roots holding per-artifact directories.
const ARTIFACT_SUBDIR: &str = "artifact";

/// Names the host and container locations of an artifact's staging directory.
pub trait StagingPaths {
    /// Host directory backing the staging volume.
    fn host_tmp_path(&self, name: &str) -> PathBuf;

    /// Where the staging volume appears inside build units.
    fn staging_path(&self, name: &str) -> PathBuf;
}

/// `<root>/artifact/<name>` on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingLayout {
    pub host_root: PathBuf,
    pub container_root: PathBuf,
}

impl StagingLayout {
    pub fn new(host_root: impl Into<PathBuf>, container_root: impl Into<PathBuf>) -> Self {
        Self {
            host_root: host_root.into(),
            container_root: container_root.into(),
        }
    }

    /// Same directory on both sides, for running both hops on the host.
    pub fn host_only(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            host_root: root.clone(),
            container_root: root,
        }
    }
}

impl StagingPaths for StagingLayout {
    fn host_tmp_path(&self, name: &str) -> PathBuf {
        self.host_root.join(ARTIFACT_SUBDIR).join(name)
    }

    fn staging_path(&self, name: &str) -> PathBuf {
        self.container_root.join(ARTIFACT_SUBDIR).join(name)
    }
}

/// Bind mount of an artifact's staging directory into a build unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StagingMount {
    pub host_path: PathBuf,
    pub container_path: PathBuf,
    pub read_only: bool,
}

impl StagingMount {
    pub fn read_only(host_path: impl Into<PathBuf>, container_path: impl Into<PathBuf>) -> Self {
        Self {
            host_path: host_path.into(),
            container_path: container_path.into(),
            read_only: true,
        }
    }

    /// Writable twin of this mount.
    pub fn writable(&self) -> Self {
        Self {
            read_only: false,
            ..self.clone()
        }
    }
}

/// Docker-style volume spec: `HOST:CONTAINER[:ro]`.
impl fmt::Display for StagingMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.host_path.display(),
            self.container_path.display()
        )?;
        if self.read_only {
            f.write_str(":ro")?;
        }
        Ok(())
    }
}
