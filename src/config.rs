//! TOML configuration for an artifact import step.
//!
//! ```toml
//! rsync_bin = "rsync"
//! dry_run = false
//!
//! [staging]
//! host_root = "tmp"
//! container_root = "/.build/tmp"
//!
//! [[artifact]]
//! name = "web"
//! from = "builder"
//! cwd = "/src"
//! to = "/app"
//! include_paths = ["app/config"]
//! exclude_paths = ["app/config/secret"]
//! owner = "app"
//! group = "app"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::transfer::{
    ArtifactDescriptor, BuildUnit, CopyOptions, StagingLayout, DEFAULT_CONTAINER_STAGING_ROOT,
};

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub rsync_bin: Option<PathBuf>,
    pub dry_run: bool,
    pub staging: StagingLayout,
    pub artifacts: Vec<ArtifactDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    rsync_bin: Option<PathBuf>,
    #[serde(default)]
    dry_run: bool,
    staging: StagingToml,
    #[serde(default, rename = "artifact")]
    artifacts: Vec<ArtifactToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StagingToml {
    host_root: PathBuf,
    container_root: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArtifactToml {
    name: String,
    from: String,
    cwd: PathBuf,
    to: PathBuf,
    #[serde(default)]
    include_paths: Vec<String>,
    #[serde(default)]
    exclude_paths: Vec<String>,
    owner: Option<String>,
    group: Option<String>,
}

/// Read and validate a config file.
pub fn load_config(path: &Path) -> Result<LoadedConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading artifact config '{}'", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_config(&raw, base_dir)
        .with_context(|| format!("loading artifact config '{}'", path.display()))
}

/// Parse config text; relative paths resolve against `base_dir`.
pub fn parse_config(raw: &str, base_dir: &Path) -> Result<LoadedConfig> {
    let parsed: ConfigToml = toml::from_str(raw).context("parsing TOML")?;

    let container_root = parsed
        .staging
        .container_root
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTAINER_STAGING_ROOT));
    if !container_root.is_absolute() {
        bail!(
            "staging.container_root must be absolute, got '{}'",
            container_root.display()
        );
    }
    let staging = StagingLayout::new(
        resolve_relative(base_dir, &parsed.staging.host_root),
        container_root,
    );

    let mut seen = BTreeSet::new();
    let mut artifacts = Vec::with_capacity(parsed.artifacts.len());
    for artifact in parsed.artifacts {
        let descriptor = artifact_descriptor(artifact)?;
        if !seen.insert(descriptor.name.clone()) {
            bail!("duplicate artifact name '{}'", descriptor.name);
        }
        descriptor
            .validate()
            .with_context(|| format!("validating artifact '{}'", descriptor.name))?;
        artifacts.push(descriptor);
    }

    Ok(LoadedConfig {
        rsync_bin: parsed.rsync_bin,
        dry_run: parsed.dry_run,
        staging,
        artifacts,
    })
}

fn artifact_descriptor(artifact: ArtifactToml) -> Result<ArtifactDescriptor> {
    let name = artifact.name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        bail!("invalid artifact name '{}'", artifact.name);
    }
    if artifact.from.trim().is_empty() {
        bail!("artifact '{}': 'from' must name a build unit", name);
    }
    if !artifact.cwd.is_absolute() {
        bail!(
            "artifact '{}': cwd must be absolute, got '{}'",
            name,
            artifact.cwd.display()
        );
    }
    if !artifact.to.is_absolute() {
        bail!(
            "artifact '{}': to must be absolute, got '{}'",
            name,
            artifact.to.display()
        );
    }

    let mut options = CopyOptions::new(artifact.cwd, artifact.to);
    options.include_paths = artifact.include_paths;
    options.exclude_paths = artifact.exclude_paths;
    options.owner = artifact.owner;
    options.group = artifact.group;

    Ok(ArtifactDescriptor::new(
        name,
        BuildUnit::new(artifact.from),
        options,
    ))
}

fn resolve_relative(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
