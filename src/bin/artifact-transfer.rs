use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use artifact_transfer::config::{load_config, LoadedConfig};
use artifact_transfer::executor::{run_transfer, HostRunner};
use artifact_transfer::pipeline::{
    ApplyOutcome, ArtifactStage, RecordingRunner, StageInstructions,
};
use artifact_transfer::preflight::{check_host_tools, resolve_rsync_bin};
use artifact_transfer::transfer::{HostIdentity, StagingLayout, TransferPlanner};
use artifact_transfer::{build_rules, filter};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn usage() -> &'static str {
    "Usage:\n  artifact-transfer rules <base> [--include <path>]... [--exclude <path>]...\n  artifact-transfer plan <config.toml>\n  artifact-transfer copy <config.toml>"
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [rules, base, rest @ ..] if rules == "rules" => print_rules(base, rest),
        [plan, config] if plan == "plan" => plan_config(Path::new(config)),
        [copy, config] if copy == "copy" => copy_config(Path::new(config)),
        _ => bail!(usage()),
    }
}

fn print_rules(base: &str, rest: &[String]) -> Result<()> {
    let mut includes = Vec::new();
    let mut excludes = Vec::new();

    let mut iter = rest.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .with_context(|| format!("missing value for '{}'\n{}", flag, usage()))?;
        match flag.as_str() {
            "--include" => includes.push(value.as_str()),
            "--exclude" => excludes.push(value.as_str()),
            other => bail!("unknown option '{}'\n{}", other, usage()),
        }
    }

    filter::validate_patterns("cli", &includes)?;
    filter::validate_patterns("cli", &excludes)?;

    for rule in &build_rules(base, &includes, &excludes) {
        println!("{rule}");
    }
    Ok(())
}

fn plan_config(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let stage = artifact_stage(&config, config.staging.clone());

    let runner = RecordingRunner::default();
    let mut step = StageInstructions::default();
    let outcomes = stage
        .apply_all(&config.artifacts, &runner, &mut step)
        .with_context(|| format!("planning artifacts from '{}'", config_path.display()))?;

    let skipped = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, ApplyOutcome::Skipped))
        .count();
    let report = serde_json::json!({
        "dry_run": config.dry_run,
        "skipped": skipped,
        "extractions": runner.runs(),
        "commands": &step.commands,
        "volumes": step.volume_specs(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn copy_config(config_path: &Path) -> Result<()> {
    check_host_tools()?;
    let config = load_config(config_path)?;

    // On the host both hops see the staging directory at the same path.
    let staging = StagingLayout::host_only(&config.staging.host_root);
    let stage = artifact_stage(&config, staging);

    let mut step = StageInstructions::default();
    for artifact in &config.artifacts {
        let outcome = stage
            .apply_artifact(artifact, &HostRunner, &mut step)
            .with_context(|| format!("extracting artifact '{}'", artifact.name))?;
        let ApplyOutcome::Applied(plan) = outcome else {
            continue;
        };

        ensure_parent_dir(&plan.inject.destination)?;
        run_transfer("host", &plan.inject)
            .with_context(|| format!("injecting artifact '{}'", plan.name))?;
        info!(
            artifact = %plan.name,
            destination = %plan.inject.destination.display(),
            "artifact copied"
        );
    }
    Ok(())
}

fn artifact_stage(config: &LoadedConfig, staging: StagingLayout) -> ArtifactStage<StagingLayout> {
    let rsync_bin: PathBuf = resolve_rsync_bin(config.rsync_bin.as_deref());
    let planner = TransferPlanner::new(rsync_bin, HostIdentity::current(), staging);
    ArtifactStage::new(planner, config.dry_run)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating destination parent '{}'", parent.display()))?;
    }
    Ok(())
}
