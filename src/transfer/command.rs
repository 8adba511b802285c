//! Rendering of a single rsync invocation.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::filter::FilterRules;

/// Default copy tool when nothing else is configured.
pub const DEFAULT_RSYNC_BIN: &str = "rsync";

/// Ownership override applied by `--chown`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ownership {
    pub owner: Option<String>,
    pub group: Option<String>,
}

impl Ownership {
    pub fn new(owner: Option<String>, group: Option<String>) -> Self {
        Self { owner, group }
    }

    /// `--chown=OWNER:GROUP`, or `None` when neither side is set.
    ///
    /// An absent side renders empty, which rsync reads as "leave unchanged".
    pub fn chown_arg(&self) -> Option<String> {
        if self.owner.is_none() && self.group.is_none() {
            return None;
        }
        Some(format!(
            "--chown={}:{}",
            self.owner.as_deref().unwrap_or(""),
            self.group.as_deref().unwrap_or("")
        ))
    }
}

/// One filtered copy of the *contents* of `source` into `destination`.
///
/// Built once by the planner and consumed once by whichever collaborator
/// executes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferCommand {
    pub rsync_bin: PathBuf,
    pub ownership: Ownership,
    pub rules: FilterRules,
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl TransferCommand {
    pub fn new(
        rsync_bin: impl Into<PathBuf>,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        ownership: Ownership,
        rules: FilterRules,
    ) -> Self {
        Self {
            rsync_bin: rsync_bin.into(),
            ownership,
            rules,
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Source operand with exactly one trailing slash, so rsync copies the
    /// directory's contents rather than the directory itself.
    pub fn source_operand(&self) -> String {
        contents_of(&self.source)
    }

    pub fn destination_operand(&self) -> String {
        self.destination.display().to_string()
    }

    /// Arguments after the program name, in the exact order rsync sees them.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["--archive".to_string(), "--links".to_string()];
        if let Some(chown) = self.ownership.chown_arg() {
            args.push(chown);
        }
        args.extend(self.rules.iter().map(ToString::to_string));
        args.push(self.source_operand());
        args.push(self.destination_operand());
        args
    }

    /// Full argument vector including the program.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.rsync_bin.display().to_string()];
        argv.extend(self.args());
        argv
    }

    /// Single shell line suitable for a build instruction.
    pub fn to_shell(&self) -> String {
        let mut line = shell_quote(&self.rsync_bin.display().to_string());
        line.push_str(" --archive --links");
        if let Some(chown) = self.ownership.chown_arg() {
            line.push(' ');
            line.push_str(&shell_quote(&chown));
        }
        for rule in &self.rules {
            line.push_str(" --filter=");
            line.push_str(&shell_quote(&rule.filter_value()));
        }
        line.push(' ');
        line.push_str(&shell_quote(&self.source_operand()));
        line.push(' ');
        line.push_str(&shell_quote(&self.destination_operand()));
        line
    }
}

impl fmt::Display for TransferCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell())
    }
}

fn contents_of(path: &Path) -> String {
    let rendered = path.display().to_string();
    let trimmed = rendered.trim_end_matches('/');
    format!("{trimmed}/")
}

/// Quote for POSIX sh only when needed; single quotes inside are closed,
/// escaped and reopened.
pub(crate) fn shell_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,@%+".contains(c));
    if plain {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}
