//! Pattern validation performed before any rules are built.

use std::path::{Component, Path};

use crate::error::{Result, TransferError};

/// Reject a single include/exclude pattern that cannot be anchored under a
/// base directory.
///
/// `.` is accepted and addresses the base directory itself.
pub fn validate_pattern(artifact: &str, pattern: &str) -> Result<()> {
    let reason = if pattern.trim().is_empty() {
        Some("pattern is empty")
    } else if pattern.contains('\0') {
        Some("pattern contains a NUL byte")
    } else if pattern.contains('\n') || pattern.contains('\r') {
        Some("pattern contains a line break")
    } else if pattern.starts_with('/') {
        Some("pattern must be relative to the working directory")
    } else if Path::new(pattern)
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        Some("pattern escapes the working directory via '..'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(TransferError::InvalidPattern {
            artifact: artifact.to_string(),
            pattern: pattern.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Validate every pattern, failing on the first bad one.
pub fn validate_patterns<P: AsRef<str>>(artifact: &str, patterns: &[P]) -> Result<()> {
    for pattern in patterns {
        validate_pattern(artifact, pattern.as_ref())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_relative_and_glob_patterns() {
        for pattern in ["app", "app/config", "*.log", "a/**/b", ".", "./app"] {
            assert!(validate_pattern("web", pattern).is_ok(), "{pattern}");
        }
    }

    #[test]
    fn rejects_malformed_patterns() {
        for pattern in ["", "   ", "/etc", "../up", "a/../../b", "bad\nline", "nul\0"] {
            let err = validate_pattern("web", pattern).unwrap_err();
            assert!(
                matches!(err, TransferError::InvalidPattern { ref artifact, .. } if artifact == "web"),
                "{pattern}: {err}"
            );
        }
    }

    #[test]
    fn validate_patterns_reports_first_failure() {
        let err = validate_patterns("web", &["ok", "", "/abs"]).unwrap_err();
        match err {
            TransferError::InvalidPattern { pattern, .. } => assert_eq!(pattern, ""),
            other => panic!("unexpected error: {other}"),
        }
    }
}
