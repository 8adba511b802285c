//! Filter rule construction for include/exclude-restricted copies.
//!
//! Rules are evaluated by rsync in listed order, first match wins, against
//! every path it visits while recursing the source tree. Everything here is
//! pure: building rules performs no I/O and cannot fail.
//!
//! # Precedence
//!
//! With a non-empty include list, excludes are emitted *before* includes. An
//! exclude only makes sense as a carve-out from an included tree, so it must
//! win even when an include names a more specific path:
//!
//! ```rust
//! use artifact_transfer::filter::{build_rules, FilterRule};
//!
//! let rules = build_rules("/src", &["a/b"], &["a/b/secret"]);
//! assert_eq!(rules.as_slice()[0], FilterRule::exclude("/src/a/b/secret"));
//! assert_eq!(rules.as_slice().last(), Some(&FilterRule::exclude("/src/**")));
//! ```

pub mod validate;

use std::fmt;

use serde::Serialize;

pub use validate::{validate_pattern, validate_patterns};

/// Whether a matching path is transferred or skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterSign {
    Include,
    Exclude,
}

impl FilterSign {
    fn prefix(self) -> char {
        match self {
            FilterSign::Include => '+',
            FilterSign::Exclude => '-',
        }
    }
}

/// A single anchored filter rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FilterRule {
    pub sign: FilterSign,
    pub pattern: String,
}

impl FilterRule {
    pub fn include(pattern: impl Into<String>) -> Self {
        Self {
            sign: FilterSign::Include,
            pattern: pattern.into(),
        }
    }

    pub fn exclude(pattern: impl Into<String>) -> Self {
        Self {
            sign: FilterSign::Exclude,
            pattern: pattern.into(),
        }
    }

    /// Value of the `--filter` argument, e.g. `+/ /src/app`.
    ///
    /// The `/` modifier makes rsync match the pattern against the absolute
    /// path name instead of the transfer-relative one.
    pub fn filter_value(&self) -> String {
        format!("{}/ {}", self.sign.prefix(), self.pattern)
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--filter={}", self.filter_value())
    }
}

/// Ordered, immutable rule list produced by [`build_rules`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterRules(Vec<FilterRule>);

impl FilterRules {
    pub fn as_slice(&self) -> &[FilterRule] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilterRule> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a FilterRules {
    type Item = &'a FilterRule;
    type IntoIter = std::slice::Iter<'a, FilterRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Build the ordered filter rules restricting a copy rooted at `base`.
///
/// * Non-empty `include_paths`: every exclude, then for each include the
///   chain of its ancestor directories, the path itself and `path/**`, then a
///   trailing catch-all `base/**` exclude.
/// * Empty `include_paths`: only the excludes, no catch-all.
///
/// Patterns are neither deduplicated nor reordered.
pub fn build_rules<I, E>(base: &str, include_paths: &[I], exclude_paths: &[E]) -> FilterRules
where
    I: AsRef<str>,
    E: AsRef<str>,
{
    let mut rules = Vec::new();

    for pattern in exclude_paths {
        rules.push(FilterRule::exclude(join_pattern(base, pattern.as_ref())));
    }

    if include_paths.is_empty() {
        return FilterRules(rules);
    }

    for pattern in include_paths {
        let target = join_pattern(base, pattern.as_ref());

        // Without these the catch-all rejects the parent directories before
        // rsync ever descends far enough to see `target`.
        rules.extend(descend(&target).into_iter().map(FilterRule::include));

        // Unknown whether the pattern names a file or a directory, so cover both.
        rules.push(FilterRule::include(target.as_str()));
        rules.push(FilterRule::include(join_pattern(&target, "**")));
    }

    rules.push(FilterRule::exclude(join_pattern(base, "**")));
    FilterRules(rules)
}

/// Join a relative pattern onto a base path as plain text.
///
/// `Path::join` is unsuitable: patterns may carry glob characters and a
/// leading `/` must not replace the base. Empty and `.` patterns address the
/// base itself.
pub fn join_pattern(base: &str, pattern: &str) -> String {
    let mut rel = pattern.trim_start_matches('/');
    while let Some(rest) = rel.strip_prefix("./") {
        rel = rest.trim_start_matches('/');
    }

    let trimmed_base = base.trim_end_matches('/');
    if rel.is_empty() || rel == "." {
        return if trimmed_base.is_empty() && base.starts_with('/') {
            "/".to_string()
        } else {
            trimmed_base.to_string()
        };
    }

    if trimmed_base.is_empty() {
        if base.starts_with('/') {
            format!("/{rel}")
        } else {
            rel.to_string()
        }
    } else {
        format!("{trimmed_base}/{rel}")
    }
}

/// Ancestor directories of `target`, root-to-leaf, excluding `target` itself.
///
/// The filesystem root is never listed: it is the anchor every rule already
/// hangs off, not a directory rsync visits inside the transfer.
pub fn descend(target: &str) -> Vec<String> {
    let target = target.trim_end_matches('/');
    target
        .match_indices('/')
        .map(|(idx, _)| &target[..idx])
        .filter(|prefix| !prefix.is_empty() && !prefix.ends_with('/'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    #[test]
    fn test_include_single_nested_path() {
        let rules = build_rules("/src", &["app/config"], NONE);
        assert_eq!(
            rules.as_slice(),
            &[
                FilterRule::include("/src"),
                FilterRule::include("/src/app"),
                FilterRule::include("/src/app/config"),
                FilterRule::include("/src/app/config/**"),
                FilterRule::exclude("/src/**"),
            ]
        );
    }

    #[test]
    fn test_excludes_precede_more_specific_includes() {
        let rules = build_rules("/src", &["a/b"], &["a/b/secret"]);
        assert_eq!(
            rules.as_slice(),
            &[
                FilterRule::exclude("/src/a/b/secret"),
                FilterRule::include("/src"),
                FilterRule::include("/src/a"),
                FilterRule::include("/src/a/b"),
                FilterRule::include("/src/a/b/**"),
                FilterRule::exclude("/src/**"),
            ]
        );
    }

    #[test]
    fn test_exclude_only_has_no_catch_all() {
        let rules = build_rules("/src", NONE, &["tmp", "*.log"]);
        assert_eq!(
            rules.as_slice(),
            &[FilterRule::exclude("/src/tmp"), FilterRule::exclude("/src/*.log")]
        );
    }

    #[test]
    fn test_no_paths_means_no_rules() {
        assert!(build_rules("/src", NONE, NONE).is_empty());
    }

    #[test]
    fn test_multiple_includes_keep_input_order_and_duplicates() {
        let rules = build_rules("/w", &["x", "y/z", "x"], NONE);
        let patterns: Vec<&str> = rules.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(
            patterns,
            vec![
                "/w", "/w/x", "/w/x/**", "/w", "/w/y", "/w/y/z", "/w/y/z/**", "/w", "/w/x",
                "/w/x/**", "/w/**",
            ]
        );
    }

    #[test]
    fn test_catch_all_is_last_whenever_includes_present() {
        for includes in [vec!["a"], vec!["a", "b/c"], vec!["."]] {
            let rules = build_rules("/base/dir", &includes, &["q"]);
            assert_eq!(
                rules.as_slice().last(),
                Some(&FilterRule::exclude("/base/dir/**"))
            );
        }
    }

    #[test]
    fn test_base_directory_pattern_has_empty_descent() {
        for pattern in [".", ""] {
            let rules = build_rules("/src", &[pattern], NONE);
            assert_eq!(
                rules.as_slice(),
                &[
                    FilterRule::include("/src"),
                    FilterRule::include("/src/**"),
                    FilterRule::exclude("/src/**"),
                ]
            );
        }
    }

    #[test]
    fn test_ancestor_chain_precedes_target() {
        let rules = build_rules("/srv/app/", &["one/two/three.txt"], NONE);
        let target_idx = rules
            .iter()
            .position(|r| r.pattern == "/srv/app/one/two/three.txt")
            .unwrap();
        let chain: Vec<&str> = rules.as_slice()[..target_idx]
            .iter()
            .map(|r| r.pattern.as_str())
            .collect();
        assert_eq!(chain, vec!["/srv", "/srv/app", "/srv/app/one", "/srv/app/one/two"]);
        assert!(rules.as_slice()[..target_idx]
            .iter()
            .all(|r| r.sign == FilterSign::Include));
    }

    #[test]
    fn test_build_rules_is_deterministic() {
        let a = build_rules("/src", &["a/b", "c"], &["a/b/x", "*.tmp"]);
        let b = build_rules("/src", &["a/b", "c"], &["a/b/x", "*.tmp"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_build_rules_concurrently() {
        let expected = build_rules("/src", &["app"], &["app/cache"]);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| build_rules("/src", &["app"], &["app/cache"])))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_join_pattern() {
        assert_eq!(join_pattern("/src", "app"), "/src/app");
        assert_eq!(join_pattern("/src/", "/app"), "/src/app");
        assert_eq!(join_pattern("/src", "./app"), "/src/app");
        assert_eq!(join_pattern("/src", "."), "/src");
        assert_eq!(join_pattern("/", "app"), "/app");
        assert_eq!(join_pattern("/", "."), "/");
        assert_eq!(join_pattern("rel", "x/*.log"), "rel/x/*.log");
    }

    #[test]
    fn test_descend() {
        assert_eq!(descend("/a/b/c"), vec!["/a", "/a/b"]);
        assert_eq!(descend("/a/b/c/"), vec!["/a", "/a/b"]);
        assert_eq!(descend("/a"), Vec::<String>::new());
        assert_eq!(descend("/"), Vec::<String>::new());
        assert_eq!(descend("rel/x"), vec!["rel"]);
    }

    #[test]
    fn test_rule_rendering() {
        assert_eq!(FilterRule::include("/src/app").filter_value(), "+/ /src/app");
        assert_eq!(
            FilterRule::exclude("/src/**").to_string(),
            "--filter=-/ /src/**"
        );
    }
}
