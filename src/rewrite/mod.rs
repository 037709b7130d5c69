//! Deterministic source-level rewrite rules.
//!
//! Every rule is a pure `&str -> Rewritten` function tagged with the files it
//! targets. Rules must be idempotent: feeding a rule its own output must report
//! `changed == false`. The [`RuleCatalog`] applies an ordered list of rules to
//! every qualifying file of a tree and only touches files whose content changed.

pub mod catalog;
pub mod errors;
pub mod file;
pub mod monad;
pub mod tactic;

pub use catalog::{FileChange, RuleCatalog, SkippedFile, TreeRewrite};
pub use errors::RewriteError;
pub use monad::MonadScopeRule;
pub use tactic::LiaTacticRule;

use std::path::{Path, PathBuf};

/// Output of a single rule application.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Rewritten carries the new content; dropping it discards the rewrite"]
pub struct Rewritten {
    pub content: String,
    pub changed: bool,
}

impl Rewritten {
    /// Content that the rule left alone.
    pub fn unchanged(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            changed: false,
        }
    }

    /// Compare against the original to decide whether anything changed.
    pub fn compared(original: &str, content: String) -> Self {
        let changed = content != original;
        Self { content, changed }
    }
}

/// Which files a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    /// Every file under the tree with this extension (no leading dot).
    Extension(String),
    /// One file, relative to the tree root. Absence is reported, not fatal.
    File(PathBuf),
}

impl RuleTarget {
    /// Check a tree-relative path against this target.
    pub fn matches(&self, relative: &Path) -> bool {
        match self {
            RuleTarget::Extension(ext) => {
                relative.extension().and_then(|e| e.to_str()) == Some(ext.as_str())
            }
            RuleTarget::File(file) => relative == file.as_path(),
        }
    }
}

/// A textual transformation applied to whole-file content.
pub trait RewriteRule: Send + Sync {
    /// Stable identifier used in logs and reports.
    fn name(&self) -> &'static str;

    fn target(&self) -> &RuleTarget;

    fn rewrite(&self, content: &str) -> Rewritten;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_target_matches_nested_files() {
        let target = RuleTarget::Extension("v".to_string());
        assert!(target.matches(Path::new("theories/Foo.v")));
        assert!(target.matches(Path::new("Bar.v")));
        assert!(!target.matches(Path::new("Bar.vo")));
        assert!(!target.matches(Path::new("Makefile")));
    }

    #[test]
    fn test_file_target_matches_exact_relative_path() {
        let target = RuleTarget::File(PathBuf::from("Monad.v"));
        assert!(target.matches(Path::new("Monad.v")));
        assert!(!target.matches(Path::new("sub/Monad.v")));
    }

    #[test]
    fn test_compared_detects_change() {
        assert!(!Rewritten::compared("a", "a".to_string()).changed);
        assert!(Rewritten::compared("a", "b".to_string()).changed);
    }
}
