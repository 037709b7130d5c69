//! Ordered rule catalog applied across a checked-out tree.

use super::file::{read_source, write_source};
use super::{LiaTacticRule, MonadScopeRule, RewriteError, RewriteRule, RuleTarget};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A file whose content was rewritten on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path relative to the tree root
    pub path: PathBuf,
    /// Names of the rules that changed the content, in application order
    pub rules: Vec<&'static str>,
    pub original: String,
    pub updated: String,
}

/// A file matched by a rule but left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkippedFile {
    /// A single-file rule's target does not exist in the tree
    MissingTarget { rule: &'static str, path: PathBuf },
    /// The file is not valid UTF-8
    NotUtf8 { path: PathBuf },
    /// A symlink that is dangling, points at a non-file, or leaves the tree
    Symlink { path: PathBuf },
}

/// Summary of one catalog pass over a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeRewrite {
    /// Files that at least one rule targeted
    pub scanned: usize,
    pub changed: Vec<FileChange>,
    pub skipped: Vec<SkippedFile>,
}

impl TreeRewrite {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

pub struct RuleCatalog {
    rules: Vec<Box<dyn RewriteRule>>,
}

impl std::fmt::Debug for RuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.name()))
            .finish()
    }
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The tactic modernization over every `source_extension` file, followed
    /// by the monad normalization of `monad_file`.
    pub fn standard(source_extension: &str, monad_file: impl Into<PathBuf>) -> Self {
        Self::new()
            .with_rule(LiaTacticRule::new(source_extension))
            .with_rule(MonadScopeRule::new(monad_file))
    }

    pub fn with_rule(mut self, rule: impl RewriteRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every applicable rule, in catalog order, over one piece of content.
    ///
    /// Returns the final content and the names of rules that changed it.
    pub fn rewrite_content(&self, relative: &Path, content: &str) -> (String, Vec<&'static str>) {
        let mut current = content.to_string();
        let mut fired = Vec::new();

        for rule in self.rules.iter().filter(|r| r.target().matches(relative)) {
            let result = rule.rewrite(&current);
            if result.changed {
                fired.push(rule.name());
                current = result.content;
            }
        }

        (current, fired)
    }

    /// Apply the catalog to every qualifying file under `root`.
    ///
    /// The `.git` directory is never entered. Each file is written at most
    /// once, and only when its final content differs from what was read.
    /// A symlink is rewritten through to its target when that target is a
    /// regular file inside `root`; the link itself is kept.
    pub fn apply_to_tree(&self, root: &Path) -> Result<TreeRewrite, RewriteError> {
        let canonical_root = root.canonicalize().map_err(|source| RewriteError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let mut report = TreeRewrite::default();

        for rule in &self.rules {
            if let RuleTarget::File(file) = rule.target() {
                if !is_file_or_link(&root.join(file)) {
                    warn!(rule = rule.name(), file = %file.display(), "rule target does not exist; skipping");
                    report.skipped.push(SkippedFile::MissingTarget {
                        rule: rule.name(),
                        path: file.clone(),
                    });
                }
            }
        }

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != ".git");

        for entry in walker {
            let entry = entry.map_err(|source| RewriteError::Walk {
                root: root.to_path_buf(),
                source,
            })?;
            let file_type = entry.file_type();
            if !file_type.is_file() && !file_type.is_symlink() {
                continue;
            }

            let relative = match entry.path().strip_prefix(root) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => continue,
            };
            if !self.rules.iter().any(|r| r.target().matches(&relative)) {
                continue;
            }

            report.scanned += 1;
            debug!(file = %relative.display(), "checking");

            let path = if file_type.is_symlink() {
                match resolve_link(&canonical_root, entry.path()) {
                    Some(target) => target,
                    None => {
                        warn!(file = %relative.display(), "symlink does not resolve to a file in the tree; skipping");
                        report.skipped.push(SkippedFile::Symlink { path: relative });
                        continue;
                    }
                }
            } else {
                entry.path().to_path_buf()
            };

            let Some(original) = read_source(&path)? else {
                warn!(file = %relative.display(), "not valid UTF-8; skipping");
                report.skipped.push(SkippedFile::NotUtf8 { path: relative });
                continue;
            };

            let (updated, rules) = self.rewrite_content(&relative, &original);
            if updated == original {
                continue;
            }

            write_source(&path, &updated)?;
            info!(file = %relative.display(), rules = ?rules, "rewrote");
            report.changed.push(FileChange {
                path: relative,
                rules,
                original,
                updated,
            });
        }

        Ok(report)
    }
}

/// Whether the walk will visit `path` as a candidate file.
fn is_file_or_link(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.is_file() || meta.file_type().is_symlink())
        .unwrap_or(false)
}

fn resolve_link(canonical_root: &Path, link: &Path) -> Option<PathBuf> {
    let target = fs::canonicalize(link).ok()?;
    (target.is_file() && target.starts_with(canonical_root)).then_some(target)
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::standard("v", "Monad.v")
    }
}
