//! Omega → Lia modernization.
//!
//! The `omega` tactic and its `Omega` library were removed from Coq in favor of
//! `lia`. Old commits still import and call them, so both the import line and
//! bare tactic calls are rewritten before anything else looks at the tree.

use super::{RewriteRule, Rewritten, RuleTarget};
use regex::Regex;
use std::sync::LazyLock;

const LEGACY_IMPORT: &str = "Require Import Omega.";
const MODERN_IMPORT: &str = "Require Import Lia.";
const MODERN_TACTIC: &str = "lia";

static LEGACY_TACTIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bomega\b").expect("static regex is valid"));

/// Replaces the `Omega` import and every whole-word `omega` with `lia`.
#[derive(Debug, Clone)]
pub struct LiaTacticRule {
    target: RuleTarget,
}

impl LiaTacticRule {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            target: RuleTarget::Extension(extension.into()),
        }
    }
}

impl Default for LiaTacticRule {
    fn default() -> Self {
        Self::new("v")
    }
}

impl RewriteRule for LiaTacticRule {
    fn name(&self) -> &'static str {
        "omega-to-lia"
    }

    fn target(&self) -> &RuleTarget {
        &self.target
    }

    fn rewrite(&self, content: &str) -> Rewritten {
        let imports = content.replace(LEGACY_IMPORT, MODERN_IMPORT);
        let updated = LEGACY_TACTIC
            .replace_all(&imports, MODERN_TACTIC)
            .into_owned();
        Rewritten::compared(content, updated)
    }
}
