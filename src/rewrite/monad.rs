//! Normalization of the monad definition module.
//!
//! Newer Coq releases require notation scopes to be declared before use and
//! reject the `[A]` implicit-argument syntax that older commits of the monad
//! module rely on. The rule is textual: it never parses Gallina.

use super::{RewriteRule, Rewritten, RuleTarget};
use regex::{Captures, Regex};
use std::path::PathBuf;
use std::sync::LazyLock;

const SCOPE_MARKER: &str = "Declare Scope monad_scope";
const SCOPE_LINE: &str = "Declare Scope monad_scope.\n";

static BRACKETED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\w+)\]").expect("static regex is valid"));

/// Prepends the `monad_scope` declaration and turns `[A]` into `{A}`.
#[derive(Debug, Clone)]
pub struct MonadScopeRule {
    target: RuleTarget,
}

impl MonadScopeRule {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            target: RuleTarget::File(file.into()),
        }
    }
}

impl Default for MonadScopeRule {
    fn default() -> Self {
        Self::new("Monad.v")
    }
}

impl RewriteRule for MonadScopeRule {
    fn name(&self) -> &'static str {
        "monad-scope"
    }

    fn target(&self) -> &RuleTarget {
        &self.target
    }

    fn rewrite(&self, content: &str) -> Rewritten {
        let declared = if content.contains(SCOPE_MARKER) {
            content.to_string()
        } else {
            format!("{SCOPE_LINE}{content}")
        };

        let updated = BRACKETED_WORD
            .replace_all(&declared, |caps: &Captures<'_>| format!("{{{}}}", &caps[1]))
            .into_owned();

        Rewritten::compared(content, updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(content: &str) -> Rewritten {
        MonadScopeRule::default().rewrite(content)
    }

    #[test]
    fn test_prepends_scope_and_converts_brackets() {
        let result = apply("Arguments ret [A].\nArguments bind [A B].\n");
        assert!(result.changed);
        assert_eq!(
            result.content,
            "Declare Scope monad_scope.\nArguments ret {A}.\nArguments bind [A B].\n"
        );
    }

    #[test]
    fn test_existing_declaration_is_not_duplicated() {
        let content = "Require Import List.\nDeclare Scope monad_scope.\nArguments ret {A}.\n";
        let result = apply(content);
        assert!(!result.changed);
        assert_eq!(result.content, content);
    }

    #[test]
    fn test_multi_word_brackets_untouched() {
        let content = "Declare Scope monad_scope.\nNotation \"[ x ; y ]\" := (pair x y).\n";
        assert!(!apply(content).changed);
    }

    #[test]
    fn test_every_single_word_bracket_is_converted() {
        let result = apply("Declare Scope monad_scope.\nf [x] [y_1] [a b]\n");
        assert_eq!(
            result.content,
            "Declare Scope monad_scope.\nf {x} {y_1} [a b]\n"
        );
    }

    #[test]
    fn test_empty_content_gets_declaration() {
        let result = apply("");
        assert!(result.changed);
        assert_eq!(result.content, SCOPE_LINE);
    }

    #[test]
    fn test_converges_after_one_pass() {
        let once = apply("Arguments ret [A].\n[[nested]]\n");
        let twice = apply(&once.content);
        assert!(!twice.changed);
        assert_eq!(once.content.matches(SCOPE_MARKER).count(), 1);
    }
}
