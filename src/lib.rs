//! Proof Prep: reproducible working copies of a proof repository at
//! historical broken-proof commits.
//!
//! For each dataset example the pipeline:
//!
//! 1. Provisions a fresh copy of the canonical repository, destroying any
//!    previous copy for the same example ([`WorkspaceProvisioner`]).
//! 2. Resets, cleans, and checks out the example's initial revision
//!    ([`materialize`]).
//! 3. Applies an ordered catalog of idempotent textual rewrites so every
//!    checkout compiles against the same syntax baseline ([`RuleCatalog`]).
//!
//! # Example
//!
//! ```no_run
//! use proof_prep::{ExampleDescriptor, ExampleProcessor, GitCli, RuleCatalog, WorkspaceProvisioner};
//!
//! let provisioner = WorkspaceProvisioner::new("/work", "/work/Coq-Flow-Equivalence", "test_")?;
//! let catalog = RuleCatalog::default();
//! let git = GitCli::default();
//!
//! let example = ExampleDescriptor::new("example_1.json", Some("abc123"));
//! let report = ExampleProcessor::new(&provisioner, &git, &catalog).process(&example)?;
//! println!("prepared {}", report.workspace.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod dataset;
pub mod pipeline;
pub mod processor;
pub mod rewrite;
pub mod safety;
pub mod vcs;
pub mod workspace;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, PrepConfig, PrepPaths};
pub use dataset::{load_descriptor, DatasetError, ExampleDescriptor};
pub use pipeline::{FailedExample, Pipeline, PipelineError, PipelineSummary};
pub use processor::{ExampleProcessor, ExampleReport, ProcessError};
pub use rewrite::{
    FileChange, LiaTacticRule, MonadScopeRule, RewriteError, RewriteRule, Rewritten,
    RuleCatalog, RuleTarget, TreeRewrite,
};
pub use safety::{SafetyError, WorkspaceGuard};
pub use vcs::{materialize, GitCli, MaterializeReport, StepOutcome, VcsError, VersionControl};
pub use workspace::{workspace_name, WorkspaceError, WorkspaceProvisioner};
