//! Per-example preparation: provision, materialize, rewrite.
//!
//! The sequence is linear. Version-control failures are recorded in the
//! report but do not stop the rewrite pass; only filesystem failures while
//! provisioning or rewriting make an example fail.

use crate::dataset::ExampleDescriptor;
use crate::rewrite::{RewriteError, RuleCatalog, TreeRewrite};
use crate::vcs::{materialize, MaterializeReport, VersionControl};
use crate::workspace::{WorkspaceError, WorkspaceProvisioner};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, info_span};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to provision workspace for {example}: {source}")]
    Provision {
        example: String,
        #[source]
        source: WorkspaceError,
    },

    #[error("Failed to rewrite sources in {workspace}: {source}")]
    Rewrite {
        workspace: PathBuf,
        #[source]
        source: RewriteError,
    },
}

/// Outcome of preparing one example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleReport {
    pub example: String,
    pub workspace: PathBuf,
    pub materialize: MaterializeReport,
    pub rewrite: TreeRewrite,
}

impl ExampleReport {
    /// Whether any version-control step failed along the way.
    pub fn has_vcs_failures(&self) -> bool {
        !self.materialize.failures().is_empty()
    }
}

pub struct ExampleProcessor<'a, V: VersionControl + ?Sized> {
    provisioner: &'a WorkspaceProvisioner,
    vcs: &'a V,
    catalog: &'a RuleCatalog,
}

impl<'a, V: VersionControl + ?Sized> ExampleProcessor<'a, V> {
    pub fn new(
        provisioner: &'a WorkspaceProvisioner,
        vcs: &'a V,
        catalog: &'a RuleCatalog,
    ) -> Self {
        Self {
            provisioner,
            vcs,
            catalog,
        }
    }

    pub fn process(&self, example: &ExampleDescriptor) -> Result<ExampleReport, ProcessError> {
        let _span = info_span!("example", name = %example.name).entered();

        let workspace =
            self.provisioner
                .provision(&example.name)
                .map_err(|source| ProcessError::Provision {
                    example: example.name.clone(),
                    source,
                })?;

        let materialize = materialize(self.vcs, &workspace, example.revision.as_deref());

        info!("running preprocessing steps on sources");
        let rewrite = self
            .catalog
            .apply_to_tree(&workspace)
            .map_err(|source| ProcessError::Rewrite {
                workspace: workspace.clone(),
                source,
            })?;

        info!(
            changed = rewrite.changed.len(),
            scanned = rewrite.scanned,
            "example prepared"
        );

        Ok(ExampleReport {
            example: example.name.clone(),
            workspace,
            materialize,
            rewrite,
        })
    }
}
