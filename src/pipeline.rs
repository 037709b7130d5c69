//! Sequential driver over all dataset examples.
//!
//! Configuration problems are caught up front and abort the run before any
//! workspace is touched. After that, each example is processed in turn and
//! its failure is logged and recorded; the loop always runs to completion.

use crate::config::{PrepConfig, PrepPaths, ValidationError};
use crate::dataset::{self, DatasetError, ExampleDescriptor};
use crate::processor::{ExampleProcessor, ExampleReport};
use crate::rewrite::RuleCatalog;
use crate::vcs::VersionControl;
use crate::workspace::{WorkspaceError, WorkspaceProvisioner};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

/// Errors that stop the run before any example is processed.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ValidationError),

    #[error("Original repository not found at {0}")]
    MissingRepository(PathBuf),

    #[error("Dataset not found at {0}")]
    MissingDataset(PathBuf),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// An example that could not be prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedExample {
    pub example: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub prepared: Vec<ExampleReport>,
    pub failed: Vec<FailedExample>,
}

impl PipelineSummary {
    pub fn total(&self) -> usize {
        self.prepared.len() + self.failed.len()
    }
}

/// Everything needed to run the pipeline, resolved and checked.
pub struct Pipeline<V: VersionControl> {
    config: PrepConfig,
    paths: PrepPaths,
    provisioner: WorkspaceProvisioner,
    catalog: RuleCatalog,
    vcs: V,
}

impl<V: VersionControl> Pipeline<V> {
    /// Validate the config and check that both input locations exist.
    pub fn new(config: PrepConfig, vcs: V) -> Result<Self, PipelineError> {
        let paths = config.paths()?;

        if !paths.canonical_repo.is_dir() {
            return Err(PipelineError::MissingRepository(paths.canonical_repo));
        }
        if !paths.dataset_dir.is_dir() {
            return Err(PipelineError::MissingDataset(paths.dataset_dir));
        }

        let provisioner = WorkspaceProvisioner::new(
            &paths.work_dir,
            &paths.canonical_repo,
            config.workspace_prefix.clone(),
        )?;
        let catalog = RuleCatalog::standard(&config.source_extension, config.monad_file.clone());

        Ok(Self {
            config,
            paths,
            provisioner,
            catalog,
            vcs,
        })
    }

    pub fn paths(&self) -> &PrepPaths {
        &self.paths
    }

    pub fn provisioner(&self) -> &WorkspaceProvisioner {
        &self.provisioner
    }

    /// Record files selected for this run, after the example limit.
    pub fn discover(&self) -> Result<Vec<PathBuf>, PipelineError> {
        let files = dataset::discover(&self.paths.dataset_dir, self.config.example_limit)?;
        info!(
            count = files.len(),
            dataset = %self.paths.dataset_dir.display(),
            "selected dataset records"
        );
        Ok(files)
    }

    /// Process every selected example in order.
    ///
    /// `pause` runs between consecutive examples, never after the last one,
    /// and only when pausing is enabled and more than one example is selected.
    /// `on_report` sees each example's outcome as soon as it is known.
    pub fn run<P, R>(&self, mut pause: P, mut on_report: R) -> Result<PipelineSummary, PipelineError>
    where
        P: FnMut(&ExampleDescriptor),
        R: FnMut(&Result<ExampleReport, FailedExample>),
    {
        let files = self.discover()?;
        let processor = ExampleProcessor::new(&self.provisioner, &self.vcs, &self.catalog);
        let should_pause = self.config.pause && files.len() > 1;

        let mut summary = PipelineSummary::default();
        for (idx, file) in files.iter().enumerate() {
            let outcome = dataset::load_descriptor(file)
                .map_err(|e| e.to_string())
                .and_then(|example| {
                    processor
                        .process(&example)
                        .map(|report| (example, report))
                        .map_err(|e| e.to_string())
                });

            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());

            let (example, outcome) = match outcome {
                Ok((example, report)) => (Some(example), Ok(report)),
                Err(reason) => {
                    error!(example = %name, %reason, "example failed");
                    (
                        None,
                        Err(FailedExample {
                            example: name.clone(),
                            reason,
                        }),
                    )
                }
            };

            on_report(&outcome);
            match outcome {
                Ok(report) => summary.prepared.push(report),
                Err(failed) => summary.failed.push(failed),
            }

            if should_pause && idx + 1 < files.len() {
                let example = example.unwrap_or_else(|| ExampleDescriptor::new(name, None));
                pause(&example);
            }
        }

        info!(
            prepared = summary.prepared.len(),
            failed = summary.failed.len(),
            "run complete"
        );
        Ok(summary)
    }
}
