//! Run orchestration.
//!
//! The [`Runner`] lists the target classes, feeds each one through the
//! [`Annotator`] and reports progress to a [`Presenter`]. A failure in one
//! class is recorded and the run moves on; only errors that invalidate the
//! whole run (an unknown `dataClass`) abort it.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::annotate::{Annotator, ClassOutcome};
use crate::config::AnnotateConfig;
use crate::error::{AnnotateError, Result};
use crate::registry::ModelRegistry;
use crate::report::{MessageStatus, Presenter};

/// Parameters echoed at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunParams {
    pub data_class: Option<String>,
    pub dry_run: bool,
    pub add_use_statements: bool,
    pub create_backup_file: bool,
    pub quiet: bool,
}

impl RunParams {
    pub fn from_config(config: &AnnotateConfig) -> Self {
        Self {
            data_class: config.data_class.clone(),
            dry_run: config.dry_run,
            add_use_statements: config.add_use_statements,
            create_backup_file: config.create_backup_file,
            quiet: config.quiet,
        }
    }
}

/// Final state of one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    /// Nothing to add.
    Unchanged,
    /// Annotations generated but not written (dry run).
    Annotated,
    Written,
    Failed,
}

/// Per-class result.
#[derive(Debug, Clone, Serialize)]
pub struct ClassReport {
    pub fqn: String,
    pub path: Option<PathBuf>,
    pub status: ClassStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties_added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods_added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports_added: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    /// Resulting file content, kept for dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClassReport {
    fn from_outcome(outcome: ClassOutcome, dry_run: bool) -> Self {
        let status = if outcome.written() {
            ClassStatus::Written
        } else if outcome.changed() {
            ClassStatus::Annotated
        } else {
            ClassStatus::Unchanged
        };

        Self {
            fqn: outcome.fqn,
            path: Some(outcome.path),
            status,
            properties_added: outcome.properties_added,
            methods_added: outcome.methods_added,
            imports_added: outcome.imports_added,
            backup: outcome.backup,
            content: dry_run.then_some(outcome.content),
            error: None,
        }
    }

    fn failed(fqn: &str, path: Option<PathBuf>, error: &AnnotateError) -> Self {
        Self {
            fqn: fqn.to_string(),
            path,
            status: ClassStatus::Failed,
            properties_added: Vec::new(),
            methods_added: Vec::new(),
            imports_added: Vec::new(),
            backup: None,
            content: None,
            error: Some(error.to_string()),
        }
    }
}

/// Result of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub processed: usize,
    pub changed: usize,
    pub written: usize,
    pub failed: usize,
    pub classes: Vec<ClassReport>,
}

impl RunSummary {
    pub fn new(dry_run: bool, classes: Vec<ClassReport>) -> Self {
        let count = |status: ClassStatus| classes.iter().filter(|c| c.status == status).count();
        Self {
            dry_run,
            processed: classes.len(),
            changed: count(ClassStatus::Annotated) + count(ClassStatus::Written),
            written: count(ClassStatus::Written),
            failed: count(ClassStatus::Failed),
            classes,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Drives an annotation run over a registry.
pub struct Runner<'r, R: ModelRegistry + ?Sized> {
    registry: &'r R,
    annotator: Annotator<'r, R>,
    params: RunParams,
}

impl<'r, R: ModelRegistry + ?Sized> Runner<'r, R> {
    pub fn new(registry: &'r R, config: &AnnotateConfig) -> Self {
        Self {
            registry,
            annotator: Annotator::new(registry, config.field_filter(), config.annotate_options()),
            params: RunParams::from_config(config),
        }
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    /// Annotate every target class.
    pub fn run(&self, presenter: &mut dyn Presenter) -> Result<RunSummary> {
        present(presenter.run_header(&self.params))?;

        let classes = self
            .registry
            .list_target_classes(self.params.data_class.as_deref())?;
        tracing::info!(classes = classes.len(), dry_run = self.params.dry_run, "starting annotation run");

        let mut reports = Vec::with_capacity(classes.len());
        for (index, fqn) in classes.iter().enumerate() {
            let report = match self.annotator.annotate(fqn) {
                Ok(outcome) => {
                    self.present_outcome(presenter, &outcome)?;
                    ClassReport::from_outcome(outcome, self.params.dry_run)
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::error!(class = %fqn, error = %e, "error generating annotations");
                    let path = self.registry.locate_source_file(fqn);
                    present(presenter.class_header(fqn, path.as_deref().unwrap_or(Path::new(""))))?;
                    present(presenter.message("Error generating annotations", MessageStatus::Error))?;
                    ClassReport::failed(fqn, path, &e)
                }
            };
            reports.push(report);

            if index + 1 < classes.len() {
                present(presenter.separator())?;
            }
        }

        let summary = RunSummary::new(self.params.dry_run, reports);
        tracing::info!(
            processed = summary.processed,
            changed = summary.changed,
            written = summary.written,
            failed = summary.failed,
            "annotation run finished"
        );
        present(presenter.run_footer(&summary))?;

        Ok(summary)
    }

    fn present_outcome(&self, presenter: &mut dyn Presenter, outcome: &ClassOutcome) -> Result<()> {
        present(presenter.class_header(&outcome.fqn, &outcome.path))?;

        if let Some(backup) = &outcome.backup {
            let text = format!("Creating backup file at {}", backup.display());
            present(presenter.message(&text, MessageStatus::Info))?;
        }
        if outcome.written() {
            let text = format!("Writing file {}", outcome.path.display());
            present(presenter.message(&text, MessageStatus::Info))?;
        } else if !outcome.changed() {
            let text = format!("No update for {}", outcome.path.display());
            present(presenter.message(&text, MessageStatus::Info))?;
        }

        present(presenter.message("Generating annotations done", MessageStatus::Success))?;

        if self.params.dry_run {
            present(presenter.source(&outcome.path, &outcome.content))?;
        }
        Ok(())
    }
}

fn present(result: std::io::Result<()>) -> Result<()> {
    result.map_err(|e| AnnotateError::io("<output>", e))
}
