// ABOUTME: Sequences a promotion run object by object
// ABOUTME: Resolve, export, poll, download, upload, import, poll, download; one object at a time

use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, info_span, warn, Instrument};

use crate::catalog::{build_catalog, ResolvedObject, DEFAULT_OBJECT_TYPES};
use crate::context::RunContext;
use crate::error::PromoterError;
use crate::export::ExportDriver;
use crate::import::ImportDriver;
use crate::poll::PollPolicy;
use crate::remote::{ConflictResolution, Platform};
use crate::tasks::MigrationTask;

#[derive(Debug, Clone)]
pub struct PromotionSettings {
    pub object_types: Vec<String>,
    pub conflict_resolution: ConflictResolution,
    pub export_policy: PollPolicy,
    pub import_policy: PollPolicy,
}

impl Default for PromotionSettings {
    fn default() -> Self {
        Self {
            object_types: DEFAULT_OBJECT_TYPES.iter().map(|t| t.to_string()).collect(),
            conflict_resolution: ConflictResolution::default(),
            export_policy: PollPolicy::export_default(),
            import_policy: PollPolicy::import_default(),
        }
    }
}

/// Where an object's promotion got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectState {
    Resolved,
    ExportSubmitFailed,
    ExportSubmitted,
    ExportPolling,
    ExportDone,
    ExportTimeout,
    PackageSaved,
    PackageSaveFailed,
    ImportUploaded,
    ImportSubmitFailed,
    ImportSubmitted,
    ImportPolling,
    ImportDone,
    ImportTimeout,
    LogSaved,
}

impl fmt::Display for ObjectState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ObjectState::Resolved => "RESOLVED",
            ObjectState::ExportSubmitFailed => "EXPORT_SUBMIT_FAILED",
            ObjectState::ExportSubmitted => "EXPORT_SUBMITTED",
            ObjectState::ExportPolling => "EXPORT_POLLING",
            ObjectState::ExportDone => "EXPORT_DONE",
            ObjectState::ExportTimeout => "EXPORT_TIMEOUT",
            ObjectState::PackageSaved => "PACKAGE_SAVED",
            ObjectState::PackageSaveFailed => "PACKAGE_SAVE_FAILED",
            ObjectState::ImportUploaded => "IMPORT_UPLOADED",
            ObjectState::ImportSubmitFailed => "IMPORT_SUBMIT_FAILED",
            ObjectState::ImportSubmitted => "IMPORT_SUBMITTED",
            ObjectState::ImportPolling => "IMPORT_POLLING",
            ObjectState::ImportDone => "IMPORT_DONE",
            ObjectState::ImportTimeout => "IMPORT_TIMEOUT",
            ObjectState::LogSaved => "LOG_SAVED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct ObjectOutcome {
    pub object: ResolvedObject,
    /// Every state the object passed through, in order.
    pub trace: Vec<ObjectState>,
    pub export_job_id: Option<String>,
    pub import_job_id: Option<String>,
    pub package_path: Option<PathBuf>,
    pub export_log_path: Option<PathBuf>,
    pub import_log_path: Option<PathBuf>,
}

impl ObjectOutcome {
    fn new(object: ResolvedObject) -> Self {
        Self {
            object,
            trace: vec![ObjectState::Resolved],
            export_job_id: None,
            import_job_id: None,
            package_path: None,
            export_log_path: None,
            import_log_path: None,
        }
    }

    fn advance(&mut self, state: ObjectState) {
        info!(path = %self.object.path, state = %state, "Object state changed");
        self.trace.push(state);
    }

    pub fn final_state(&self) -> ObjectState {
        self.trace.last().copied().unwrap_or(ObjectState::Resolved)
    }

    pub fn reached(&self, state: ObjectState) -> bool {
        self.trace.contains(&state)
    }

    pub fn is_promoted(&self) -> bool {
        self.reached(ObjectState::ImportDone)
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub session_id: String,
    pub outcomes: Vec<ObjectOutcome>,
}

impl RunReport {
    pub fn promoted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_promoted()).count()
    }

    pub fn incomplete(&self) -> impl Iterator<Item = &ObjectOutcome> {
        self.outcomes.iter().filter(|o| !o.is_promoted())
    }
}

/// Drives one run from the source org to the target org.
pub struct Orchestrator<'a> {
    source: &'a dyn Platform,
    target: &'a dyn Platform,
    ctx: &'a RunContext,
    settings: PromotionSettings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        source: &'a dyn Platform,
        target: &'a dyn Platform,
        ctx: &'a RunContext,
        settings: PromotionSettings,
    ) -> Self {
        Self {
            source,
            target,
            ctx,
            settings,
        }
    }

    /// Resolves every task first; any unresolved task aborts the run before
    /// a single export is submitted. Objects are then promoted one at a time.
    pub async fn run(&self, tasks: &[MigrationTask]) -> Result<RunReport> {
        info!(
            session_id = %self.ctx.session_id(),
            direction = %self.ctx.direction(),
            tasks = tasks.len(),
            "Starting promotion run"
        );

        let catalog = build_catalog(self.source, &self.settings.object_types).await;
        info!(entries = catalog.len(), "Source catalog built");
        let objects = catalog.resolve(tasks).into_objects()?;

        let total = objects.len();
        let mut outcomes = Vec::with_capacity(total);
        for (index, object) in objects.into_iter().enumerate() {
            let span = info_span!("object", step = index + 1, of = total, path = %object.path);
            let outcome = self.promote_object(object).instrument(span).await?;
            outcomes.push(outcome);
        }

        let report = RunReport {
            session_id: self.ctx.session_id().to_string(),
            outcomes,
        };
        info!(
            session_id = %report.session_id,
            promoted = report.promoted(),
            total,
            "Export and import finished"
        );
        Ok(report)
    }

    async fn promote_object(&self, object: ResolvedObject) -> Result<ObjectOutcome> {
        let exporter = ExportDriver::new(self.source, self.settings.export_policy);
        let importer = ImportDriver::new(self.target, self.settings.import_policy);

        let name = object.name.clone();
        let object_id = object.id.clone();
        let job_name = self.ctx.job_name(&name);
        let mut outcome = ObjectOutcome::new(object);
        info!(id = %object_id, job_name = %job_name, "Promoting object");

        let export_job_id = match exporter.submit_export(&job_name, &object_id).await {
            Ok(job_id) => job_id,
            Err(_) => {
                outcome.advance(ObjectState::ExportSubmitFailed);
                warn!("Skipping object, export job was not created");
                return Ok(outcome);
            }
        };
        outcome.export_job_id = Some(export_job_id.clone());
        outcome.advance(ObjectState::ExportSubmitted);

        outcome.advance(ObjectState::ExportPolling);
        let export = exporter.await_export(&export_job_id).await?;
        if export.is_reached() {
            outcome.advance(ObjectState::ExportDone);
            match exporter
                .download_package(
                    &export_job_id,
                    &self.ctx.package_folder(),
                    &self.ctx.package_file_name(&name),
                )
                .await
            {
                Ok(path) => {
                    outcome.package_path = Some(path);
                    outcome.advance(ObjectState::PackageSaved);
                }
                Err(_) => outcome.advance(ObjectState::PackageSaveFailed),
            }
        } else {
            outcome.advance(ObjectState::ExportTimeout);
        }

        outcome.export_log_path = exporter
            .download_log(
                &export_job_id,
                &self.ctx.export_log_folder(),
                &self.ctx.export_log_file_name(&name),
            )
            .await
            .ok();

        let Some(package_path) = outcome.package_path.clone() else {
            warn!("Skipping import, no export package for this object");
            return Ok(outcome);
        };

        let import_job_id = importer
            .upload_package(&package_path)
            .await
            .map_err(|e| PromoterError::Upload {
                object: outcome.object.path.clone(),
                reason: format!("{:#}", e),
            })?;
        outcome.import_job_id = Some(import_job_id.clone());
        outcome.advance(ObjectState::ImportUploaded);

        let object_ids = [object_id];
        if importer
            .submit_import(
                &import_job_id,
                &job_name,
                &object_ids,
                self.settings.conflict_resolution,
            )
            .await
            .is_err()
        {
            outcome.advance(ObjectState::ImportSubmitFailed);
            warn!("Skipping object, import job was not started");
            return Ok(outcome);
        }
        outcome.advance(ObjectState::ImportSubmitted);

        outcome.advance(ObjectState::ImportPolling);
        let import = importer.await_import(&import_job_id).await?;
        outcome.advance(if import.is_reached() {
            ObjectState::ImportDone
        } else {
            ObjectState::ImportTimeout
        });

        if let Ok(path) = importer
            .download_import_log(
                &import_job_id,
                &self.ctx.import_log_folder(),
                &self.ctx.import_log_file_name(&name),
            )
            .await
        {
            outcome.import_log_path = Some(path);
            outcome.advance(ObjectState::LogSaved);
        }

        Ok(outcome)
    }
}
