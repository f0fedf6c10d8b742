// ABOUTME: Import side of a promotion against the target org
// ABOUTME: Uploads packages, starts import jobs, waits for them and downloads their log

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::artifact::save_artifact;
use crate::poll::{poll_until, PollOutcome, PollPolicy};
use crate::remote::models::ImportRequest;
use crate::remote::{ConflictResolution, JobState, Platform};

pub struct ImportDriver<'a> {
    platform: &'a dyn Platform,
    policy: PollPolicy,
}

impl<'a> ImportDriver<'a> {
    pub fn new(platform: &'a dyn Platform, policy: PollPolicy) -> Self {
        Self { platform, policy }
    }

    /// Uploads the package at `file_path` and returns the import job id.
    pub async fn upload_package(&self, file_path: &Path) -> Result<String> {
        let package = tokio::fs::read(file_path)
            .await
            .with_context(|| format!("Failed to read package {}", file_path.display()))?;
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "package.zip".to_string());

        match self.platform.upload_package(&file_name, package).await {
            Ok(job_id) => {
                info!(file = %file_path.display(), job_id = %job_id, "Import package uploaded");
                Ok(job_id)
            }
            Err(e) => {
                error!(file = %file_path.display(), error = %e, "Import package upload failed");
                Err(e)
            }
        }
    }

    pub async fn submit_import(
        &self,
        job_id: &str,
        job_name: &str,
        object_ids: &[String],
        conflict_resolution: ConflictResolution,
    ) -> Result<JobState> {
        let request = ImportRequest::new(job_name, object_ids, conflict_resolution);
        match self.platform.submit_import(job_id, &request).await {
            Ok(state) => {
                info!(
                    job_id,
                    job_name,
                    conflict_resolution = %conflict_resolution,
                    state = %state,
                    "Import job submitted"
                );
                Ok(state)
            }
            Err(e) => {
                error!(job_id, job_name, error = %e, "Import job submission failed");
                Err(e)
            }
        }
    }

    pub async fn poll_import_status(&self, job_id: &str) -> Result<JobState> {
        self.platform
            .import_status(job_id)
            .await
            .with_context(|| format!("Failed to check status of import job {}", job_id))
    }

    /// Polls the import job (keyed on the upload's job id) until it succeeds
    /// or the attempt budget is spent.
    pub async fn await_import(&self, job_id: &str) -> Result<PollOutcome<JobState>> {
        let outcome = poll_until(
            &self.policy,
            |attempt| async move {
                let state = self.poll_import_status(job_id).await?;
                info!(job_id, attempt, state = %state, "Checked import job status");
                Ok::<_, anyhow::Error>(state)
            },
            JobState::is_successful,
        )
        .await?;

        if !outcome.is_reached() {
            warn!(
                job_id,
                attempts = outcome.attempts(),
                last_state = ?outcome.last().map(ToString::to_string),
                "Import job did not succeed in time, check its status later or repeat it"
            );
        }
        Ok(outcome)
    }

    pub async fn download_import_log(&self, job_id: &str, folder: &Path, file_name: &str) -> Result<PathBuf> {
        let result = async {
            let log = self.platform.import_log(job_id).await?;
            let path = save_artifact(folder, file_name, &log).await?;
            info!(path = %path.display(), "Import log saved");
            Ok::<_, anyhow::Error>(path)
        }
        .await;

        if let Err(e) = &result {
            error!(job_id, error = %e, "Failed to save import log");
        }
        result
    }
}
