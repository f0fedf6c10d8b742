// ABOUTME: Export side of a promotion against the source org
// ABOUTME: Submits export jobs, waits for them and downloads package and log

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::artifact::{save_artifact, sha256_hex};
use crate::poll::{poll_until, PollOutcome, PollPolicy};
use crate::remote::models::ExportRequest;
use crate::remote::{JobState, Platform};

pub struct ExportDriver<'a> {
    platform: &'a dyn Platform,
    policy: PollPolicy,
}

impl<'a> ExportDriver<'a> {
    pub fn new(platform: &'a dyn Platform, policy: PollPolicy) -> Self {
        Self { platform, policy }
    }

    /// Submits a single-object export without dependencies.
    pub async fn submit_export(&self, job_name: &str, object_id: &str) -> Result<String> {
        let request = ExportRequest::single(job_name, object_id);
        match self.platform.submit_export(&request).await {
            Ok(job_id) => {
                info!(job_name, job_id = %job_id, "Export job submitted");
                Ok(job_id)
            }
            Err(e) => {
                error!(job_name, object_id, error = %e, "Export job submission failed");
                Err(e)
            }
        }
    }

    /// A failing status call is an error, not an unknown state.
    pub async fn poll_export_status(&self, job_id: &str) -> Result<JobState> {
        self.platform
            .export_status(job_id)
            .await
            .with_context(|| format!("Failed to check status of export job {}", job_id))
    }

    /// Polls until the job is `SUCCESSFUL` or the attempt budget is spent.
    pub async fn await_export(&self, job_id: &str) -> Result<PollOutcome<JobState>> {
        let outcome = poll_until(
            &self.policy,
            |attempt| async move {
                let state = self.poll_export_status(job_id).await?;
                info!(job_id, attempt, state = %state, "Checked export job status");
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
                "Export job did not succeed in time, check its status later or repeat it"
            );
        }
        Ok(outcome)
    }

    pub async fn download_package(&self, job_id: &str, folder: &Path, file_name: &str) -> Result<PathBuf> {
        let result = async {
            let package = self.platform.export_package(job_id).await?;
            let path = save_artifact(folder, file_name, &package).await?;
            info!(
                path = %path.display(),
                bytes = package.len(),
                sha256 = %sha256_hex(&package),
                "Package saved"
            );
            Ok::<_, anyhow::Error>(path)
        }
        .await;

        if let Err(e) = &result {
            error!(job_id, error = %e, "Failed to save export package");
        }
        result
    }

    /// Attempted whether or not the package itself was saved.
    pub async fn download_log(&self, job_id: &str, folder: &Path, file_name: &str) -> Result<PathBuf> {
        let result = async {
            let log = self.platform.export_log(job_id).await?;
            let path = save_artifact(folder, file_name, &log).await?;
            info!(path = %path.display(), "Export log saved");
            Ok::<_, anyhow::Error>(path)
        }
        .await;

        if let Err(e) = &result {
            error!(job_id, error = %e, "Failed to save export log");
        }
        result
    }
}
