// ABOUTME: Remote platform module
// ABOUTME: Defines the API surface the export and import drivers run against

pub mod client;
pub mod models;

pub use client::{authenticate, Credentials, EnvironmentRole, PlatformClient, Session};
pub use models::{ConflictResolution, JobState, ObjectRecord};

use anyhow::Result;
use async_trait::async_trait;

use models::{ExportRequest, ImportRequest};

/// Operations of one authenticated org.
///
/// Every call maps to a single HTTP request. Non-success responses are
/// returned as errors; deciding whether an error is fatal is left to the
/// caller.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Lists every object of `object_type` in the org.
    async fn list_objects(&self, object_type: &str) -> Result<Vec<ObjectRecord>>;

    /// Submits an export job and returns its id.
    async fn submit_export(&self, request: &ExportRequest) -> Result<String>;

    async fn export_status(&self, job_id: &str) -> Result<JobState>;

    async fn export_package(&self, job_id: &str) -> Result<Vec<u8>>;

    async fn export_log(&self, job_id: &str) -> Result<Vec<u8>>;

    /// Uploads an export package and returns the import job id.
    async fn upload_package(&self, file_name: &str, package: Vec<u8>) -> Result<String>;

    /// Starts the import of a previously uploaded package.
    async fn submit_import(&self, job_id: &str, request: &ImportRequest) -> Result<JobState>;

    async fn import_status(&self, job_id: &str) -> Result<JobState>;

    async fn import_log(&self, job_id: &str) -> Result<Vec<u8>>;
}
