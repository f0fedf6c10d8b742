// ABOUTME: Data structures for platform login, catalog, export and import calls
// ABOUTME: These are serialized to JSON in the platform's camelCase wire format

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            kind: "login",
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub server_url: String,
    pub ic_session_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectList {
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: String,
    pub path: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
}

impl ObjectRecord {
    pub fn new(path: &str, id: &str) -> Self {
        Self {
            id: id.to_string(),
            path: path.to_string(),
            object_type: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest {
    pub name: String,
    pub objects: Vec<ExportObject>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportObject {
    pub id: String,
    pub include_dependencies: bool,
}

impl ExportRequest {
    /// A single-object export; dependencies are never pulled in.
    pub fn single(name: &str, object_id: &str) -> Self {
        Self {
            name: name.to_string(),
            objects: vec![ExportObject {
                id: object_id.to_string(),
                include_dependencies: false,
            }],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportJobResponse {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub job_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatusBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusBody {
    pub state: JobState,
}

/// State of an asynchronous export or import job.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum JobState {
    Successful,
    Failed,
    InProgress,
    Queued,
    Other(String),
}

impl JobState {
    pub fn is_successful(&self) -> bool {
        matches!(self, JobState::Successful)
    }
}

impl From<String> for JobState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "SUCCESSFUL" => JobState::Successful,
            "FAILED" => JobState::Failed,
            "IN_PROGRESS" => JobState::InProgress,
            "QUEUED" => JobState::Queued,
            _ => JobState::Other(state),
        }
    }
}

impl From<&str> for JobState {
    fn from(state: &str) -> Self {
        JobState::from(state.to_string())
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobState::Successful => f.write_str("SUCCESSFUL"),
            JobState::Failed => f.write_str("FAILED"),
            JobState::InProgress => f.write_str("IN_PROGRESS"),
            JobState::Queued => f.write_str("QUEUED"),
            JobState::Other(state) => f.write_str(state),
        }
    }
}

/// Platform policy for objects that already exist in the target org.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictResolution {
    #[default]
    Overwrite,
    Reuse,
}

impl ConflictResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictResolution::Overwrite => "OVERWRITE",
            ConflictResolution::Reuse => "REUSE",
        }
    }
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub name: String,
    pub import_specification: ImportSpecification,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSpecification {
    pub default_conflict_resolution: ConflictResolution,
    pub include_objects: Vec<String>,
}

impl ImportRequest {
    pub fn new(name: &str, object_ids: &[String], conflict_resolution: ConflictResolution) -> Self {
        Self {
            name: name.to_string(),
            import_specification: ImportSpecification {
                default_conflict_resolution: conflict_resolution,
                include_objects: object_ids.to_vec(),
            },
        }
    }
}
