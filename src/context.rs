// ABOUTME: Run-scoped context shared by every step of a promotion
// ABOUTME: Owns the run identifier, the direction label and the output folder layout

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Identifies one promotion run and where its artifacts land.
///
/// Read-only after creation; every object in the run shares the same
/// session id, so all files of a run sit under the same folders.
#[derive(Debug, Clone)]
pub struct RunContext {
    session_id: String,
    direction: String,
    output_root: PathBuf,
}

impl RunContext {
    /// Starts a new run identified by the current epoch time in microseconds.
    pub fn new(direction: &str, output_root: impl Into<PathBuf>) -> Self {
        Self::with_session_id(&new_session_id(), direction, output_root)
    }

    pub fn with_session_id(session_id: &str, direction: &str, output_root: impl Into<PathBuf>) -> Self {
        Self {
            session_id: session_id.to_string(),
            direction: direction.to_string(),
            output_root: output_root.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn direction(&self) -> &str {
        &self.direction
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Export and import jobs for an object share this name.
    pub fn job_name(&self, object_name: &str) -> String {
        format!("{}-{}", object_name, self.session_id)
    }

    pub fn package_folder(&self) -> PathBuf {
        self.output_root
            .join("export_to_import")
            .join(&self.direction)
            .join(&self.session_id)
    }

    pub fn package_file_name(&self, object_name: &str) -> String {
        format!("{}.zip", self.job_name(object_name))
    }

    pub fn package_path(&self, object_name: &str) -> PathBuf {
        self.package_folder().join(self.package_file_name(object_name))
    }

    pub fn export_log_folder(&self) -> PathBuf {
        self.log_root().join("log_export").join(&self.session_id)
    }

    pub fn export_log_file_name(&self, object_name: &str) -> String {
        format!("ex_{}.txt", self.job_name(object_name))
    }

    pub fn import_log_folder(&self) -> PathBuf {
        self.log_root().join("log_import").join(&self.session_id)
    }

    pub fn import_log_file_name(&self, object_name: &str) -> String {
        format!("im_{}.txt", self.job_name(object_name))
    }

    pub fn session_log_path(&self) -> PathBuf {
        self.log_root()
            .join("log_ci_cd_session")
            .join(format!("{}.log", self.session_id))
    }

    fn log_root(&self) -> PathBuf {
        self.output_root.join("log")
    }
}

fn new_session_id() -> String {
    // A clock before the epoch only happens on a broken host; fall back to 0.
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_micros())
        .unwrap_or_default();
    micros.to_string()
}
