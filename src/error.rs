// ABOUTME: Custom error types for the promoter
// ABOUTME: Variants the orchestrator and CLI need to tell apart, with actionable messages

use std::fmt;

#[derive(Debug)]
pub enum PromoterError {
    Configuration(String),
    Authentication(String),
    TaskList(String),
    /// Logical paths that were not found in the source catalog.
    Unresolved(Vec<String>),
    Upload { object: String, reason: String },
}

impl fmt::Display for PromoterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PromoterError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            PromoterError::Authentication(msg) => write!(f, "Authentication denied: {}", msg),
            PromoterError::TaskList(msg) => write!(f, "Task list error: {}", msg),
            PromoterError::Unresolved(paths) => write!(
                f,
                "No object id found for {} task(s): {}. Check folder and object names in the task list",
                paths.len(),
                paths.join(", ")
            ),
            PromoterError::Upload { object, reason } => write!(
                f,
                "Import package upload failed for '{}': {}. Aborting the run",
                object, reason
            ),
        }
    }
}

impl std::error::Error for PromoterError {}
