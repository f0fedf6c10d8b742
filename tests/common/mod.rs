// ABOUTME: In-memory platform used by the integration tests
// ABOUTME: Serves scripted catalog, job ids and job states and records every call

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use ic_promoter::poll::PollPolicy;
use ic_promoter::remote::models::{ExportRequest, ImportRequest};
use ic_promoter::remote::{JobState, ObjectRecord, Platform};
use ic_promoter::PromotionSettings;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListObjects(String),
    SubmitExport {
        name: String,
        object_id: String,
        include_dependencies: bool,
    },
    ExportStatus(String),
    ExportPackage(String),
    ExportLog(String),
    UploadPackage {
        file_name: String,
        bytes: Vec<u8>,
    },
    SubmitImport {
        job_id: String,
        body: serde_json::Value,
    },
    ImportStatus(String),
    ImportLog(String),
}

#[derive(Default)]
struct State {
    catalog: Vec<(String, Vec<ObjectRecord>)>,
    failing_types: HashSet<String>,
    export_ids: VecDeque<String>,
    failing_exports: HashSet<String>,
    export_states: HashMap<String, VecDeque<JobState>>,
    import_states: HashMap<String, VecDeque<JobState>>,
    status_error: bool,
    package_error: bool,
    upload_error: bool,
    import_submit_error: bool,
    exports_submitted: usize,
    uploads: usize,
    calls: Vec<Call>,
}

/// Calls of several platforms in one order, each tagged with its org.
pub type Journal = Arc<Mutex<Vec<(String, Call)>>>;

#[derive(Default)]
pub struct MockPlatform {
    state: Mutex<State>,
    journal: Option<(String, Journal)>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects(self, object_type: &str, objects: &[(&str, &str)]) -> Self {
        let records = objects
            .iter()
            .map(|(path, id)| ObjectRecord::new(path, id))
            .collect();
        self.state
            .lock()
            .unwrap()
            .catalog
            .push((object_type.to_string(), records));
        self
    }

    /// Also records every call into `journal` under `org`.
    pub fn with_journal(mut self, org: &str, journal: &Journal) -> Self {
        self.journal = Some((org.to_string(), Arc::clone(journal)));
        self
    }

    pub fn failing_listing(self, object_type: &str) -> Self {
        self.state.lock().unwrap().failing_types.insert(object_type.to_string());
        self
    }

    /// Ids handed out by successive export submissions; `E<n>` afterwards.
    pub fn with_export_ids(self, ids: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .export_ids
            .extend(ids.iter().map(|id| id.to_string()));
        self
    }

    pub fn failing_export_for(self, object_id: &str) -> Self {
        self.state.lock().unwrap().failing_exports.insert(object_id.to_string());
        self
    }

    /// States returned by successive polls of `job_id`; the last one repeats.
    pub fn with_export_states(self, job_id: &str, states: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .export_states
            .insert(job_id.to_string(), states.iter().map(|s| JobState::from(*s)).collect());
        self
    }

    pub fn with_import_states(self, job_id: &str, states: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .import_states
            .insert(job_id.to_string(), states.iter().map(|s| JobState::from(*s)).collect());
        self
    }

    pub fn failing_status(self) -> Self {
        self.state.lock().unwrap().status_error = true;
        self
    }

    pub fn failing_package(self) -> Self {
        self.state.lock().unwrap().package_error = true;
        self
    }

    pub fn failing_upload(self) -> Self {
        self.state.lock().unwrap().upload_error = true;
        self
    }

    pub fn failing_import_submit(self) -> Self {
        self.state.lock().unwrap().import_submit_error = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    fn record(&self, call: Call) {
        if let Some((org, journal)) = &self.journal {
            journal.lock().unwrap().push((org.clone(), call.clone()));
        }
        self.state.lock().unwrap().calls.push(call);
    }
}

fn next_state(states: &mut HashMap<String, VecDeque<JobState>>, job_id: &str) -> JobState {
    match states.get_mut(job_id) {
        Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(JobState::Successful),
        Some(queue) => queue.front().cloned().unwrap_or(JobState::Successful),
        None => JobState::Successful,
    }
}

pub fn package_bytes(job_id: &str) -> Vec<u8> {
    format!("PK-package-{}", job_id).into_bytes()
}

#[async_trait]
impl Platform for MockPlatform {
    async fn list_objects(&self, object_type: &str) -> Result<Vec<ObjectRecord>> {
        self.record(Call::ListObjects(object_type.to_string()));
        let state = self.state.lock().unwrap();
        if state.failing_types.contains(object_type) {
            return Err(anyhow!("Request for listing failed with status 500 Internal Server Error"));
        }
        Ok(state
            .catalog
            .iter()
            .filter(|(t, _)| t == object_type)
            .flat_map(|(_, objects)| objects.clone())
            .collect())
    }

    async fn submit_export(&self, request: &ExportRequest) -> Result<String> {
        let object = &request.objects[0];
        self.record(Call::SubmitExport {
            name: request.name.clone(),
            object_id: object.id.clone(),
            include_dependencies: object.include_dependencies,
        });
        let mut state = self.state.lock().unwrap();
        if state.failing_exports.contains(&object.id) {
            return Err(anyhow!("Request for export job submission failed with status 400"));
        }
        state.exports_submitted += 1;
        let fallback = format!("E{}", state.exports_submitted);
        Ok(state.export_ids.pop_front().unwrap_or(fallback))
    }

    async fn export_status(&self, job_id: &str) -> Result<JobState> {
        self.record(Call::ExportStatus(job_id.to_string()));
        let mut state = self.state.lock().unwrap();
        if state.status_error {
            return Err(anyhow!("Request for export job status failed with status 401"));
        }
        Ok(next_state(&mut state.export_states, job_id))
    }

    async fn export_package(&self, job_id: &str) -> Result<Vec<u8>> {
        self.record(Call::ExportPackage(job_id.to_string()));
        if self.state.lock().unwrap().package_error {
            return Err(anyhow!("Request for export package failed with status 404"));
        }
        Ok(package_bytes(job_id))
    }

    async fn export_log(&self, job_id: &str) -> Result<Vec<u8>> {
        self.record(Call::ExportLog(job_id.to_string()));
        Ok(format!("export log {}", job_id).into_bytes())
    }

    async fn upload_package(&self, file_name: &str, package: Vec<u8>) -> Result<String> {
        self.record(Call::UploadPackage {
            file_name: file_name.to_string(),
            bytes: package,
        });
        let mut state = self.state.lock().unwrap();
        if state.upload_error {
            return Err(anyhow!("Request for import package upload failed with status 403"));
        }
        state.uploads += 1;
        Ok(format!("I{}", state.uploads))
    }

    async fn submit_import(&self, job_id: &str, request: &ImportRequest) -> Result<JobState> {
        self.record(Call::SubmitImport {
            job_id: job_id.to_string(),
            body: serde_json::to_value(request)?,
        });
        if self.state.lock().unwrap().import_submit_error {
            return Err(anyhow!("Request for import job submission failed with status 400"));
        }
        Ok(JobState::Queued)
    }

    async fn import_status(&self, job_id: &str) -> Result<JobState> {
        self.record(Call::ImportStatus(job_id.to_string()));
        let mut state = self.state.lock().unwrap();
        if state.status_error {
            return Err(anyhow!("Request for import job status failed with status 401"));
        }
        Ok(next_state(&mut state.import_states, job_id))
    }

    async fn import_log(&self, job_id: &str) -> Result<Vec<u8>> {
        self.record(Call::ImportLog(job_id.to_string()));
        Ok(format!("import log {}", job_id).into_bytes())
    }
}

/// Default settings with no waiting between polls.
pub fn fast_settings() -> PromotionSettings {
    PromotionSettings {
        export_policy: PollPolicy::immediate(10),
        import_policy: PollPolicy::immediate(14),
        ..PromotionSettings::default()
    }
}
