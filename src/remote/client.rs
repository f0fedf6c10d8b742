// ABOUTME: HTTP client for the integration platform REST API
// ABOUTME: Handles login, catalog queries, export/import job calls and package transfer

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use super::models::{
    ExportJobResponse, ExportRequest, ImportRequest, JobState, JobStatusResponse, LoginRequest,
    LoginResponse, ObjectList, ObjectRecord, UploadResponse,
};
use super::Platform;
use crate::error::PromoterError;

const SESSION_HEADER: &str = "INFA-SESSION-ID";
const API_PREFIX: &str = "public/core/v3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EnvironmentRole {
    Source,
    Target,
}

impl fmt::Display for EnvironmentRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EnvironmentRole::Source => f.write_str("source"),
            EnvironmentRole::Target => f.write_str("target"),
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub login_url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login_url", &self.login_url)
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// An authenticated session against one org.
///
/// Expiry is enforced by the platform; the session is never refreshed.
#[derive(Clone)]
pub struct Session {
    pub server_url: String,
    session_id: String,
    pub role: EnvironmentRole,
}

impl Session {
    pub fn new(server_url: &str, session_id: &str, role: EnvironmentRole) -> Self {
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            session_id: session_id.to_string(),
            role,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.server_url, API_PREFIX, path)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("server_url", &self.server_url)
            .field("session_id", &mask_token(&self.session_id))
            .field("role", &self.role)
            .finish()
    }
}

pub(crate) fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{}****", visible)
}

/// Logs in and returns the session for `role`.
///
/// Anything but HTTP 200 is an authentication failure; there is no retry.
pub async fn authenticate(
    http: &Client,
    credentials: &Credentials,
    role: EnvironmentRole,
) -> Result<Session> {
    let response = http
        .post(&credentials.login_url)
        .json(&LoginRequest::new(&credentials.username, &credentials.password))
        .send()
        .await
        .with_context(|| format!("Failed to reach login endpoint {}", credentials.login_url))?;

    if response.status() != StatusCode::OK {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(PromoterError::Authentication(format!(
            "{} org returned status {}: {}",
            role, status, body
        ))
        .into());
    }

    let login: LoginResponse = response
        .json()
        .await
        .context("Failed to parse login response")?;

    let session = Session::new(&login.server_url, &login.ic_session_id, role);
    info!(role = %role, server_url = %session.server_url, "Authentication successful");
    Ok(session)
}

pub struct PlatformClient {
    client: Client,
    session: Session,
}

impl PlatformClient {
    pub fn new(session: Session, timeout: Duration) -> Result<Self> {
        let client = build_http_client(timeout)?;
        Ok(Self { client, session })
    }

    /// Builds an HTTP client, logs in and wraps the resulting session.
    pub async fn connect(
        credentials: &Credentials,
        role: EnvironmentRole,
        timeout: Duration,
    ) -> Result<Self> {
        let client = build_http_client(timeout)?;
        let session = authenticate(&client, credentials, role).await?;
        Ok(Self { client, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(self.session.api_url(path))
            .header(SESSION_HEADER, self.session.session_id())
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.session.api_url(path))
            .header(SESSION_HEADER, self.session.session_id())
    }

    async fn fetch_bytes(&self, path: &str, what: &str) -> Result<Vec<u8>> {
        let response = self
            .get(path)
            .send()
            .await
            .with_context(|| format!("Failed to download {}", what))?;
        let response = ensure_status(response, &[StatusCode::OK], what).await?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read {} body", what))?;
        Ok(bytes.to_vec())
    }

    async fn fetch_state(&self, path: &str, what: &str) -> Result<JobState> {
        let response = self
            .get(path)
            .send()
            .await
            .with_context(|| format!("Failed to get {}", what))?;
        let response = ensure_status(response, &[StatusCode::OK], what).await?;
        let status: JobStatusResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {}", what))?;
        Ok(status.status.state)
    }
}

fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

async fn ensure_status(response: Response, accepted: &[StatusCode], what: &str) -> Result<Response> {
    let status = response.status();
    if accepted.contains(&status) {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("Request for {} failed with status {}: {}", what, status, body)
}

#[async_trait]
impl Platform for PlatformClient {
    async fn list_objects(&self, object_type: &str) -> Result<Vec<ObjectRecord>> {
        let query = format!("type=='{}'", object_type);
        let response = self
            .get("objects")
            .query(&[("q", query.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to list objects of type {}", object_type))?;
        let what = format!("{} object listing", object_type);
        let response = ensure_status(response, &[StatusCode::OK], &what).await?;
        let list: ObjectList = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {}", what))?;
        debug!(object_type, count = list.objects.len(), "Listed objects");
        Ok(list.objects)
    }

    async fn submit_export(&self, request: &ExportRequest) -> Result<String> {
        let response = self
            .post("export")
            .json(request)
            .send()
            .await
            .context("Failed to submit export job")?;
        let response = ensure_status(response, &[StatusCode::OK], "export job submission").await?;
        let job: ExportJobResponse = response
            .json()
            .await
            .context("Failed to parse export job response")?;
        Ok(job.id)
    }

    async fn export_status(&self, job_id: &str) -> Result<JobState> {
        self.fetch_state(&format!("export/{}", job_id), "export job status")
            .await
    }

    async fn export_package(&self, job_id: &str) -> Result<Vec<u8>> {
        self.fetch_bytes(&format!("export/{}/package", job_id), "export package")
            .await
    }

    async fn export_log(&self, job_id: &str) -> Result<Vec<u8>> {
        self.fetch_bytes(&format!("export/{}/log", job_id), "export log")
            .await
    }

    async fn upload_package(&self, file_name: &str, package: Vec<u8>) -> Result<String> {
        let part = Part::bytes(package)
            .file_name(file_name.to_string())
            .mime_str("application/zip")
            .context("Failed to build package upload part")?;
        let form = Form::new().part("package", part);

        let response = self
            .post("import/package")
            .multipart(form)
            .send()
            .await
            .context("Failed to upload import package")?;
        let response = ensure_status(
            response,
            &[StatusCode::OK, StatusCode::CREATED],
            "import package upload",
        )
        .await?;
        let upload: UploadResponse = response
            .json()
            .await
            .context("Failed to parse import package upload response")?;
        Ok(upload.job_id)
    }

    async fn submit_import(&self, job_id: &str, request: &ImportRequest) -> Result<JobState> {
        let response = self
            .post(&format!("import/{}", job_id))
            .json(request)
            .send()
            .await
            .context("Failed to submit import job")?;
        let response = ensure_status(response, &[StatusCode::OK], "import job submission").await?;
        let status: JobStatusResponse = response
            .json()
            .await
            .context("Failed to parse import job response")?;
        Ok(status.status.state)
    }

    async fn import_status(&self, job_id: &str) -> Result<JobState> {
        self.fetch_state(&format!("import/{}", job_id), "import job status")
            .await
    }

    async fn import_log(&self, job_id: &str) -> Result<Vec<u8>> {
        self.fetch_bytes(&format!("import/{}/log", job_id), "import log")
            .await
    }
}
