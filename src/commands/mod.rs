// ABOUTME: CLI command implementations
// ABOUTME: Each command connects to the orgs it needs and reports to stdout

pub mod resolve;
pub mod run;
pub mod status;

pub use resolve::ResolveArgs;
pub use run::RunArgs;
pub use status::StatusArgs;

use anyhow::Result;
use std::time::Duration;

use crate::config::EnvironmentConfig;
use crate::remote::{EnvironmentRole, PlatformClient};

/// Reads credentials for `env` and logs in.
pub(crate) async fn connect(
    env: &EnvironmentConfig,
    role: EnvironmentRole,
    timeout: Duration,
) -> Result<PlatformClient> {
    let credentials = env.credentials()?;
    tracing::info!(role = %role, login_url = %credentials.login_url, "Authenticating");
    PlatformClient::connect(&credentials, role, timeout).await
}
