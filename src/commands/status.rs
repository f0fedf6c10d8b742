// ABOUTME: The status command, a single probe of an existing job
// ABOUTME: Useful after a run reported a job that did not finish in time

use anyhow::Result;
use clap::{Args, ValueEnum};

use super::connect;
use crate::config::Config;
use crate::remote::{EnvironmentRole, Platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JobKind {
    Export,
    Import,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Org the job runs in
    #[arg(long, value_enum, default_value = "source")]
    pub env: EnvironmentRole,

    /// Kind of job
    #[arg(long, value_enum, default_value = "export")]
    pub kind: JobKind,

    /// Job id as printed by the run command
    pub job_id: String,
}

pub async fn execute(args: &StatusArgs, config: &Config) -> Result<()> {
    let env = match args.env {
        EnvironmentRole::Source => &config.source,
        EnvironmentRole::Target => &config.target,
    };
    let platform = connect(env, args.env, config.http_timeout()).await?;

    let state = match args.kind {
        JobKind::Export => platform.export_status(&args.job_id).await?,
        JobKind::Import => platform.import_status(&args.job_id).await?,
    };
    println!("{:?} job {} in {} org: {}", args.kind, args.job_id, args.env, state);
    Ok(())
}
