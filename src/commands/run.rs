// ABOUTME: The run command, a full promotion from source org to target org
// ABOUTME: Reads the task list, authenticates both orgs and prints a per-object summary

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::warn;

use super::connect;
use crate::config::Config;
use crate::context::RunContext;
use crate::orchestrator::{Orchestrator, RunReport};
use crate::remote::{ConflictResolution, EnvironmentRole};
use crate::tasks::read_tasks;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Task list CSV, or a directory holding one
    #[arg(long, value_name = "PATH")]
    pub tasks: PathBuf,

    /// Only promote rows of this module (e.g. CDI, CAI)
    #[arg(long)]
    pub module: Option<String>,

    /// Direction label used in the output layout (e.g. dev_to_qa)
    #[arg(long)]
    pub direction: Option<String>,

    /// Root folder for packages and logs
    #[arg(long, value_name = "DIR")]
    pub output_root: Option<PathBuf>,

    /// Policy for objects that already exist in the target org
    #[arg(long, value_enum)]
    pub conflict_resolution: Option<ConflictResolution>,
}

impl RunArgs {
    /// Command-line values take precedence over the config file. The merged
    /// configuration is validated again.
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(direction) = &self.direction {
            config.direction = direction.clone();
        }
        if let Some(output_root) = &self.output_root {
            config.output_root = output_root.clone();
        }
        if let Some(conflict_resolution) = self.conflict_resolution {
            config.conflict_resolution = conflict_resolution;
        }
        config.validate()
    }
}

pub async fn execute(args: &RunArgs, config: &Config, ctx: &RunContext) -> Result<()> {
    let tasks = read_tasks(&args.tasks, args.module.as_deref())?;
    if tasks.is_empty() {
        warn!("Task list is empty, nothing to promote");
        return Ok(());
    }

    let source = connect(&config.source, EnvironmentRole::Source, config.http_timeout()).await?;
    let target = connect(&config.target, EnvironmentRole::Target, config.http_timeout()).await?;

    let orchestrator = Orchestrator::new(&source, &target, ctx, config.promotion_settings());
    let report = orchestrator.run(&tasks).await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("Session {}", report.session_id);
    for outcome in &report.outcomes {
        println!(
            "  {:<50} {:<22} export={} import={}",
            outcome.object.path,
            outcome.final_state().to_string(),
            outcome.export_job_id.as_deref().unwrap_or("-"),
            outcome.import_job_id.as_deref().unwrap_or("-"),
        );
    }
    println!(
        "Promoted {} of {} object(s)",
        report.promoted(),
        report.outcomes.len()
    );
    for outcome in report.incomplete() {
        warn!(
            path = %outcome.object.path,
            state = %outcome.final_state(),
            "Object was not fully promoted"
        );
    }
}
