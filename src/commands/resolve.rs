// ABOUTME: The resolve command, a dry run of object id lookup
// ABOUTME: Authenticates the source org only and submits no jobs

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::connect;
use crate::catalog::build_catalog;
use crate::config::Config;
use crate::remote::EnvironmentRole;
use crate::tasks::read_tasks;

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Task list CSV, or a directory holding one
    #[arg(long, value_name = "PATH")]
    pub tasks: PathBuf,

    /// Only resolve rows of this module
    #[arg(long)]
    pub module: Option<String>,
}

pub async fn execute(args: &ResolveArgs, config: &Config) -> Result<()> {
    let tasks = read_tasks(&args.tasks, args.module.as_deref())?;
    let source = connect(&config.source, EnvironmentRole::Source, config.http_timeout()).await?;

    let catalog = build_catalog(&source, &config.object_types).await;
    let resolution = catalog.resolve(&tasks);
    for entry in resolution.entries() {
        println!(
            "{:<60} {}",
            entry.path,
            entry.id.as_deref().unwrap_or("not found")
        );
    }

    let objects = resolution.into_objects()?;
    println!("Resolved {} object(s)", objects.len());
    Ok(())
}
