// ABOUTME: Command-line entry point for ic-promoter
// ABOUTME: Parses arguments, loads configuration, sets up logging and dispatches commands

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use ic_promoter::commands::{self, ResolveArgs, RunArgs, StatusArgs};
use ic_promoter::config::Config;
use ic_promoter::context::RunContext;
use ic_promoter::logging;

#[derive(Parser, Debug)]
#[command(name = "ic-promoter")]
#[command(about = "Promote integration objects between cloud integration orgs")]
#[command(version)]
struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (defaults to ./ic-promoter.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export each listed object from the source org and import it into the target org
    Run(RunArgs),

    /// Look up the ids of listed objects in the source org without running jobs
    Resolve(ResolveArgs),

    /// Show the current state of an export or import job
    Status(StatusArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = dispatch(cli.command, &mut config, cli.verbose).await {
        error!(error = %format!("{:#}", err), "Command failed");
        std::process::exit(1);
    }
}

async fn dispatch(command: Commands, config: &mut Config, verbose: u8) -> Result<()> {
    match command {
        Commands::Run(args) => {
            if let Err(err) = args.apply(config) {
                eprintln!("Error: {:#}", err);
                std::process::exit(1);
            }
            let ctx = RunContext::new(&config.direction, config.output_root.clone());
            if let Err(err) = logging::init_logging(verbose, Some(&ctx.session_log_path())) {
                eprintln!("Error: {:#}", err);
                std::process::exit(1);
            }
            info!(
                session_id = %ctx.session_id(),
                direction = %ctx.direction(),
                run_log = %ctx.session_log_path().display(),
                "Session started"
            );
            commands::run::execute(&args, config, &ctx).await
        }
        Commands::Resolve(args) => {
            init_console_logging(verbose);
            commands::resolve::execute(&args, config).await
        }
        Commands::Status(args) => {
            init_console_logging(verbose);
            commands::status::execute(&args, config).await
        }
    }
}

fn init_console_logging(verbose: u8) {
    if let Err(err) = logging::init_logging(verbose, None) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
