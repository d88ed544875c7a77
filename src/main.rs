mod cli;
mod commands;
mod confidence;
mod config;
mod coverage;
mod gate;
mod model;
mod parse;
mod policy;
mod runner;
mod snapshot;
mod store;
mod trace;
mod util;
mod vcs;
mod workflow;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Draft(args) => commands::draft::run(args),
        Commands::Approve(args) => commands::approve::run(args),
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Backlog(args) => commands::backlog::run(args),
        Commands::Verify(args) => commands::verify::run(args),
        Commands::Audit(args) => commands::audit::run(args),
        Commands::Confidence(args) => commands::confidence::run(args),
        Commands::Policy(args) => commands::policy::run(args),
        Commands::Go(args) => commands::go::run(args),
        Commands::Deliver(args) => commands::deliver::run(args),
        Commands::Status(args) => commands::status::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
