//! `dcflow`: idempotent provisioning and IAM flows for a metadata catalog.
//!
//! Every flow deletes what a previous run may have left behind, recreates it
//! in dependency order, and reports the handles the service returned.
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod catalog;
mod cli;
mod config;
mod flows;
mod output;
mod policy;
mod provision;
mod staging;
mod workflow;

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "dcflow=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = cli::RootArgs::parse();
    init_tracing(args.global.verbose);

    match args.command {
        cli::Command::CustomEntry(cmd) => workflow::run_custom_entry(&args.global, cmd),
        cli::Command::TagTable(cmd) => workflow::run_tag_table(&args.global, cmd),
        cli::Command::GrantTemplateUser(cmd) => workflow::run_grant(&args.global, cmd),
        cli::Command::Search(cmd) => workflow::run_search(&args.global, cmd),
    }
}
