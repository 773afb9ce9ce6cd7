//! cbuild CLI - incremental builds for native extension modules

use anyhow::Result;
use cbuild::BuildError;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        // Pass a failing tool's exit code through when there is one.
        let code = e
            .downcast_ref::<BuildError>()
            .and_then(BuildError::exit_code)
            .filter(|code| *code != 0)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("cbuild=debug")
    } else {
        EnvFilter::new("cbuild=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build(args) => commands::build::execute(args),
        Commands::Clean(args) => commands::clean::execute(args),
        Commands::Install(args) => commands::install::execute(args),
        Commands::Toolchain => commands::toolchain::execute(),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
