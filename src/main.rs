//! Pinny - pin mutable references to immutable digests
//!
//! Rewrites GitHub Actions workflows and Dockerfiles so that every action is
//! referenced by commit SHA and every base image by manifest digest.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod client;
mod commands;
mod dockerfile;
mod error;
mod lockfile;
mod pin;
mod progress;
mod reference;
mod resolver;
mod settings;
mod text;
mod transaction;

#[cfg(test)]
mod test_fixtures;

use cli::{Cli, Commands};

/// Install the stderr subscriber; `RUST_LOG` takes precedence over `--verbose`
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Actions(args) => commands::actions::run(args),
        Commands::Docker(args) => commands::docker::run(args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
