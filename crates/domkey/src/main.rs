//! Binary entrypoint for `domkey`: check configs and simulate presses.
use std::{
    io::{self, Write},
    path::Path,
    process,
};

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*};

/// `check` subcommand.
mod check;
/// Command-line definitions.
mod cli;
mod error;
/// RON document fixtures.
mod fixture;
/// `simulate` subcommand.
mod simulate;

use crate::{
    cli::{Cli, Commands},
    error::{Error, Result},
    simulate::Plan,
};

/// Load and validate a config file.
fn load_config(path: &Path) -> Result<config::Config> {
    let cfg = config::load_from_path(path)?;
    debug!(path = %path.display(), keys = cfg.keys.len(), "config_loaded");
    Ok(cfg)
}

/// Run the selected subcommand.
async fn run(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Check { config } => check::check(&load_config(&config)?, &mut out),
        Commands::Simulate {
            config,
            fixture,
            presses,
            focus,
            no_poll,
        } => {
            let cfg = load_config(&config)?;
            let dom = fixture::build(&fixture::load(&fixture)?)?;
            let plan = Plan {
                presses,
                focus,
                poll: !no_poll,
            };
            for report in simulate::simulate(cfg, dom, &plan).await? {
                write!(out, "{report}")?;
            }
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let spec = cli.log.spec();
    tracing_subscriber::registry()
        .with(logging::env_filter_from_spec(&spec))
        .with(fmt::layer().without_time().with_writer(io::stderr))
        .try_init()
        .ok();

    if let Err(e) = run(cli).await {
        eprintln!("{}", e.pretty());
        process::exit(1);
    }
}
