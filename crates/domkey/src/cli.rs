//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use logging::LogArgs;

/// Command-line interface for the `domkey` binary.
#[derive(Parser, Debug)]
#[command(name = "domkey", about = "Declarative keyboard shortcuts for document trees", version)]
pub struct Cli {
    /// Logging controls
    #[command(flatten)]
    pub log: LogArgs,

    /// Which subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate a config, then parse every selector it names.
    Check {
        /// Config file (.json or .ron)
        config: PathBuf,
    },

    /// Press keys against a fixture document and report what was clicked.
    Simulate {
        /// Config file (.json or .ron)
        config: PathBuf,

        /// RON fixture describing the document tree
        #[arg(long, value_name = "PATH")]
        fixture: PathBuf,

        /// Key chord to press; repeat for a sequence
        #[arg(long = "press", value_name = "KEY", required = true)]
        presses: Vec<String>,

        /// Focus id to set before pressing (otherwise read from the fixture)
        #[arg(long, value_name = "ID")]
        focus: Option<String>,

        /// Resolve every step with a single attempt
        #[arg(long)]
        no_poll: bool,
    },
}
