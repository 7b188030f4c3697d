//! glidecore CLI - Command-line interface
//!
//! This binary drives the glidecore flight-state core: it manages the
//! configuration file and flies the built-in simulator through the
//! detectors.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::simulate::SimulateArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "glidecore")]
#[command(version = glidecore::VERSION)]
#[command(about = "Flight-state estimation for glide computers", long_about = None)]
struct Cli {
    /// Use this configuration file instead of ~/.glidecore/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fly the simulator and print flight phase and wind changes
    Simulate(SimulateArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate(args) => {
            CliRunner::new(cli.config.as_deref()).and_then(|runner| commands::simulate::run(args, &runner))
        }
        Commands::Config(command) => commands::config::run(command, cli.config.as_deref()),
    };

    if let Err(e) = result {
        e.exit();
    }
}
