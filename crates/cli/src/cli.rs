// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::PathBuf;

use crate::helpers::telemetry::setup_simple_tracing;
use crate::sessions::SessionCommands;
use crate::{context, presets, print_config, sessions, simulate};
use anyhow::Result;
use clap::{command, ArgAction, Parser, Subcommand};
use tracing::{info, instrument, Level};
use umbra_config::{load_config, AppConfig};
use umbra_fhe::GamePreset;

#[derive(Parser, Debug)]
#[command(name = "umbra")]
#[command(about = "Encrypted hide and seek over threshold BFV", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `umbra -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,

    /// Override the parameter preset from the config
    #[arg(long, global = true)]
    preset: Option<GamePreset>,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    fn load_config(&self) -> Result<AppConfig> {
        let config = load_config(self.config.clone())?;
        Ok(match self.preset {
            Some(preset) => config.with_preset(preset),
            None => config,
        })
    }

    #[instrument(skip_all)]
    pub fn execute(self) -> Result<()> {
        setup_simple_tracing(self.log_level());
        let config = self.load_config()?;
        info!("Config loaded from: {:?}", config.config_file());

        match self.command {
            Commands::Presets => presets::execute(),
            Commands::PrintConfig => print_config::execute(&config)?,
            Commands::Context { out } => context::execute(&config, out)?,
            Commands::Simulate { stages, seed } => simulate::execute(config, stages, seed)?,
            Commands::Sessions { command } => sessions::execute(command, &config)?,
        }

        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available parameter presets
    Presets,

    /// Print the resolved configuration as YAML
    PrintConfig,

    /// Generate a fresh crypto context and export its wire envelope
    Context {
        /// Write the envelope to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Play a whole game locally, with both clients and the server in one process
    Simulate {
        /// Number of stages. Defaults to the configured value
        #[arg(long)]
        stages: Option<u64>,

        /// Seed for the simulated clients' moves and key material
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Inspect sessions in the configured store
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
}
