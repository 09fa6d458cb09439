//! Stemmix CLI
//!
//! Command-line front end for the mixing pipeline.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::debug;

use stemmix::cli::commands::{self, MixRequest};
use stemmix::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!("Stemmix v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Mix {
            inputs,
            ratios,
            effect,
            params,
            output,
            format,
            output_dir,
            config,
        } => {
            let request = MixRequest {
                inputs,
                ratios,
                effect,
                params,
                output,
                format,
                output_dir,
                config,
            };
            commands::mix(&request).context("mix failed")?;
        }
        Commands::Effects => commands::list_effects()?,
    }

    Ok(())
}
