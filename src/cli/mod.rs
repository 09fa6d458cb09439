//! CLI Module
//!
//! Command-line caller for the mixing pipeline.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::ExportFormat;

/// Stemmix - mix audio files and apply an effect
#[derive(Parser, Debug)]
#[command(name = "stemmix")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mix two or more audio files, apply an effect and export the result
    Mix {
        /// Input audio files, in mixing order
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,

        /// Ratio for each stream after the first (repeatable)
        #[arg(short, long = "ratio")]
        ratios: Vec<f32>,

        /// Effect name: none, reverb, delay, distortion or eq
        #[arg(short, long, default_value = "none")]
        effect: String,

        /// Effect parameters as a JSON object
        #[arg(short, long)]
        params: Option<String>,

        /// Output file name without extension
        #[arg(short, long, default_value = "mixed_audio")]
        output: String,

        /// Output format: wav or mp3
        #[arg(short, long, default_value = "wav")]
        format: ExportFormat,

        /// Directory to write into (overrides the config file)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the available effects and their parameters
    Effects,
}
