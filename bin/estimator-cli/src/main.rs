// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # trainest
//!
//! Command-line interface for the training-cost estimator.
//!
//! ## Usage
//! ```bash
//! # Predict a training job
//! trainest predict --model-type protogcn --batch-size 16 --gpu rtx4090
//!
//! # Feed back what the job actually did
//! trainest --store ./calibration.jsonl record --model-type protogcn --batch-size 16 \
//!     --gpu rtx4090 --actual-time 5400 --actual-memory 9800 --actual-util 71
//!
//! # Inspect the priced graph, learned factors and accuracy
//! trainest inspect --model-type resnet
//! trainest --store ./calibration.jsonl factors
//! trainest --store ./calibration.jsonl stats --window-days 7
//! ```

mod commands;

use clap::{Parser, Subcommand};
use commands::ModelArgs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "trainest",
    about = "GPU training-cost estimator with continual calibration",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Calibration journal (overrides `store_path` from the config).
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict training time, memory and utilization for a model.
    Predict {
        #[command(flatten)]
        model: ModelArgs,

        /// Print the full prediction as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Record an observed training run and update calibration.
    Record {
        #[command(flatten)]
        model: ModelArgs,

        /// Observed total training time in seconds.
        #[arg(long)]
        actual_time: f64,

        /// Observed memory usage in MB.
        #[arg(long)]
        actual_memory: f64,

        /// Observed mean SM utilization in percent.
        #[arg(long)]
        actual_util: f64,

        /// Print the update result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the computation graph and per-node cost for a model.
    Inspect {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// List learned calibration factors.
    Factors,

    /// Show prediction accuracy over recent recorded runs.
    Stats {
        /// Window in days (defaults to `accuracy_window_days` from the config).
        #[arg(long)]
        window_days: Option<u64>,
    },

    /// List known GPU hardware profiles.
    Hardware,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref(), cli.store)?;

    match cli.command {
        Commands::Predict { model, json } => commands::predict::execute(config, model, json).await,
        Commands::Record {
            model,
            actual_time,
            actual_memory,
            actual_util,
            json,
        } => {
            let actual = calibration::Observation::new(actual_time, actual_memory, actual_util);
            commands::record::execute(config, model, actual, json).await
        }
        Commands::Inspect { model } => commands::inspect::execute(config, model).await,
        Commands::Factors => commands::factors::execute(config).await,
        Commands::Stats { window_days } => commands::stats::execute(config, window_days).await,
        Commands::Hardware => commands::hardware::execute(config).await,
    }
}
