// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and the arguments they share.

pub mod factors;
pub mod hardware;
pub mod inspect;
pub mod predict;
pub mod record;
pub mod stats;

use anyhow::Context;
use cost_model::HardwareSpec;
use estimator::{Estimator, EstimatorConfig};
use op_graph::{ComputationGraph, GraphManifest, ModelDescriptor, ModelType, Validated};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads the config file (or defaults) and applies the `--store` override.
pub fn load_config(path: Option<&Path>, store: Option<PathBuf>) -> anyhow::Result<EstimatorConfig> {
    let mut config = match path {
        Some(path) => EstimatorConfig::from_file(path)?,
        None => EstimatorConfig::default(),
    };
    if store.is_some() {
        config.store_path = store;
    }
    config.validate()?;
    Ok(config)
}

/// Opens the estimator, naming the store in any error.
pub fn open_estimator(config: EstimatorConfig) -> anyhow::Result<Estimator> {
    let store = config
        .store_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string());
    Estimator::open(config).with_context(|| format!("cannot open calibration store {store}"))
}

/// The model and hardware half of a request.
#[derive(Debug, clap::Args)]
pub struct ModelArgs {
    /// JSON model descriptor file; flags below override its fields.
    #[arg(long)]
    pub descriptor: Option<PathBuf>,

    /// JSON graph manifest to price instead of a template graph.
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Model type (e.g. protogcn, resnet, bert, cnn, lstm, mlp).
    #[arg(short, long)]
    pub model_type: Option<String>,

    #[arg(short, long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub epochs: Option<usize>,

    /// Dataset name (e.g. ntu60, imagenet, cifar10).
    #[arg(long)]
    pub dataset: Option<String>,

    /// Optimizer name (e.g. adam, sgd).
    #[arg(long)]
    pub optimizer: Option<String>,

    #[arg(long)]
    pub num_classes: Option<usize>,

    /// Per-sample input shape, e.g. "3x224x224".
    #[arg(long)]
    pub input_shape: Option<String>,

    /// Free-form architecture hint, e.g. "bert-base" or "3-layer cnn".
    #[arg(long)]
    pub detail: Option<String>,

    /// GPU model (e.g. rtx4090, a100); defaults to the configured GPU.
    #[arg(short, long)]
    pub gpu: Option<String>,
}

impl ModelArgs {
    pub fn descriptor(&self) -> anyhow::Result<ModelDescriptor> {
        let mut d = match &self.descriptor {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read descriptor '{}'", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("invalid descriptor '{}'", path.display()))?
            }
            None => ModelDescriptor::default(),
        };
        if let Some(t) = &self.model_type {
            d.model_type = ModelType::from_str_loose(t);
        }
        if self.batch_size.is_some() {
            d.batch_size = self.batch_size;
        }
        if self.epochs.is_some() {
            d.epochs = self.epochs;
        }
        if self.num_classes.is_some() {
            d.num_classes = self.num_classes;
        }
        for (field, value) in [
            (&mut d.dataset, &self.dataset),
            (&mut d.optimizer, &self.optimizer),
            (&mut d.input_shape, &self.input_shape),
            (&mut d.architecture_detail, &self.detail),
        ] {
            if value.is_some() {
                field.clone_from(value);
            }
        }
        Ok(d)
    }

    pub fn hardware(&self) -> HardwareSpec {
        HardwareSpec {
            gpu_model: self.gpu.clone(),
        }
    }

    /// The manifest graph, if `--manifest` was given.
    pub fn manifest_graph(&self) -> anyhow::Result<Option<ComputationGraph<Validated>>> {
        let Some(path) = &self.manifest else {
            return Ok(None);
        };
        let graph = GraphManifest::from_file(path)
            .and_then(GraphManifest::into_graph)
            .with_context(|| format!("cannot load manifest '{}'", path.display()))?;
        Ok(Some(graph))
    }
}
