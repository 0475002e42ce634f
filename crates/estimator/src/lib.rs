// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # estimator
//!
//! Predicts GPU training time, memory and utilization for a model
//! descriptor, and sharpens those predictions from observed runs.
//!
//! The estimator ties the workspace together:
//! - `op-graph` turns a [`op_graph::ModelDescriptor`] into a validated
//!   computation graph.
//! - `cost-model` prices the graph on a hardware profile.
//! - `calibration` holds the learned factors the cost model reads, and
//!   persists every recorded run.
//!
//! # Calibration Loop
//! ```text
//! predict ──► run the job ──► record(actual) ──► factors move 10% (efficiency)
//!    ▲                                            or 5% (correction) toward
//!    └──────────────────────────────────────────── the observed value
//! ```
//!
//! Configuration comes from [`EstimatorConfig`] (TOML or programmatic).

mod config;
mod engine;
mod error;

pub use config::EstimatorConfig;
pub use engine::{Estimator, UpdateResult};
pub use error::EstimatorError;
