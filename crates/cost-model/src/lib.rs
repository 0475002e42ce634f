// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # cost-model
//!
//! Closed-form training-cost estimation over a validated
//! [`op_graph::ComputationGraph`].
//!
//! # Pipeline
//!
//! | Stage | Module | Output |
//! |---|---|---|
//! | Per-operation cost | [`layer_cost`] | FLOPs, bytes read/written, parameters |
//! | Hardware mapping | [`mapping`] | compute time, utilization |
//! | Memory model | [`memory`] | transfer time, memory footprint |
//! | Aggregation | [`aggregate`] | forward time, bottleneck |
//! | Projection | [`prediction`] | per-batch / per-epoch / total time |
//!
//! The crate is purely algorithmic: no I/O, no shared state. Learned
//! factors enter through the [`FactorSource`] trait, so the same model runs
//! against taxonomy defaults or a calibration snapshot:
//!
//! ```ignore
//! struct Snapshot { /* ... */ }
//! impl FactorSource for Snapshot {
//!     fn efficiency(&self, kind: OpKind) -> f64 { /* ... */ }
//!     fn correction(&self, gpu: &str, scope: CorrectionScope) -> Option<f64> { /* ... */ }
//! }
//! ```
//!
//! # Example
//! ```
//! use cost_model::{CostModel, DefaultFactors, HardwareSpec};
//! use op_graph::{ModelDescriptor, ModelType};
//!
//! let descriptor = ModelDescriptor::new(ModelType::GraphConvPose).with_batch_size(16);
//! let prediction = CostModel::default().predict(&descriptor, &HardwareSpec::new("rtx4090"), &DefaultFactors);
//! assert!(prediction.estimated_time_seconds > 0.0);
//! ```

pub mod aggregate;
mod hardware;
pub mod layer_cost;
pub mod mapping;
pub mod memory;
pub mod prediction;

pub use aggregate::{Bottleneck, ForwardPass, NodeEstimate};
pub use hardware::{normalize_gpu_name, HardwareProfile, HardwareSpec, DEFAULT_GPU};
pub use layer_cost::LayerCost;
pub use mapping::{CorrectionScope, DefaultFactors, FactorSource, HardwareCost, FACTOR_EPSILON};
pub use memory::MemoryFootprint;
pub use prediction::{
    dataset_size, Complexity, CostModel, CostModelParams, GraphEstimate, KindBreakdown, Prediction,
};
