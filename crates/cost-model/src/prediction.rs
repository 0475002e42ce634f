// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Prediction assembly: forward pass → training projection.
//!
//! ```text
//! time_per_batch    = forward_time × (1 + backward_multiplier)
//! batches_per_epoch = max(1, dataset_size / batch_size)
//! time_per_epoch    = time_per_batch × batches_per_epoch
//! estimated_time    = time_per_epoch × epochs
//! ```

use crate::aggregate::{aggregate, Bottleneck, ForwardPass, NodeEstimate};
use crate::layer_cost::layer_cost;
use crate::mapping::{map_to_hardware, FactorSource};
use crate::memory::{memory_time, MemoryFootprint};
use crate::{HardwareProfile, HardwareSpec, DEFAULT_GPU};
use op_graph::{ArchitectureTemplate, ComputationGraph, GraphBuilder, ModelDescriptor, OpKind, Validated};
use std::collections::BTreeMap;
use std::fmt;

/// Tuning constants of the cost model.
///
/// None of these are learned; they are fixed per deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct CostModelParams {
    /// Multiplier on the bottleneck time for launch and sync overhead.
    pub overhead_factor: f64,
    /// Multiplier from steady-state to peak memory usage.
    pub memory_overhead: f64,
    /// Backward pass cost relative to the forward pass.
    pub backward_multiplier: f64,
    /// GPU profile used when a request names none or an unknown one.
    pub default_gpu: String,
}

impl Default for CostModelParams {
    fn default() -> Self {
        Self {
            overhead_factor: 1.07,
            memory_overhead: 1.3,
            backward_multiplier: 2.0,
            default_gpu: DEFAULT_GPU.to_string(),
        }
    }
}

/// Coarse size class of a model's forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    /// `high` above 1e9 FLOPs, `medium` above 1e6, `low` otherwise.
    pub fn classify(flops: u64) -> Self {
        match flops {
            f if f <= 1_000_000 => Self::Low,
            f if f <= 1_000_000_000 => Self::Medium,
            _ => Self::High,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// Aggregated cost of every node of one operation kind.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct KindBreakdown {
    pub kind: OpKind,
    pub nodes: usize,
    pub flops: u64,
    pub compute_time_s: f64,
    pub memory_time_s: f64,
    /// This kind's fraction of total compute time, in `[0, 1]`.
    pub compute_share: f64,
}

/// Per-node estimates plus the aggregated forward pass.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GraphEstimate {
    pub nodes: Vec<NodeEstimate>,
    pub pass: ForwardPass,
}

impl GraphEstimate {
    pub fn total_flops(&self) -> u64 {
        self.nodes
            .iter()
            .fold(0u64, |acc, n| acc.saturating_add(n.cost.flops))
    }

    /// Per-kind totals, in taxonomy order.
    pub fn breakdown(&self) -> Vec<KindBreakdown> {
        let mut by_kind: BTreeMap<OpKind, KindBreakdown> = BTreeMap::new();
        for node in &self.nodes {
            let entry = by_kind.entry(node.kind).or_insert_with(|| KindBreakdown {
                kind: node.kind,
                nodes: 0,
                flops: 0,
                compute_time_s: 0.0,
                memory_time_s: 0.0,
                compute_share: 0.0,
            });
            entry.nodes += 1;
            entry.flops = entry.flops.saturating_add(node.cost.flops);
            entry.compute_time_s += node.hardware.compute_time_s;
            entry.memory_time_s += node.memory_time_s;
        }
        let total = self.pass.total_compute_s;
        by_kind
            .into_values()
            .map(|mut b| {
                b.compute_share = if total > 0.0 { b.compute_time_s / total } else { 0.0 };
                b
            })
            .collect()
    }
}

/// The full estimate for one training job on one GPU.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Prediction {
    /// Expected SM utilization in `[0, 100]`.
    pub sm_utilization: f64,
    pub memory_usage_mb: f64,
    pub memory_peak_mb: f64,
    pub estimated_time_seconds: f64,
    pub time_per_epoch_seconds: f64,
    pub bottleneck: Bottleneck,
    pub time_per_batch_ms: f64,
    pub forward_time_seconds: f64,
    pub memory_utilization_percent: f64,
    /// Forward-pass FLOPs for one batch.
    pub total_flops: u64,
    pub complexity: Complexity,
    /// Name of the hardware profile actually used.
    pub hardware: String,
    /// Name of the graph (template) that was priced.
    pub graph: String,
    pub batches_per_epoch: u64,
    pub epochs: u64,
    pub memory: MemoryFootprint,
    pub breakdown: Vec<KindBreakdown>,
}

impl Prediction {
    /// Fraction of compute time attributed to `kind` (0 if absent).
    pub fn compute_share(&self, kind: OpKind) -> f64 {
        self.breakdown
            .iter()
            .find(|b| b.kind == kind)
            .map(|b| b.compute_share)
            .unwrap_or(0.0)
    }
}

/// Number of training samples for a descriptor's dataset, falling back to
/// a per-template default.
pub fn dataset_size(descriptor: &ModelDescriptor) -> u64 {
    if let Some(name) = descriptor.dataset.as_deref() {
        let key = name.to_lowercase().replace(['-', '_', ' '], "");
        let known = [
            ("ntu120", 114_480),
            ("ntu60", 56_880),
            ("ntu", 56_880),
            ("imagenet", 1_281_167),
            ("cifar", 50_000),
            ("mnist", 60_000),
            ("kinetics", 240_000),
        ];
        if let Some(&(_, size)) = known.iter().find(|(prefix, _)| key.starts_with(prefix)) {
            return size;
        }
        tracing::debug!("unknown dataset '{name}', using template default size");
    }
    match ArchitectureTemplate::select(descriptor) {
        ArchitectureTemplate::GraphConvPose => 56_880,
        ArchitectureTemplate::ResidualCnn => 1_281_167,
        ArchitectureTemplate::TransformerEncoder => 100_000,
        ArchitectureTemplate::Generic => 50_000,
    }
}

/// The analytic cost model.
#[derive(Debug, Clone, Default)]
pub struct CostModel {
    params: CostModelParams,
}

impl CostModel {
    pub fn new(params: CostModelParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CostModelParams {
        &self.params
    }

    /// Resolves the hardware profile for a request.
    pub fn profile(&self, hardware: &HardwareSpec) -> &'static HardwareProfile {
        HardwareProfile::resolve(hardware.gpu_model.as_deref(), &self.params.default_gpu)
    }

    /// Prices every node of `graph` and aggregates the forward pass.
    pub fn estimate_forward(
        &self,
        graph: &ComputationGraph<Validated>,
        profile: &HardwareProfile,
        factors: &dyn FactorSource,
    ) -> GraphEstimate {
        let nodes: Vec<NodeEstimate> = graph
            .iter_nodes()
            .map(|node| {
                let cost = layer_cost(node, graph.dtype);
                NodeEstimate {
                    id: node.id.clone(),
                    kind: node.kind,
                    hardware: map_to_hardware(&cost, node.kind, profile, factors),
                    memory_time_s: memory_time(&cost, profile),
                    cost,
                }
            })
            .collect();
        let pass = aggregate(&nodes, self.params.overhead_factor);
        GraphEstimate { nodes, pass }
    }

    /// Builds the graph for `descriptor` and predicts its training cost.
    pub fn predict(
        &self,
        descriptor: &ModelDescriptor,
        hardware: &HardwareSpec,
        factors: &dyn FactorSource,
    ) -> Prediction {
        let graph = GraphBuilder::build(descriptor);
        self.predict_graph(&graph, descriptor, hardware, factors)
    }

    /// Predicts the training cost of an already-built graph. Training
    /// parameters (batch size, epochs, dataset, optimizer) still come from
    /// `descriptor`.
    pub fn predict_graph(
        &self,
        graph: &ComputationGraph<Validated>,
        descriptor: &ModelDescriptor,
        hardware: &HardwareSpec,
        factors: &dyn FactorSource,
    ) -> Prediction {
        let profile = self.profile(hardware);
        let estimate = self.estimate_forward(graph, profile, factors);
        let pass = estimate.pass;

        let time_per_batch = pass.forward_time_s * (1.0 + self.params.backward_multiplier.max(0.0));
        let batch = descriptor.batch_size() as u64;
        let batches_per_epoch = (dataset_size(descriptor) / batch).max(1);
        let epochs = descriptor.epochs() as u64;
        let time_per_epoch = time_per_batch * batches_per_epoch as f64;

        let memory = MemoryFootprint::estimate(
            estimate.nodes.iter().map(|n| &n.cost),
            graph.dtype,
            descriptor.optimizer.as_deref(),
        );
        let overhead = self.params.memory_overhead;
        let sm_utilization =
            (pass.mean_utilization * factors.general_correction(profile.name)).clamp(0.0, 100.0);
        let total_flops = estimate.total_flops();

        tracing::debug!(
            "{} on {}: forward {:.6}s ({}-bound), {} batches/epoch",
            graph.name,
            profile.name,
            pass.forward_time_s,
            pass.bottleneck,
            batches_per_epoch
        );

        Prediction {
            sm_utilization,
            memory_usage_mb: memory.usage_mb(),
            memory_peak_mb: memory.peak_mb(overhead),
            estimated_time_seconds: time_per_epoch * epochs as f64,
            time_per_epoch_seconds: time_per_epoch,
            bottleneck: pass.bottleneck,
            time_per_batch_ms: time_per_batch * 1000.0,
            forward_time_seconds: pass.forward_time_s,
            memory_utilization_percent: memory.utilization_percent(overhead, profile),
            total_flops,
            complexity: Complexity::classify(total_flops),
            hardware: profile.name.to_string(),
            graph: graph.name.clone(),
            batches_per_epoch,
            epochs,
            memory,
            breakdown: estimate.breakdown(),
        }
    }
}
