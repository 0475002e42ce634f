// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bottleneck-aware aggregation of per-node estimates into one forward-pass
//! time.
//!
//! ```text
//! forward_time = max(Σ compute_time, Σ memory_time) × overhead_factor
//! ```
//!
//! Compute and memory transfers are assumed to overlap fully, so the slower
//! of the two sums bounds the pass. The result is monotone non-decreasing in
//! every node's FLOPs and bytes.

use crate::{HardwareCost, LayerCost};
use op_graph::OpKind;
use std::fmt;

/// Which resource bounds the forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bottleneck {
    Compute,
    Memory,
}

impl Bottleneck {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for Bottleneck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the cost model derived for one node.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NodeEstimate {
    pub id: String,
    pub kind: OpKind,
    pub cost: LayerCost,
    pub hardware: HardwareCost,
    pub memory_time_s: f64,
}

/// Totals over all nodes of a forward pass.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ForwardPass {
    pub total_compute_s: f64,
    pub total_memory_s: f64,
    /// `max(compute, memory) × overhead`.
    pub forward_time_s: f64,
    pub bottleneck: Bottleneck,
    /// Mean of the per-node utilizations (0 for an empty slice).
    pub mean_utilization: f64,
}

/// Aggregates node estimates into a forward pass.
pub fn aggregate(nodes: &[NodeEstimate], overhead_factor: f64) -> ForwardPass {
    let total_compute_s: f64 = nodes.iter().map(|n| n.hardware.compute_time_s).sum();
    let total_memory_s: f64 = nodes.iter().map(|n| n.memory_time_s).sum();
    let (bound, bottleneck) = if total_compute_s > total_memory_s {
        (total_compute_s, Bottleneck::Compute)
    } else {
        (total_memory_s, Bottleneck::Memory)
    };
    let mean_utilization = if nodes.is_empty() {
        0.0
    } else {
        nodes.iter().map(|n| n.hardware.utilization).sum::<f64>() / nodes.len() as f64
    };

    ForwardPass {
        total_compute_s,
        total_memory_s,
        forward_time_s: bound * overhead_factor.max(0.0),
        bottleneck,
        mean_utilization,
    }
}
