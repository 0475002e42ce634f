// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory cost model: per-node transfer time and the training-time memory
//! footprint.

use crate::{HardwareProfile, LayerCost};
use op_graph::DType;

const MIB: f64 = 1024.0 * 1024.0;

/// Time to move a node's bytes through device memory, in seconds.
///
/// Independent of the node's compute time.
pub fn memory_time(cost: &LayerCost, profile: &HardwareProfile) -> f64 {
    cost.bytes_accessed() as f64 / profile.bandwidth_bytes_per_second().max(1.0)
}

/// How many parameter-sized state buffers an optimizer keeps.
///
/// Adam-family optimizers keep two moments, momentum-style optimizers one.
/// Unknown or absent optimizers are assumed stateless.
pub fn optimizer_state_multiplier(optimizer: Option<&str>) -> u64 {
    let Some(name) = optimizer else {
        return 0;
    };
    match name.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
        "adam" | "adamw" => 2,
        "sgd" | "momentum" | "sgdmomentum" | "rmsprop" | "adagrad" => 1,
        other => {
            tracing::debug!("unknown optimizer '{other}', assuming no optimizer state");
            0
        }
    }
}

/// Training memory footprint of one forward/backward step.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct MemoryFootprint {
    pub activation_bytes: u64,
    pub parameter_bytes: u64,
    pub gradient_bytes: u64,
    pub optimizer_bytes: u64,
}

impl MemoryFootprint {
    /// Sums activations and parameters over `costs` and adds gradient and
    /// optimizer state.
    pub fn estimate<'a>(
        costs: impl IntoIterator<Item = &'a LayerCost>,
        dtype: DType,
        optimizer: Option<&str>,
    ) -> Self {
        let (activations, params) = costs.into_iter().fold((0u64, 0u64), |(a, p), c| {
            (a.saturating_add(c.activation_bytes), p.saturating_add(c.params))
        });
        let parameter_bytes = params.saturating_mul(dtype.size_bytes() as u64);
        Self {
            activation_bytes: activations,
            parameter_bytes,
            gradient_bytes: parameter_bytes,
            optimizer_bytes: parameter_bytes.saturating_mul(optimizer_state_multiplier(optimizer)),
        }
    }

    pub fn usage_bytes(&self) -> u64 {
        self.activation_bytes
            .saturating_add(self.parameter_bytes)
            .saturating_add(self.gradient_bytes)
            .saturating_add(self.optimizer_bytes)
    }

    pub fn usage_mb(&self) -> f64 {
        self.usage_bytes() as f64 / MIB
    }

    /// Peak usage after allocator and workspace overhead.
    pub fn peak_mb(&self, memory_overhead: f64) -> f64 {
        self.usage_mb() * memory_overhead
    }

    /// Peak usage as a percentage of the device's memory.
    pub fn utilization_percent(&self, memory_overhead: f64, profile: &HardwareProfile) -> f64 {
        self.peak_mb(memory_overhead) * MIB / profile.memory_bytes().max(1.0) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cost(activation_bytes: u64, params: u64) -> LayerCost {
        LayerCost {
            activation_bytes,
            params,
            bytes_read: activation_bytes / 2,
            bytes_written: activation_bytes / 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_memory_time() {
        let p = HardwareProfile::lookup("rtx4090").unwrap();
        let c = cost(2_016_000_000, 0);
        assert!((memory_time(&c, p) - 2.0e-3).abs() < 1e-12);
    }

    #[test]
    fn test_optimizer_multipliers() {
        assert_eq!(optimizer_state_multiplier(Some("AdamW")), 2);
        assert_eq!(optimizer_state_multiplier(Some("adam")), 2);
        assert_eq!(optimizer_state_multiplier(Some("SGD")), 1);
        assert_eq!(optimizer_state_multiplier(Some("rms-prop")), 1);
        assert_eq!(optimizer_state_multiplier(Some("lion")), 0);
        assert_eq!(optimizer_state_multiplier(None), 0);
    }

    #[test]
    fn test_footprint_components() {
        let costs = [cost(1_000, 10), cost(3_000, 20)];
        let f = MemoryFootprint::estimate(&costs, DType::F32, Some("adam"));
        assert_eq!(f.activation_bytes, 4_000);
        assert_eq!(f.parameter_bytes, 120);
        assert_eq!(f.gradient_bytes, 120);
        assert_eq!(f.optimizer_bytes, 240);
        assert_eq!(f.usage_bytes(), 4_480);
    }

    #[test]
    fn test_peak_and_utilization() {
        let f = MemoryFootprint {
            activation_bytes: 1024 * 1024 * 1024,
            ..Default::default()
        };
        assert!((f.peak_mb(1.3) - 1024.0 * 1.3).abs() < 1e-9);
        let p = HardwareProfile::lookup("rtx4090").unwrap();
        let expected = 1.3 / 24.0 * 100.0;
        assert!((f.utilization_percent(1.3, p) - expected).abs() < 1e-9);
    }
}
