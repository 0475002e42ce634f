// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Estimator configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! store_path = "./calibration.jsonl"
//! default_gpu = "rtx4090"
//! overhead_factor = 1.07
//! memory_overhead = 1.3
//! backward_multiplier = 2.0
//! efficiency_learning_rate = 0.1
//! correction_learning_rate = 0.05
//! factor_floor = 1e-6
//! accuracy_window_days = 30
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above,
//! except `store_path`, whose absence selects an in-memory store.

use crate::EstimatorError;
use calibration::{CalibrationParams, DAY_MS};
use cost_model::{CostModelParams, HardwareProfile, DEFAULT_GPU, FACTOR_EPSILON};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the estimator.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Calibration journal. `None` keeps calibration in memory only.
    pub store_path: Option<PathBuf>,
    /// GPU profile for requests that name none or an unknown one.
    pub default_gpu: String,
    /// Launch/sync overhead multiplier on the bottleneck time.
    pub overhead_factor: f64,
    /// Peak-to-steady-state memory multiplier.
    pub memory_overhead: f64,
    /// Backward pass cost relative to the forward pass.
    pub backward_multiplier: f64,
    pub efficiency_learning_rate: f64,
    pub correction_learning_rate: f64,
    /// Smallest value a learned factor may take.
    pub factor_floor: f64,
    /// Window for [`crate::Estimator::accuracy`].
    pub accuracy_window_days: u64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        let cost = CostModelParams::default();
        let calibration = CalibrationParams::default();
        Self {
            store_path: None,
            default_gpu: DEFAULT_GPU.to_string(),
            overhead_factor: cost.overhead_factor,
            memory_overhead: cost.memory_overhead,
            backward_multiplier: cost.backward_multiplier,
            efficiency_learning_rate: calibration.efficiency_learning_rate,
            correction_learning_rate: calibration.correction_learning_rate,
            factor_floor: calibration.factor_floor,
            accuracy_window_days: 30,
        }
    }
}

impl EstimatorConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, EstimatorError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EstimatorError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, EstimatorError> {
        toml::from_str(toml_str).map_err(|e| EstimatorError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, EstimatorError> {
        toml::to_string_pretty(self)
            .map_err(|e| EstimatorError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Checks every tuning constant is in range.
    pub fn validate(&self) -> Result<(), EstimatorError> {
        let positive = [
            ("overhead_factor", self.overhead_factor),
            ("memory_overhead", self.memory_overhead),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(EstimatorError::ConfigError(format!("{name} must be positive, got {value}")));
            }
        }
        if !self.backward_multiplier.is_finite() || self.backward_multiplier < 0.0 {
            return Err(EstimatorError::ConfigError(format!(
                "backward_multiplier must be non-negative, got {}",
                self.backward_multiplier
            )));
        }
        for (name, value) in [
            ("efficiency_learning_rate", self.efficiency_learning_rate),
            ("correction_learning_rate", self.correction_learning_rate),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(EstimatorError::ConfigError(format!("{name} must be in (0, 1], got {value}")));
            }
        }
        // The cost model floors every factor at FACTOR_EPSILON before use.
        if !(self.factor_floor >= FACTOR_EPSILON && self.factor_floor < 1.0) {
            return Err(EstimatorError::ConfigError(format!(
                "factor_floor must be in [{FACTOR_EPSILON}, 1), got {}",
                self.factor_floor
            )));
        }
        if HardwareProfile::lookup(&self.default_gpu).is_none() {
            let known: Vec<&str> = HardwareProfile::all().iter().map(|p| p.name).collect();
            return Err(EstimatorError::ConfigError(format!(
                "unknown default_gpu '{}'; expected one of {}",
                self.default_gpu,
                known.join(", ")
            )));
        }
        Ok(())
    }

    pub fn cost_model_params(&self) -> CostModelParams {
        CostModelParams {
            overhead_factor: self.overhead_factor,
            memory_overhead: self.memory_overhead,
            backward_multiplier: self.backward_multiplier,
            default_gpu: self.default_gpu.clone(),
        }
    }

    pub fn calibration_params(&self) -> CalibrationParams {
        CalibrationParams {
            efficiency_learning_rate: self.efficiency_learning_rate,
            correction_learning_rate: self.correction_learning_rate,
            factor_floor: self.factor_floor,
        }
    }

    pub fn accuracy_window(&self) -> Duration {
        Duration::from_millis(self.accuracy_window_days.saturating_mul(DAY_MS))
    }
}
