// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Exponential-moving-average update rule for learned factors.
//!
//! ```text
//! target = old × ratio
//! new    = clamp((1 − α) · old + α · target, floor, ceiling)
//! ```
//!
//! For efficiency factors `ratio = predicted_time / actual_time`; for
//! hardware corrections `ratio = actual_utilization / predicted_utilization`.
//! A perfect prediction has `ratio = 1` and leaves the factor unchanged.
//!
//! With a fixed target, each step closes a fraction `α` of the remaining
//! gap, so the factor approaches the target monotonically with
//! geometrically shrinking steps and never overshoots.

use crate::Factor;

/// Learning rates and bounds for calibration updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationParams {
    /// EMA rate for per-kind efficiency factors.
    pub efficiency_learning_rate: f64,
    /// EMA rate for per-GPU correction factors.
    pub correction_learning_rate: f64,
    /// Smallest value any factor may take.
    pub factor_floor: f64,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            efficiency_learning_rate: 0.1,
            correction_learning_rate: 0.05,
            factor_floor: 1e-6,
        }
    }
}

impl CalibrationParams {
    /// Rule for efficiency factors: clamped to `[floor, 1]`.
    pub fn efficiency_rule(&self) -> EmaRule {
        EmaRule {
            alpha: self.efficiency_learning_rate,
            floor: self.factor_floor,
            ceiling: 1.0,
        }
    }

    /// Rule for hardware corrections: clamped to `[floor, ∞)`.
    pub fn correction_rule(&self) -> EmaRule {
        EmaRule {
            alpha: self.correction_learning_rate,
            floor: self.factor_floor,
            ceiling: f64::INFINITY,
        }
    }
}

/// One EMA learning rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmaRule {
    pub alpha: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl EmaRule {
    /// Moves `current` a fraction `alpha` of the way toward `target`.
    pub fn step(&self, current: f64, target: f64) -> f64 {
        // Same as (1 − α)·current + α·target, but exact when target == current.
        let next = current + self.alpha * (target - current);
        if next.is_finite() {
            next.clamp(self.floor, self.ceiling)
        } else {
            current.clamp(self.floor, self.ceiling)
        }
    }

    /// Confidence after `updates` steps: `1 − (1 − α)ⁿ`.
    pub fn confidence(&self, updates: u64) -> f64 {
        let n = i32::try_from(updates).unwrap_or(i32::MAX);
        1.0 - (1.0 - self.alpha).powi(n)
    }

    /// Applies one observation to `factor`.
    ///
    /// `ratio` is the multiplicative change the observation implies, so the
    /// target is `factor.value × ratio`.
    pub fn apply(&self, factor: &Factor, ratio: f64, now_ms: u64) -> Factor {
        let update_count = factor.update_count.saturating_add(1);
        Factor {
            value: self.step(factor.value, factor.value * ratio),
            confidence: self.confidence(update_count),
            update_count,
            last_updated_ms: now_ms,
        }
    }
}
