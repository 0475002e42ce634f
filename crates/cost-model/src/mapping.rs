// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Hardware mapping: turns a node's FLOPs into compute time on a profile,
//! scaled by learned efficiency and hardware-correction factors.
//!
//! ```text
//! compute_time = FLOPs / (cores × clock_hz × efficiency(kind) × correction(gpu, kind))
//! utilization  = min(100, FLOPs / (cores × clock_hz) × 100)
//! ```
//!
//! Factors come from a [`FactorSource`]. [`DefaultFactors`] serves the
//! taxonomy defaults; the calibration crate's snapshot serves learned values.

use crate::{HardwareProfile, LayerCost};
use op_graph::OpKind;
use std::fmt;

/// Lower bound applied to every factor before it is used as a divisor.
pub const FACTOR_EPSILON: f64 = 1e-6;

/// What a hardware-correction factor applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CorrectionScope {
    /// A single operation kind on one GPU model.
    Kind(OpKind),
    /// Every kind on one GPU model.
    General,
}

impl CorrectionScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kind(kind) => kind.as_str(),
            Self::General => "general",
        }
    }

    /// Parses `"general"` or an operation kind label.
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("general") {
            return Some(Self::General);
        }
        OpKind::from_str_loose(s).map(Self::Kind)
    }
}

impl fmt::Display for CorrectionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CorrectionScope> for String {
    fn from(scope: CorrectionScope) -> Self {
        scope.as_str().to_string()
    }
}

impl TryFrom<String> for CorrectionScope {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("unknown correction scope '{s}'"))
    }
}

/// Read access to calibration factors.
///
/// Implementations must return strictly positive values; callers still
/// floor them at [`FACTOR_EPSILON`].
pub trait FactorSource: Send + Sync {
    /// Fraction of peak throughput reached by `kind`.
    fn efficiency(&self, kind: OpKind) -> f64;

    /// The stored correction for `(gpu, scope)`, if one exists.
    fn correction(&self, gpu: &str, scope: CorrectionScope) -> Option<f64>;

    /// Correction for `kind` on `gpu`, falling back to the GPU's general
    /// correction and then to `1.0`.
    fn hardware_correction(&self, gpu: &str, kind: OpKind) -> f64 {
        self.correction(gpu, CorrectionScope::Kind(kind))
            .or_else(|| self.correction(gpu, CorrectionScope::General))
            .unwrap_or(1.0)
    }

    /// The GPU's general correction, or `1.0`.
    fn general_correction(&self, gpu: &str) -> f64 {
        self.correction(gpu, CorrectionScope::General).unwrap_or(1.0)
    }
}

/// Uncalibrated factors: taxonomy default efficiencies, no corrections.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactors;

impl FactorSource for DefaultFactors {
    fn efficiency(&self, kind: OpKind) -> f64 {
        kind.default_efficiency()
    }

    fn correction(&self, _gpu: &str, _scope: CorrectionScope) -> Option<f64> {
        None
    }
}

/// A node's cost mapped onto a hardware profile.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct HardwareCost {
    pub compute_time_s: f64,
    pub efficiency: f64,
    pub correction: f64,
    /// Percent of peak throughput, capped at 100.
    pub utilization: f64,
}

/// Maps a layer cost onto `profile` using the given factors.
pub fn map_to_hardware(
    cost: &LayerCost,
    kind: OpKind,
    profile: &HardwareProfile,
    factors: &dyn FactorSource,
) -> HardwareCost {
    let peak = profile.peak_ops_per_second().max(FACTOR_EPSILON);
    let efficiency = sanitize(factors.efficiency(kind));
    let correction = sanitize(factors.hardware_correction(profile.name, kind));
    let flops = cost.flops as f64;

    HardwareCost {
        compute_time_s: flops / (peak * efficiency * correction),
        efficiency,
        correction,
        utilization: (flops / peak * 100.0).min(100.0),
    }
}

/// Floors a factor at [`FACTOR_EPSILON`], treating non-finite values as
/// the floor.
fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.max(FACTOR_EPSILON)
    } else {
        FACTOR_EPSILON
    }
}
