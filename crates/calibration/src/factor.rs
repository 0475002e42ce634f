// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Calibration keys and learned factors.

use cost_model::CorrectionScope;
use op_graph::OpKind;
use std::fmt;

/// Identifies one learned factor.
///
/// Keys are ordered so that multi-key transactions can lock them in a
/// global order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "collection", rename_all = "snake_case")]
pub enum CalibrationKey {
    /// `efficiency_factors[kind]`.
    Efficiency { kind: OpKind },
    /// `hardware_corrections[(gpu, scope)]`.
    Correction { gpu: String, scope: CorrectionScope },
}

impl CalibrationKey {
    pub fn efficiency(kind: OpKind) -> Self {
        Self::Efficiency { kind }
    }

    pub fn correction(gpu: impl Into<String>, scope: CorrectionScope) -> Self {
        Self::Correction {
            gpu: gpu.into(),
            scope,
        }
    }

    /// The `(gpu, general)` correction key.
    pub fn general_correction(gpu: impl Into<String>) -> Self {
        Self::correction(gpu, CorrectionScope::General)
    }

    /// The value a factor for this key starts from.
    pub fn default_factor(&self) -> Factor {
        match self {
            Self::Efficiency { kind } => Factor::new(kind.default_efficiency()),
            Self::Correction { .. } => Factor::new(1.0),
        }
    }
}

impl fmt::Display for CalibrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Efficiency { kind } => write!(f, "efficiency/{kind}"),
            Self::Correction { gpu, scope } => write!(f, "correction/{gpu}/{scope}"),
        }
    }
}

/// A learned multiplicative factor and its update history.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Factor {
    /// Current value; always strictly positive.
    pub value: f64,
    /// `1 − (1 − α)ⁿ` after `n` updates.
    pub confidence: f64,
    pub update_count: u64,
    /// Unix time of the last update in milliseconds (0 if never updated).
    pub last_updated_ms: u64,
}

impl Factor {
    /// A never-updated factor with the given starting value.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            confidence: 0.0,
            update_count: 0,
            last_updated_ms: 0,
        }
    }
}

/// A key paired with its factor, for listings and journal entries.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FactorEntry {
    #[serde(flatten)]
    pub key: CalibrationKey,
    #[serde(flatten)]
    pub factor: Factor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ordering_is_total() {
        let mut keys = vec![
            CalibrationKey::general_correction("v100"),
            CalibrationKey::efficiency(OpKind::Dense),
            CalibrationKey::general_correction("rtx4090"),
            CalibrationKey::efficiency(OpKind::Input),
        ];
        keys.sort();
        assert_eq!(keys[0], CalibrationKey::efficiency(OpKind::Input));
        assert_eq!(keys[1], CalibrationKey::efficiency(OpKind::Dense));
        assert_eq!(keys[2], CalibrationKey::general_correction("rtx4090"));
    }

    #[test]
    fn test_defaults() {
        let e = CalibrationKey::efficiency(OpKind::Conv2d).default_factor();
        assert_eq!(e.value, 0.8);
        assert_eq!(e.update_count, 0);
        let c = CalibrationKey::general_correction("t4").default_factor();
        assert_eq!(c.value, 1.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CalibrationKey::efficiency(OpKind::GraphConv).to_string(),
            "efficiency/graph_conv"
        );
        assert_eq!(
            CalibrationKey::general_correction("rtx4090").to_string(),
            "correction/rtx4090/general"
        );
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = FactorEntry {
            key: CalibrationKey::general_correction("a100"),
            factor: Factor::new(1.0),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["collection"], "correction");
        assert_eq!(json["gpu"], "a100");
        assert_eq!(json["scope"], "general");
        assert_eq!(json["value"], 1.0);
        let back: FactorEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
