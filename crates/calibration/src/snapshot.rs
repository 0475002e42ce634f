// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! An immutable view of every committed calibration factor.

use crate::{CalibrationKey, Factor, FactorEntry};
use cost_model::{CorrectionScope, FactorSource};
use op_graph::OpKind;
use std::collections::BTreeMap;

/// Committed factors, keyed by [`CalibrationKey`].
///
/// Keys without an entry read as their default factor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationSnapshot {
    factors: BTreeMap<CalibrationKey, Factor>,
}

impl CalibrationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored factor for `key`, if any.
    pub fn get(&self, key: &CalibrationKey) -> Option<&Factor> {
        self.factors.get(key)
    }

    /// The stored factor for `key`, or the key's default.
    pub fn factor_or_default(&self, key: &CalibrationKey) -> Factor {
        self.get(key).copied().unwrap_or_else(|| key.default_factor())
    }

    /// Inserts or replaces a factor.
    pub fn set(&mut self, key: CalibrationKey, factor: Factor) {
        self.factors.insert(key, factor);
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Every stored factor, in key order.
    pub fn entries(&self) -> Vec<FactorEntry> {
        self.factors
            .iter()
            .map(|(key, factor)| FactorEntry {
                key: key.clone(),
                factor: *factor,
            })
            .collect()
    }
}

impl FactorSource for CalibrationSnapshot {
    fn efficiency(&self, kind: OpKind) -> f64 {
        self.factor_or_default(&CalibrationKey::efficiency(kind)).value
    }

    fn correction(&self, gpu: &str, scope: CorrectionScope) -> Option<f64> {
        self.factors
            .get(&CalibrationKey::correction(gpu, scope))
            .map(|factor| factor.value)
    }
}
