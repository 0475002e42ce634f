// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`CalibrationStore`] trait and store implementations.

pub mod journal;
pub mod memory;

use crate::{CalibrationError, CalibrationSnapshot, ExecutionRecord, FactorEntry};

/// Everything one `record` call commits: factor upserts plus the
/// execution record, applied atomically.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CommitBatch {
    pub factors: Vec<FactorEntry>,
    pub record: ExecutionRecord,
}

/// Durable backing for calibration factors and execution records.
///
/// A commit is all-or-nothing: if `commit` returns an error, none of the
/// batch is visible to a later `load`.
pub trait CalibrationStore: Send + Sync {
    /// Human-readable name of this store.
    fn name(&self) -> &str;

    /// Current committed factors.
    fn load(&self) -> Result<CalibrationSnapshot, CalibrationError>;

    /// Durably commits `batch` and returns the id assigned to its record.
    /// The `id` field of `batch.record` is ignored.
    fn commit(&self, batch: &CommitBatch) -> Result<u64, CalibrationError>;

    /// Every committed execution record, oldest first.
    fn records(&self) -> Result<Vec<ExecutionRecord>, CalibrationError>;
}
