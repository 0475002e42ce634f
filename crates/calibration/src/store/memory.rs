// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Volatile store for tests and one-shot runs.

use super::{CalibrationStore, CommitBatch};
use crate::{CalibrationError, CalibrationSnapshot, ExecutionRecord};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    snapshot: CalibrationSnapshot,
    records: Vec<ExecutionRecord>,
    next_id: u64,
}

/// Keeps everything in process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with `snapshot`.
    pub fn with_snapshot(snapshot: CalibrationSnapshot) -> Self {
        Self {
            inner: Mutex::new(Inner {
                snapshot,
                ..Inner::default()
            }),
        }
    }
}

impl CalibrationStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self) -> Result<CalibrationSnapshot, CalibrationError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.snapshot.clone())
    }

    fn commit(&self, batch: &CommitBatch) -> Result<u64, CalibrationError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id + 1;
        for entry in &batch.factors {
            inner.snapshot.set(entry.key.clone(), entry.factor);
        }
        let mut record = batch.record.clone();
        record.id = id;
        inner.records.push(record);
        inner.next_id = id;
        Ok(id)
    }

    fn records(&self) -> Result<Vec<ExecutionRecord>, CalibrationError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.records.clone())
    }
}
