// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The shared calibration handle.
//!
//! # Concurrency
//!
//! ```text
//! reader:  snapshot() ──► Arc<CalibrationSnapshot>   (never blocks on writers' I/O)
//!
//! writer:  transact(keys, f)
//!            lock key mutexes in sorted order
//!            f(current snapshot) ──► CommitBatch
//!            store.commit(batch)          (durable; on error nothing is published)
//!            merge batch factors into the latest snapshot, swap the Arc
//! ```
//!
//! Writers touching disjoint keys run their read-modify-write concurrently;
//! writers sharing a key serialize on that key's mutex.

use crate::store::{CalibrationStore, CommitBatch};
use crate::{CalibrationError, CalibrationKey, CalibrationParams, CalibrationSnapshot, ExecutionRecord};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Shared, thread-safe access to calibration factors.
pub struct CalibrationState {
    store: Arc<dyn CalibrationStore>,
    snapshot: RwLock<Arc<CalibrationSnapshot>>,
    key_locks: Mutex<HashMap<CalibrationKey, Arc<Mutex<()>>>>,
    params: CalibrationParams,
}

impl std::fmt::Debug for CalibrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalibrationState")
            .field("store", &self.store.name())
            .field("factors", &self.snapshot().len())
            .field("params", &self.params)
            .finish()
    }
}

impl CalibrationState {
    /// Loads the committed snapshot from `store`.
    pub fn open(store: Arc<dyn CalibrationStore>, params: CalibrationParams) -> Result<Self, CalibrationError> {
        let snapshot = store.load()?;
        tracing::info!(
            "calibration state loaded from {} store ({} factors)",
            store.name(),
            snapshot.len()
        );
        Ok(Self {
            store,
            snapshot: RwLock::new(Arc::new(snapshot)),
            key_locks: Mutex::new(HashMap::new()),
            params,
        })
    }

    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    pub fn store(&self) -> &dyn CalibrationStore {
        self.store.as_ref()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<CalibrationSnapshot> {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Every committed execution record.
    pub fn records(&self) -> Result<Vec<ExecutionRecord>, CalibrationError> {
        self.store.records()
    }

    fn key_lock(&self, key: &CalibrationKey) -> Arc<Mutex<()>> {
        let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Runs one read-modify-write transaction over `keys`.
    ///
    /// `f` sees a snapshot in which no other writer can change any of
    /// `keys` until this call returns. It returns the batch to commit and a
    /// value handed back to the caller. Factors in the batch must be drawn
    /// from `keys`.
    ///
    /// Returns the id of the committed record with `f`'s value.
    pub fn transact<T, F>(&self, keys: &[CalibrationKey], f: F) -> Result<(u64, T), CalibrationError>
    where
        F: FnOnce(&CalibrationSnapshot) -> Result<(CommitBatch, T), CalibrationError>,
    {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let locks: Vec<Arc<Mutex<()>>> = keys.iter().map(|k| self.key_lock(k)).collect();
        let _guards: Vec<_> = locks
            .iter()
            .map(|l| l.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();

        let current = self.snapshot();
        let (batch, value) = f(&current)?;
        debug_assert!(batch.factors.iter().all(|e| keys.binary_search(&e.key).is_ok()));

        let id = self.store.commit(&batch).map_err(|e| {
            tracing::warn!("calibration commit to {} store failed: {e}", self.store.name());
            e
        })?;

        {
            let mut published = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            let mut next = CalibrationSnapshot::clone(&published);
            for entry in &batch.factors {
                next.set(entry.key.clone(), entry.factor);
            }
            *published = Arc::new(next);
        }

        tracing::info!("committed calibration record {id} ({} factors)", batch.factors.len());
        Ok((id, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use crate::{Factor, FactorEntry, Observation};
    use op_graph::{ModelDescriptor, OpKind};
    use std::thread;

    struct FailingStore;

    impl CalibrationStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }
        fn load(&self) -> Result<CalibrationSnapshot, CalibrationError> {
            Ok(CalibrationSnapshot::new())
        }
        fn commit(&self, _batch: &CommitBatch) -> Result<u64, CalibrationError> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk unplugged").into())
        }
        fn records(&self) -> Result<Vec<ExecutionRecord>, CalibrationError> {
            Ok(Vec::new())
        }
    }

    fn record() -> ExecutionRecord {
        ExecutionRecord {
            id: 0,
            fingerprint: "f".into(),
            gpu_model: None,
            hardware: "rtx4090".into(),
            descriptor: ModelDescriptor::default(),
            predicted: Observation::new(1.0, 1.0, 1.0),
            actual: Observation::new(1.0, 1.0, 1.0),
            timestamp_ms: 0,
        }
    }

    /// Adds `delta` to the Dense efficiency factor.
    fn bump(state: &CalibrationState, delta: f64) -> Result<u64, CalibrationError> {
        let key = CalibrationKey::efficiency(OpKind::Dense);
        state
            .transact(std::slice::from_ref(&key), |snapshot| {
                let mut factor = snapshot.factor_or_default(&key);
                factor.value += delta;
                factor.update_count += 1;
                Ok((
                    CommitBatch {
                        factors: vec![FactorEntry { key: key.clone(), factor }],
                        record: record(),
                    },
                    (),
                ))
            })
            .map(|(id, ())| id)
    }

    #[test]
    fn test_commit_publishes_snapshot() {
        let state = CalibrationState::open(Arc::new(InMemoryStore::new()), CalibrationParams::default()).unwrap();
        let before = state.snapshot();
        assert_eq!(bump(&state, -0.1).unwrap(), 1);
        let after = state.snapshot();
        let key = CalibrationKey::efficiency(OpKind::Dense);
        assert!(before.get(&key).is_none());
        assert!((after.get(&key).unwrap().value - 0.8).abs() < 1e-12);
        assert_eq!(state.records().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_commit_publishes_nothing() {
        let state = CalibrationState::open(Arc::new(FailingStore), CalibrationParams::default()).unwrap();
        let err = bump(&state, -0.1).unwrap_err();
        assert!(err.is_retryable());
        assert!(state.snapshot().is_empty());
    }

    #[test]
    fn test_closure_error_aborts() {
        let state = CalibrationState::open(Arc::new(InMemoryStore::new()), CalibrationParams::default()).unwrap();
        let key = CalibrationKey::efficiency(OpKind::Dense);
        let result: Result<(u64, ()), _> = state.transact(&[key], |_| {
            Err(CalibrationError::InvalidObservation("negative".into()))
        });
        assert!(matches!(result, Err(CalibrationError::InvalidObservation(_))));
        assert!(state.records().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_same_key_updates_are_not_lost() {
        let state = Arc::new(
            CalibrationState::open(Arc::new(InMemoryStore::new()), CalibrationParams::default()).unwrap(),
        );
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for _ in 0..25 {
                        bump(&state, -0.001).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let factor = state
            .snapshot()
            .factor_or_default(&CalibrationKey::efficiency(OpKind::Dense));
        assert_eq!(factor.update_count, 200);
        assert!((factor.value - (0.9 - 0.2)).abs() < 1e-9);
        assert_eq!(state.records().unwrap().len(), 200);
    }

    #[test]
    fn test_disjoint_keys_keep_each_others_updates() {
        let state = CalibrationState::open(Arc::new(InMemoryStore::new()), CalibrationParams::default()).unwrap();
        let a = CalibrationKey::efficiency(OpKind::Dense);
        let b = CalibrationKey::general_correction("t4");
        for key in [a.clone(), b.clone()] {
            state
                .transact(std::slice::from_ref(&key), |_| {
                    Ok((
                        CommitBatch {
                            factors: vec![FactorEntry {
                                key: key.clone(),
                                factor: Factor::new(0.5),
                            }],
                            record: record(),
                        },
                        (),
                    ))
                })
                .unwrap();
        }
        let snapshot = state.snapshot();
        assert_eq!(snapshot.get(&a).unwrap().value, 0.5);
        assert_eq!(snapshot.get(&b).unwrap().value, 0.5);
    }
}
