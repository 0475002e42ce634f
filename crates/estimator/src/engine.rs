// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The estimator: predictions against the live calibration snapshot, and
//! the record path that learns from observed runs.
//!
//! ```text
//! predict(descriptor, hardware)
//!     │  GraphBuilder::build
//!     ▼
//!   CostModel::predict_graph(snapshot)  ──►  Prediction
//!
//! record(descriptor, hardware, actual)
//!     │  validate actual, build graph, collect keys
//!     ▼
//!   CalibrationState::transact(keys)
//!     │  re-predict under the key locks
//!     │  EMA-update each efficiency factor and the GPU correction
//!     ▼
//!   commit {factors, execution record}  ──►  UpdateResult
//! ```

use crate::{EstimatorConfig, EstimatorError};
use calibration::{
    now_ms, AccuracyStats, CalibrationKey, CalibrationParams, CalibrationSnapshot, CalibrationState,
    CalibrationStore, CommitBatch, ExecutionRecord, FactorEntry, InMemoryStore, JournalStore, Observation,
    PredictionError,
};
use cost_model::{CostModel, HardwareSpec, Prediction};
use op_graph::{ComputationGraph, GraphBuilder, ModelDescriptor, Validated};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one [`Estimator::record`] call.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UpdateResult {
    /// Id of the committed execution record.
    pub record_id: u64,
    /// What the estimator predicted before this update.
    pub predicted: Observation,
    /// Relative error of that prediction against the observation.
    pub prediction_error: PredictionError,
    /// Keys whose factors were updated.
    pub updated_keys: Vec<CalibrationKey>,
    /// Keys left unchanged because the observation carried no signal for them.
    pub skipped_keys: Vec<CalibrationKey>,
}

/// A training-cost estimator with continual calibration.
///
/// `Estimator` is `Send + Sync`; share it through an `Arc` and call
/// [`predict`](Self::predict) and [`record`](Self::record) from any thread.
///
/// # Example
/// ```
/// use calibration::Observation;
/// use cost_model::HardwareSpec;
/// use estimator::{Estimator, EstimatorConfig};
/// use op_graph::{ModelDescriptor, ModelType};
///
/// let estimator = Estimator::open(EstimatorConfig::default()).unwrap();
/// let descriptor = ModelDescriptor::new(ModelType::GraphConvPose).with_batch_size(16);
/// let hardware = HardwareSpec::new("rtx4090");
///
/// let before = estimator.predict(&descriptor, &hardware);
/// let actual = Observation::new(before.estimated_time_seconds * 2.0, before.memory_usage_mb, before.sm_utilization);
/// estimator.record(&descriptor, &hardware, actual).unwrap();
/// assert!(estimator.predict(&descriptor, &hardware).estimated_time_seconds > before.estimated_time_seconds);
/// ```
#[derive(Debug)]
pub struct Estimator {
    model: CostModel,
    state: CalibrationState,
    accuracy_window: Duration,
}

impl Estimator {
    /// Validates `config` and opens the store it names: a journal at
    /// `store_path`, or an in-memory store if there is none.
    pub fn open(config: EstimatorConfig) -> Result<Self, EstimatorError> {
        config.validate()?;
        let store: Arc<dyn CalibrationStore> = match &config.store_path {
            Some(path) => Arc::new(JournalStore::open(path)?),
            None => Arc::new(InMemoryStore::new()),
        };
        Self::with_store(config, store)
    }

    /// Builds an estimator over an existing store.
    pub fn with_store(config: EstimatorConfig, store: Arc<dyn CalibrationStore>) -> Result<Self, EstimatorError> {
        config.validate()?;
        let state = CalibrationState::open(store, config.calibration_params())?;
        tracing::info!(
            "estimator ready (default gpu '{}', {} calibrated factors)",
            config.default_gpu,
            state.snapshot().len()
        );
        Ok(Self {
            model: CostModel::new(config.cost_model_params()),
            accuracy_window: config.accuracy_window(),
            state,
        })
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.model
    }

    pub fn calibration_params(&self) -> &CalibrationParams {
        self.state.params()
    }

    /// The calibration snapshot predictions currently read from.
    pub fn snapshot(&self) -> Arc<CalibrationSnapshot> {
        self.state.snapshot()
    }

    /// Predicts the training cost of `descriptor` on `hardware`.
    ///
    /// Read-only: never blocks on a concurrent `record` commit.
    pub fn predict(&self, descriptor: &ModelDescriptor, hardware: &HardwareSpec) -> Prediction {
        let graph = GraphBuilder::build(descriptor);
        self.predict_graph(&graph, descriptor, hardware)
    }

    /// Predicts the training cost of an explicit graph.
    pub fn predict_graph(
        &self,
        graph: &ComputationGraph<Validated>,
        descriptor: &ModelDescriptor,
        hardware: &HardwareSpec,
    ) -> Prediction {
        let snapshot = self.state.snapshot();
        self.model.predict_graph(graph, descriptor, hardware, snapshot.as_ref())
    }

    /// Records an observed training run and updates the factors it informs.
    ///
    /// Fails with a non-retryable error if `actual` holds a negative or
    /// non-finite value, and with a retryable one if the store cannot
    /// commit. On failure no factor changes.
    pub fn record(
        &self,
        descriptor: &ModelDescriptor,
        hardware: &HardwareSpec,
        actual: Observation,
    ) -> Result<UpdateResult, EstimatorError> {
        actual.validate()?;
        let graph = GraphBuilder::build(descriptor);
        self.record_graph(&graph, descriptor, hardware, actual)
    }

    /// [`record`](Self::record) for an explicit graph.
    pub fn record_graph(
        &self,
        graph: &ComputationGraph<Validated>,
        descriptor: &ModelDescriptor,
        hardware: &HardwareSpec,
        actual: Observation,
    ) -> Result<UpdateResult, EstimatorError> {
        actual.validate()?;
        let profile = self.model.profile(hardware);
        let correction_key = CalibrationKey::general_correction(profile.name);
        let mut keys: Vec<CalibrationKey> = graph.kinds().into_iter().map(CalibrationKey::efficiency).collect();
        keys.push(correction_key.clone());

        let params = *self.state.params();
        let (record_id, (predicted, updated_keys, skipped_keys)) = self.state.transact(&keys, |snapshot| {
            let prediction = self.model.predict_graph(graph, descriptor, hardware, snapshot);
            let now = now_ms();
            let mut factors = Vec::new();
            let mut skipped = Vec::new();

            let efficiency = params.efficiency_rule();
            for kind_cost in &prediction.breakdown {
                let key = CalibrationKey::efficiency(kind_cost.kind);
                let predicted_share = prediction.estimated_time_seconds * kind_cost.compute_share;
                let actual_share = actual.time_seconds * kind_cost.compute_share;
                if predicted_share <= 0.0 || actual_share <= 0.0 {
                    tracing::debug!("no time signal for {key}, skipping");
                    skipped.push(key);
                    continue;
                }
                let factor = efficiency.apply(&snapshot.factor_or_default(&key), predicted_share / actual_share, now);
                factors.push(FactorEntry { key, factor });
            }

            let predicted_util = prediction.sm_utilization;
            if predicted_util > 0.0 && actual.utilization_percent > 0.0 {
                let factor = params.correction_rule().apply(
                    &snapshot.factor_or_default(&correction_key),
                    actual.utilization_percent / predicted_util,
                    now,
                );
                factors.push(FactorEntry {
                    key: correction_key.clone(),
                    factor,
                });
            } else {
                tracing::warn!(
                    "no utilization signal (predicted {predicted_util:.3}%, actual {:.3}%), skipping {correction_key}",
                    actual.utilization_percent
                );
                skipped.push(correction_key.clone());
            }

            let predicted = Observation::new(
                prediction.estimated_time_seconds,
                prediction.memory_usage_mb,
                prediction.sm_utilization,
            );
            let record = ExecutionRecord {
                id: 0,
                fingerprint: descriptor.fingerprint(),
                gpu_model: hardware.gpu_model.clone(),
                hardware: profile.name.to_string(),
                descriptor: descriptor.clone(),
                predicted,
                actual,
                timestamp_ms: now,
            };
            let updated = factors.iter().map(|e| e.key.clone()).collect::<Vec<_>>();
            Ok((CommitBatch { factors, record }, (predicted, updated, skipped)))
        })?;

        let prediction_error = PredictionError::between(&predicted, &actual);
        tracing::info!(
            "recorded run {record_id} for {} on {}: time error {:.1}%, {} factors updated",
            graph.name,
            profile.name,
            prediction_error.time_error * 100.0,
            updated_keys.len()
        );

        Ok(UpdateResult {
            record_id,
            predicted,
            prediction_error,
            updated_keys,
            skipped_keys,
        })
    }

    /// Accuracy over the configured window.
    pub fn accuracy(&self) -> Result<AccuracyStats, EstimatorError> {
        self.accuracy_within(self.accuracy_window)
    }

    /// Accuracy over records newer than `window`.
    pub fn accuracy_within(&self, window: Duration) -> Result<AccuracyStats, EstimatorError> {
        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        let since = now_ms().saturating_sub(window_ms);
        let records = self.state.records()?;
        Ok(AccuracyStats::from_records(&records, since))
    }

    /// Every committed factor.
    pub fn factors(&self) -> Vec<FactorEntry> {
        self.state.snapshot().entries()
    }

    /// Every committed execution record, oldest first.
    pub fn records(&self) -> Result<Vec<ExecutionRecord>, EstimatorError> {
        Ok(self.state.records()?)
    }
}
