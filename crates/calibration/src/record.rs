// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Execution records and prediction-accuracy statistics.

use crate::CalibrationError;
use op_graph::ModelDescriptor;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds in one day.
pub const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Current unix time in milliseconds (0 if the clock is before the epoch).
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The three quantities the estimator predicts, as predicted or observed.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Observation {
    pub time_seconds: f64,
    pub memory_mb: f64,
    pub utilization_percent: f64,
}

impl Observation {
    pub fn new(time_seconds: f64, memory_mb: f64, utilization_percent: f64) -> Self {
        Self {
            time_seconds,
            memory_mb,
            utilization_percent,
        }
    }

    /// Rejects negative or non-finite values.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        for (name, value) in [
            ("time_seconds", self.time_seconds),
            ("memory_mb", self.memory_mb),
            ("utilization_percent", self.utilization_percent),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CalibrationError::InvalidObservation(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// `|predicted − actual| / actual`, with the denominator floored at
/// `f64::EPSILON`.
pub fn relative_error(predicted: f64, actual: f64) -> f64 {
    (predicted - actual).abs() / actual.max(f64::EPSILON)
}

/// Relative error of each predicted quantity.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PredictionError {
    pub time_error: f64,
    pub memory_error: f64,
    pub utilization_error: f64,
}

impl PredictionError {
    pub fn between(predicted: &Observation, actual: &Observation) -> Self {
        Self {
            time_error: relative_error(predicted.time_seconds, actual.time_seconds),
            memory_error: relative_error(predicted.memory_mb, actual.memory_mb),
            utilization_error: relative_error(predicted.utilization_percent, actual.utilization_percent),
        }
    }
}

/// One observed training run, as written to the `execution_records`
/// collection. Immutable once committed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionRecord {
    /// Assigned by the store on commit.
    pub id: u64,
    /// [`ModelDescriptor::fingerprint`] of `descriptor`.
    pub fingerprint: String,
    /// GPU model as requested by the caller.
    pub gpu_model: Option<String>,
    /// Hardware profile the prediction was computed against.
    pub hardware: String,
    pub descriptor: ModelDescriptor,
    pub predicted: Observation,
    pub actual: Observation,
    pub timestamp_ms: u64,
}

impl ExecutionRecord {
    pub fn error(&self) -> PredictionError {
        PredictionError::between(&self.predicted, &self.actual)
    }
}

/// Mean absolute percentage error over a window of records.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct AccuracyStats {
    pub time_mape: f64,
    pub memory_mape: f64,
    pub utilization_mape: f64,
    /// `1 − time_mape`.
    pub time_accuracy: f64,
    pub memory_accuracy: f64,
    pub utilization_accuracy: f64,
    pub sample_count: u64,
    /// `min(1, samples / 100)`.
    pub confidence: f64,
}

impl AccuracyStats {
    /// Computes statistics over records with `timestamp_ms > since_ms`.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ExecutionRecord>, since_ms: u64) -> Self {
        let mut n = 0u64;
        let (mut time, mut memory, mut util) = (0.0, 0.0, 0.0);
        for record in records.into_iter().filter(|r| r.timestamp_ms > since_ms) {
            let e = record.error();
            time += e.time_error;
            memory += e.memory_error;
            util += e.utilization_error;
            n += 1;
        }
        let mean = |sum: f64| if n == 0 { 0.0 } else { sum / n as f64 };
        let (time_mape, memory_mape, utilization_mape) = (mean(time), mean(memory), mean(util));
        Self {
            time_mape,
            memory_mape,
            utilization_mape,
            time_accuracy: 1.0 - time_mape,
            memory_accuracy: 1.0 - memory_mape,
            utilization_accuracy: 1.0 - utilization_mape,
            sample_count: n,
            confidence: (n as f64 / 100.0).min(1.0),
        }
    }
}
