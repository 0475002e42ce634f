// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the estimator.

/// Errors that can occur while configuring the estimator or recording runs.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    /// A graph manifest could not be loaded or validated.
    #[error("graph error: {0}")]
    GraphError(#[from] op_graph::GraphError),

    /// Calibration storage or update failed.
    #[error("calibration error: {0}")]
    CalibrationError(#[from] calibration::CalibrationError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl EstimatorError {
    /// Returns `true` if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CalibrationError(e) if e.is_retryable())
    }
}
