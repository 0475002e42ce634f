// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for calibration storage and updates.

/// Errors that can occur while loading or updating calibration state.
#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    /// The durable store could not be read or written. Nothing was
    /// published; the caller may retry.
    #[error("calibration store unavailable: {source}")]
    StoreUnavailable {
        #[from]
        source: std::io::Error,
    },

    /// The store contains data that cannot be replayed.
    #[error("calibration store corrupt at line {line}: {detail}")]
    Corrupt { line: usize, detail: String },

    /// An observed value is negative or not finite.
    #[error("invalid observation: {0}")]
    InvalidObservation(String),
}

impl CalibrationError {
    /// Returns `true` if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}
