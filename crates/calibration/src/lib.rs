// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # calibration
//!
//! Learned correction factors for the cost model, and the machinery that
//! keeps them durable and consistent under concurrent updates.
//!
//! # Key Components
//!
//! - [`CalibrationKey`] / [`Factor`]: one learned value per operation kind
//!   (efficiency) or per `(gpu, scope)` pair (hardware correction).
//! - [`EmaRule`]: the exponential-moving-average update applied to a factor
//!   after each observed run.
//! - [`CalibrationSnapshot`]: an immutable view of all factors; implements
//!   [`cost_model::FactorSource`] so predictions read it directly.
//! - [`CalibrationStore`]: durable backing. [`InMemoryStore`] for tests,
//!   [`JournalStore`] for a JSON-lines journal on disk.
//! - [`CalibrationState`]: the shared handle. Readers take the current
//!   snapshot; writers run per-key transactions.
//! - [`ExecutionRecord`] / [`AccuracyStats`]: what was predicted against
//!   what was observed, and the error statistics over a window.
//!
//! # Example
//! ```
//! use calibration::{CalibrationParams, CalibrationState, InMemoryStore};
//! use cost_model::FactorSource;
//! use op_graph::OpKind;
//! use std::sync::Arc;
//!
//! let state = CalibrationState::open(Arc::new(InMemoryStore::new()), CalibrationParams::default()).unwrap();
//! assert_eq!(state.snapshot().efficiency(OpKind::GraphConv), 0.5);
//! ```

mod error;
mod factor;
mod record;
mod snapshot;
mod state;
pub mod store;
mod update;

pub use error::CalibrationError;
pub use factor::{CalibrationKey, Factor, FactorEntry};
pub use record::{now_ms, relative_error, AccuracyStats, ExecutionRecord, Observation, PredictionError, DAY_MS};
pub use snapshot::CalibrationSnapshot;
pub use state::CalibrationState;
pub use store::journal::JournalStore;
pub use store::memory::InMemoryStore;
pub use store::{CalibrationStore, CommitBatch};
pub use update::{CalibrationParams, EmaRule};
