// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # op-graph
//!
//! Typed operation graphs for training-cost estimation.
//!
//! A training job arrives as a loosely-filled [`ModelDescriptor`]. This crate
//! turns it into a [`ComputationGraph`] of typed operations whose shapes the
//! cost model can price in closed form:
//!
//! - [`Shape`] / [`DType`] — activation dimensions and element type.
//! - [`OpKind`] / [`OpParams`] — the closed operation taxonomy.
//! - [`ModelDescriptor`] — the job description, with defaults and a stable
//!   fingerprint.
//! - [`ComputationGraph`] — the DAG, with a **type-state pattern**
//!   (`Loaded` → `Validated`).
//! - [`GraphBuilder`] — descriptor → graph via [`ArchitectureTemplate`]s.
//! - [`GraphManifest`] — hand-written JSON graphs.
//!
//! # Example
//! ```
//! use op_graph::{GraphBuilder, ModelDescriptor, ModelType};
//!
//! let descriptor = ModelDescriptor::new(ModelType::GraphConvPose).with_batch_size(16);
//! let graph = GraphBuilder::build(&descriptor);
//! println!("{}", graph.summary());
//! for node in graph.iter_nodes() {
//!     println!("  {}", node.summary());
//! }
//! ```

pub mod builder;
mod descriptor;
mod error;
pub mod graph;
pub mod manifest;
mod op;
mod shape;

pub use builder::{ArchitectureTemplate, GraphBuilder};
pub use descriptor::{ModelDescriptor, ModelType, DEFAULT_BATCH_SIZE, DEFAULT_EPOCHS};
pub use error::GraphError;
pub use graph::{ComputationGraph, Edge, Loaded, OperationNode, Validated};
pub use manifest::GraphManifest;
pub use op::{OpKind, OpParams};
pub use shape::{DType, Shape};
