// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph construction and manifest loading.

/// Errors that can occur when building or loading a computation graph.
///
/// Descriptor-driven graphs never produce these: the templates are valid by
/// construction. They surface only for hand-written graph manifests.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The manifest file could not be read.
    #[error("failed to read graph manifest: {0}")]
    ManifestReadError(#[from] std::io::Error),

    /// The manifest JSON is malformed.
    #[error("failed to parse graph manifest: {0}")]
    ManifestParseError(#[from] serde_json::Error),

    /// A node definition is invalid (e.g. a zero-element shape).
    #[error("invalid node '{node}': {detail}")]
    InvalidNode { node: String, detail: String },

    /// The graph structure violates a DAG invariant.
    #[error("invalid computation graph: {0}")]
    InvalidGraph(String),
}
