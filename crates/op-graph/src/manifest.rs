// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON graph manifests.
//!
//! A manifest describes an arbitrary computation graph directly, for
//! workloads that none of the architecture templates fit.
//!
//! # Format
//! ```json
//! {
//!   "name": "two-layer-mlp",
//!   "dtype": "f16",
//!   "nodes": [
//!     { "id": "x",   "operation": "input",  "input_shape": [32, 784], "output_shape": [32, 784] },
//!     { "id": "fc1", "operation": "linear", "input_shape": [32, 784], "output_shape": [32, 128],
//!       "parameters": { "in_features": 784, "out_features": 128 } }
//!   ],
//!   "edges": [ { "from": "x", "to": "fc1" } ]
//! }
//! ```
//!
//! Operation strings are parsed loosely; anything outside the taxonomy
//! becomes [`OpKind::Unknown`].

use crate::graph::{ComputationGraph, Edge, OperationNode, Validated};
use crate::{DType, GraphError, OpKind, OpParams, Shape};
use std::path::Path;

/// Top-level graph manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GraphManifest {
    #[serde(default = "default_name")]
    pub name: String,
    /// Element type label (e.g. `"f32"`, `"bf16"`).
    #[serde(default = "default_dtype")]
    pub dtype: String,
    pub nodes: Vec<ManifestNode>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

fn default_name() -> String {
    "manifest".to_string()
}

fn default_dtype() -> String {
    "f32".to_string()
}

/// A single node entry in the manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestNode {
    pub id: String,
    /// Operation name (e.g. `"conv2d"`, `"gelu"`, `"resnet_block"`).
    pub operation: String,
    pub input_shape: Vec<usize>,
    pub output_shape: Vec<usize>,
    #[serde(default)]
    pub parameters: OpParams,
}

impl GraphManifest {
    /// Loads a manifest from a JSON file path.
    pub fn from_file(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Converts the manifest into a validated computation graph.
    pub fn into_graph(self) -> Result<ComputationGraph<Validated>, GraphError> {
        let dtype = DType::parse(&self.dtype).ok_or_else(|| {
            GraphError::InvalidGraph(format!("unsupported dtype '{}'", self.dtype))
        })?;

        let nodes = self
            .nodes
            .into_iter()
            .map(|n| {
                OperationNode::new(
                    n.id,
                    OpKind::parse_or_unknown(&n.operation),
                    Shape::new(n.input_shape),
                    Shape::new(n.output_shape),
                )
                .with_params(n.parameters)
            })
            .collect();

        let graph = ComputationGraph::new(self.name, nodes, self.edges)
            .with_dtype(dtype)
            .validate()?;
        tracing::debug!("loaded manifest graph: {}", graph.summary());
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MLP: &str = r#"{
        "name": "tiny",
        "nodes": [
            { "id": "x",   "operation": "input",  "input_shape": [8, 16], "output_shape": [8, 16] },
            { "id": "fc",  "operation": "linear", "input_shape": [8, 16], "output_shape": [8, 4],
              "parameters": { "in_features": 16, "out_features": 4 } },
            { "id": "act", "operation": "mish",   "input_shape": [8, 4],  "output_shape": [8, 4] }
        ],
        "edges": [ { "from": "x", "to": "fc" }, { "from": "fc", "to": "act" } ]
    }"#;

    #[test]
    fn test_manifest_into_graph() {
        let g = GraphManifest::from_json(MLP).unwrap().into_graph().unwrap();
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.dtype, DType::F32);
        assert_eq!(g.node("fc").unwrap().kind, OpKind::Dense);
        assert_eq!(g.node("fc").unwrap().params.out_features, Some(4));
        // Outside the taxonomy, but still accepted.
        assert_eq!(g.node("act").unwrap().kind, OpKind::Unknown);
    }

    #[test]
    fn test_manifest_bad_dtype() {
        let json = MLP.replace(r#""name": "tiny","#, r#""name": "tiny", "dtype": "int4","#);
        let err = GraphManifest::from_json(&json).unwrap().into_graph().unwrap_err();
        assert!(err.to_string().contains("int4"));
    }

    #[test]
    fn test_manifest_dangling_edge() {
        let json = MLP.replace(r#""to": "act""#, r#""to": "softmax""#);
        let result = GraphManifest::from_json(&json).unwrap().into_graph();
        assert!(matches!(result, Err(GraphError::InvalidGraph(_))));
    }

    #[test]
    fn test_manifest_malformed_json() {
        assert!(matches!(
            GraphManifest::from_json("{ nodes: "),
            Err(GraphError::ManifestParseError(_))
        ));
    }

    #[test]
    fn test_manifest_missing_file() {
        let result = GraphManifest::from_file(Path::new("/nonexistent/graph.json"));
        assert!(matches!(result, Err(GraphError::ManifestReadError(_))));
    }
}
