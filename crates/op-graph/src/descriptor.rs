// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model descriptors: the structured summary of a training job that the
//! estimator receives from an upstream classifier.
//!
//! Every field is optional. Accessors on [`ModelDescriptor`] resolve missing
//! values to documented defaults so that an incomplete descriptor only
//! produces a coarser estimate, never an error.

use std::fmt;

/// Default mini-batch size when the descriptor does not specify one.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Default number of training epochs.
pub const DEFAULT_EPOCHS: usize = 100;

/// Architecture family reported by the upstream classifier.
///
/// Parsing is loose: case-insensitive, with common aliases. Anything
/// unrecognised becomes [`ModelType::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelType {
    /// Skeleton-based action recognition with graph convolutions.
    GraphConvPose,
    /// Bottleneck residual convolutional network.
    ResidualCnn,
    /// Transformer encoder stack.
    Transformer,
    /// Plain convolutional network (including detectors such as YOLO).
    Convolutional,
    /// Recurrent network (LSTM / GRU / RNN).
    Recurrent,
    /// Multi-layer perceptron.
    Mlp,
    #[default]
    Unknown,
}

impl ModelType {
    /// Parses a model type name, accepting common aliases.
    pub fn from_str_loose(s: &str) -> Self {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "graph_conv_pose" | "protogcn" | "proto_gcn" | "stgcn" | "st_gcn" | "gcn"
            | "ctrgcn" => Self::GraphConvPose,
            "residual_cnn" | "resnet" | "resnet50" | "resnet101" | "resnext" => Self::ResidualCnn,
            "transformer" | "bert" | "vit" | "gpt" | "transformer_encoder" => Self::Transformer,
            "cnn" | "conv" | "convnet" | "vgg" | "yolo" | "alexnet" => Self::Convolutional,
            "lstm" | "rnn" | "gru" | "recurrent" => Self::Recurrent,
            "mlp" | "dnn" | "feedforward" => Self::Mlp,
            _ => Self::Unknown,
        }
    }

    /// Returns the canonical snake_case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GraphConvPose => "graph_conv_pose",
            Self::ResidualCnn => "residual_cnn",
            Self::Transformer => "transformer",
            Self::Convolutional => "cnn",
            Self::Recurrent => "rnn",
            Self::Mlp => "mlp",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for ModelType {
    fn from(s: String) -> Self {
        Self::from_str_loose(&s)
    }
}

impl From<ModelType> for String {
    fn from(t: ModelType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured description of a training job.
///
/// # Example
/// ```
/// use op_graph::{ModelDescriptor, ModelType};
///
/// let d: ModelDescriptor =
///     serde_json::from_str(r#"{"model_type": "ProtoGCN", "batch_size": 16}"#).unwrap();
/// assert_eq!(d.model_type, ModelType::GraphConvPose);
/// assert_eq!(d.batch_size(), 16);
/// assert_eq!(d.epochs(), 100);
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ModelDescriptor {
    pub model_type: ModelType,
    pub framework: Option<String>,
    pub batch_size: Option<usize>,
    pub learning_rate: Option<f64>,
    pub epochs: Option<usize>,
    pub optimizer: Option<String>,
    pub dataset: Option<String>,
    pub num_classes: Option<usize>,
    /// Free-form per-sample input shape, e.g. `"3x224x224"`.
    pub input_shape: Option<String>,
    /// Free-form architecture hint, e.g. `"3-layer CNN with 64, 128, 256 channels"`.
    pub architecture_detail: Option<String>,
}

impl ModelDescriptor {
    /// Creates a descriptor with only the model type set.
    pub fn new(model_type: ModelType) -> Self {
        Self {
            model_type,
            ..Default::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_num_classes(mut self, num_classes: usize) -> Self {
        self.num_classes = Some(num_classes);
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = Some(epochs);
        self
    }

    pub fn with_optimizer(mut self, optimizer: impl Into<String>) -> Self {
        self.optimizer = Some(optimizer.into());
        self
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn with_input_shape(mut self, input_shape: impl Into<String>) -> Self {
        self.input_shape = Some(input_shape.into());
        self
    }

    pub fn with_architecture_detail(mut self, detail: impl Into<String>) -> Self {
        self.architecture_detail = Some(detail.into());
        self
    }

    /// Effective batch size (default 32, never zero).
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1)
    }

    /// Effective epoch count (default 100, never zero).
    pub fn epochs(&self) -> usize {
        self.epochs.unwrap_or(DEFAULT_EPOCHS).max(1)
    }

    /// Parses `input_shape` into per-sample dimensions.
    ///
    /// Accepts `x`, `×`, `,` and whitespace separators with optional
    /// brackets. Dimensions are kept in the order given. Returns `None` for
    /// absent or malformed strings, or if any dimension is zero.
    pub fn parsed_input_shape(&self) -> Option<Vec<usize>> {
        let raw = self.input_shape.as_deref()?;
        let dims: Option<Vec<usize>> = raw
            .trim()
            .trim_matches(|c: char| matches!(c, '[' | ']' | '(' | ')'))
            .split(|c: char| matches!(c, 'x' | 'X' | '×' | ',') || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<usize>().ok().filter(|&d| d > 0))
            .collect();
        match dims {
            Some(dims) if !dims.is_empty() => Some(dims),
            _ => {
                tracing::debug!("ignoring unparseable input_shape '{raw}'");
                None
            }
        }
    }

    /// Stable identifier for this descriptor: the first 16 hex characters
    /// of the blake3 hash of its canonical JSON encoding.
    pub fn fingerprint(&self) -> String {
        // Plain struct with string keys; encoding cannot fail.
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let hash = blake3::hash(&canonical);
        hash.to_hex()[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_aliases() {
        assert_eq!(ModelType::from_str_loose("ProtoGCN"), ModelType::GraphConvPose);
        assert_eq!(ModelType::from_str_loose("graph_conv_pose"), ModelType::GraphConvPose);
        assert_eq!(ModelType::from_str_loose("ResNet"), ModelType::ResidualCnn);
        assert_eq!(ModelType::from_str_loose("bert"), ModelType::Transformer);
        assert_eq!(ModelType::from_str_loose("yolo"), ModelType::Convolutional);
        assert_eq!(ModelType::from_str_loose("LSTM"), ModelType::Recurrent);
        assert_eq!(ModelType::from_str_loose("diffusion"), ModelType::Unknown);
    }

    #[test]
    fn test_missing_fields_default() {
        let d: ModelDescriptor = serde_json::from_str("{}").unwrap();
        assert_eq!(d.model_type, ModelType::Unknown);
        assert_eq!(d.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(d.epochs(), DEFAULT_EPOCHS);
        assert!(d.parsed_input_shape().is_none());
    }

    #[test]
    fn test_zero_batch_is_clamped() {
        let d = ModelDescriptor::new(ModelType::Mlp).with_batch_size(0).with_epochs(0);
        assert_eq!(d.batch_size(), 1);
        assert_eq!(d.epochs(), 1);
    }

    #[test]
    fn test_model_type_serializes_canonical() {
        let d = ModelDescriptor::new(ModelType::from_str_loose("protogcn"));
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains(r#""model_type":"graph_conv_pose""#), "{json}");
    }

    #[test]
    fn test_parse_input_shape_forms() {
        let parse = |s: &str| ModelDescriptor::default().with_input_shape(s).parsed_input_shape();
        assert_eq!(parse("3x224x224"), Some(vec![3, 224, 224]));
        assert_eq!(parse("[3, 224, 224]"), Some(vec![3, 224, 224]));
        assert_eq!(parse("224,224,3"), Some(vec![224, 224, 3]));
        assert_eq!(parse("(1 28 28)"), Some(vec![1, 28, 28]));
        assert_eq!(parse("large images"), None);
        assert_eq!(parse("3x0x224"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_fingerprint_stable_and_distinct() {
        let a = ModelDescriptor::new(ModelType::ResidualCnn).with_batch_size(64);
        let b = a.clone();
        let c = a.clone().with_batch_size(32);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }
}
