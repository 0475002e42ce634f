// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The closed operation taxonomy and per-node operation parameters.
//!
//! Every node in a [`crate::ComputationGraph`] carries an [`OpKind`]. The
//! taxonomy is deliberately closed: anything the builder or a manifest
//! cannot classify becomes [`OpKind::Unknown`], which the cost model prices
//! with a conservative O(n) fallback instead of failing.

/// The kind of computation an operation node performs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    /// Batch materialisation (host-to-device copy of the input tensor).
    Input,
    /// Dense / fully-connected linear projection.
    Dense,
    /// Spatial graph convolution over a skeleton graph (`[N, C, T, V, M]`).
    GraphConv,
    /// Prototype matching between features and learned class prototypes.
    PrototypeMatching,
    /// 2-D convolution (`[N, C, H, W]`).
    Conv2d,
    /// A stage of bottleneck residual blocks (1×1 → 3×3 → 1×1).
    ResidualBlock,
    /// Multi-head self-attention (QKV projection, scores, output projection).
    MultiHeadAttention,
    /// Transformer feed-forward block (two dense projections).
    FeedForward,
    /// Embedding table lookup.
    Embedding,
    /// Elementwise activation (ReLU, GELU, tanh, softmax, ...).
    Activation,
    /// Max / average / adaptive pooling.
    Pooling,
    /// Batch / layer normalization.
    Normalization,
    /// Anything outside the taxonomy.
    Unknown,
}

impl OpKind {
    /// Every kind in the taxonomy, in declaration order.
    pub const ALL: [OpKind; 13] = [
        OpKind::Input,
        OpKind::Dense,
        OpKind::GraphConv,
        OpKind::PrototypeMatching,
        OpKind::Conv2d,
        OpKind::ResidualBlock,
        OpKind::MultiHeadAttention,
        OpKind::FeedForward,
        OpKind::Embedding,
        OpKind::Activation,
        OpKind::Pooling,
        OpKind::Normalization,
        OpKind::Unknown,
    ];

    /// Parses an operation name, accepting the spellings produced by common
    /// frameworks and by the descriptor classifier (`"linear"`, `"gcn"`,
    /// `"relu"`, `"batchnorm"`, ...). Returns `None` for unrecognised names.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        let kind = match normalized.as_str() {
            "input" | "data" | "placeholder" => Self::Input,
            "dense" | "linear" | "fc" | "fully_connected" | "classifier" | "lm_head" => {
                Self::Dense
            }
            "graph_conv" | "gcn" | "graph_convolution" | "st_gcn" => Self::GraphConv,
            "prototype_matching" | "prototype_learning" | "prototype" => {
                Self::PrototypeMatching
            }
            "conv2d" | "conv" | "convolution" => Self::Conv2d,
            "residual_block" | "resnet_block" | "bottleneck" | "res_block" => Self::ResidualBlock,
            "multi_head_attention" | "attention" | "self_attention" | "mha" | "attn" => {
                Self::MultiHeadAttention
            }
            "feed_forward" | "feedforward" | "ffn" | "mlp" => Self::FeedForward,
            "embedding" | "embed" | "wte" => Self::Embedding,
            "activation" | "relu" | "gelu" | "tanh" | "sigmoid" | "silu" | "softmax" => {
                Self::Activation
            }
            "pooling" | "pool" | "max_pool2d" | "avg_pool2d" | "adaptive_avg_pool2d"
            | "maxpool" | "avgpool" => Self::Pooling,
            "normalization" | "batchnorm" | "batch_norm" | "layernorm" | "layer_norm"
            | "groupnorm" | "ln" | "bn" => Self::Normalization,
            "unknown" => Self::Unknown,
            _ => return None,
        };
        Some(kind)
    }

    /// Like [`OpKind::from_str_loose`], but maps unrecognised names to
    /// [`OpKind::Unknown`].
    pub fn parse_or_unknown(s: &str) -> Self {
        Self::from_str_loose(s).unwrap_or_else(|| {
            tracing::debug!("operation '{s}' is outside the taxonomy, using fallback cost");
            Self::Unknown
        })
    }

    /// Returns the canonical snake_case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Dense => "dense",
            Self::GraphConv => "graph_conv",
            Self::PrototypeMatching => "prototype_matching",
            Self::Conv2d => "conv2d",
            Self::ResidualBlock => "residual_block",
            Self::MultiHeadAttention => "multi_head_attention",
            Self::FeedForward => "feed_forward",
            Self::Embedding => "embedding",
            Self::Activation => "activation",
            Self::Pooling => "pooling",
            Self::Normalization => "normalization",
            Self::Unknown => "unknown",
        }
    }

    /// Fraction of peak throughput this kind typically reaches before any
    /// calibration has been recorded.
    ///
    /// Matmul-shaped kernels sit near the top, bandwidth-starved elementwise
    /// kernels near the bottom. Always in `(0, 1]`.
    pub fn default_efficiency(&self) -> f64 {
        match self {
            Self::Input => 1.0,
            Self::Dense | Self::FeedForward => 0.9,
            Self::Conv2d | Self::ResidualBlock => 0.8,
            Self::MultiHeadAttention => 0.6,
            Self::GraphConv | Self::PrototypeMatching | Self::Normalization | Self::Unknown => 0.5,
            Self::Pooling => 0.4,
            Self::Embedding | Self::Activation => 0.3,
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional operation parameters.
///
/// Only the fields relevant to a node's [`OpKind`] are populated; the cost
/// model derives anything missing from the node's shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct OpParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_channels: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_channels: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_features: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_features: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stride: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<usize>,
    /// Number of residual blocks in a stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_blocks: Option<usize>,
    /// Bottleneck channel triple `[in, mid, out]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<[usize; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_heads: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_prototypes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_dim: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocab_size: Option<usize>,
}

impl OpParams {
    /// Returns `true` if no parameter is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_loose_aliases() {
        assert_eq!(OpKind::from_str_loose("linear"), Some(OpKind::Dense));
        assert_eq!(OpKind::from_str_loose("Graph-Conv"), Some(OpKind::GraphConv));
        assert_eq!(
            OpKind::from_str_loose("prototype_learning"),
            Some(OpKind::PrototypeMatching)
        );
        assert_eq!(OpKind::from_str_loose("resnet_block"), Some(OpKind::ResidualBlock));
        assert_eq!(
            OpKind::from_str_loose("multi_head_attention"),
            Some(OpKind::MultiHeadAttention)
        );
        assert_eq!(OpKind::from_str_loose("GELU"), Some(OpKind::Activation));
        assert_eq!(OpKind::from_str_loose("adaptive_avg_pool2d"), Some(OpKind::Pooling));
        assert_eq!(OpKind::from_str_loose("batchnorm"), Some(OpKind::Normalization));
        assert_eq!(OpKind::from_str_loose("lstm_cell"), None);
    }

    #[test]
    fn test_parse_or_unknown() {
        assert_eq!(OpKind::parse_or_unknown("lstm_cell"), OpKind::Unknown);
        assert_eq!(OpKind::parse_or_unknown("fc"), OpKind::Dense);
    }

    #[test]
    fn test_labels_roundtrip_through_loose_parser() {
        for kind in OpKind::ALL {
            assert_eq!(OpKind::from_str_loose(kind.as_str()), Some(kind), "{kind}");
        }
    }

    #[test]
    fn test_default_efficiency_in_range() {
        for kind in OpKind::ALL {
            let e = kind.default_efficiency();
            assert!(e > 0.0 && e <= 1.0, "{kind}: {e}");
        }
    }

    #[test]
    fn test_params_serialize_sparse() {
        let p = OpParams {
            in_channels: Some(3),
            out_channels: Some(64),
            ..Default::default()
        };
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"in_channels":3,"out_channels":64}"#);
        assert!(OpParams::default().is_empty());
        assert!(!p.is_empty());
    }
}
