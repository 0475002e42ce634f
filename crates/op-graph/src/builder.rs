// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Descriptor → computation graph.
//!
//! A closed set of [`ArchitectureTemplate`]s covers the architecture
//! families the upstream classifier reports. Everything else goes through
//! the generic template, which reads the free-form architecture hint.
//!
//! The builder is deterministic: identical descriptors produce identical
//! graphs (same node ids, kinds, shapes and edges), which the calibration
//! engine relies on when it apportions observed time across kinds.

use crate::graph::{ComputationGraph, Loaded, OperationNode, Validated};
use crate::{ModelDescriptor, ModelType, OpKind, OpParams, Shape};
use std::fmt;

/// The architecture family used to decompose a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchitectureTemplate {
    /// Skeleton graph convolutions followed by prototype matching.
    GraphConvPose,
    /// Bottleneck residual CNN (ResNet-50 layout).
    ResidualCnn,
    /// BERT-base style transformer encoder stack.
    TransformerEncoder,
    /// Shape inferred from the architecture hint.
    Generic,
}

impl ArchitectureTemplate {
    /// Selects the template for a descriptor.
    pub fn select(descriptor: &ModelDescriptor) -> Self {
        match descriptor.model_type {
            ModelType::GraphConvPose => Self::GraphConvPose,
            ModelType::ResidualCnn => Self::ResidualCnn,
            ModelType::Transformer => Self::TransformerEncoder,
            ModelType::Convolutional | ModelType::Recurrent | ModelType::Mlp | ModelType::Unknown => {
                Self::Generic
            }
        }
    }

    /// Number of output classes assumed when the descriptor has none.
    pub fn default_num_classes(&self) -> usize {
        match self {
            Self::GraphConvPose => 60,
            Self::ResidualCnn => 1000,
            Self::TransformerEncoder => 2,
            Self::Generic => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GraphConvPose => "graph_conv_pose",
            Self::ResidualCnn => "residual_cnn",
            Self::TransformerEncoder => "transformer_encoder",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for ArchitectureTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds validated computation graphs from model descriptors.
pub struct GraphBuilder;

impl GraphBuilder {
    /// Builds the computation graph for `descriptor`.
    ///
    /// Never fails: missing fields resolve to template defaults and an
    /// unrecognised family falls back to the generic template.
    pub fn build(descriptor: &ModelDescriptor) -> ComputationGraph<Validated> {
        let template = ArchitectureTemplate::select(descriptor);
        let batch = descriptor.batch_size();
        let classes = descriptor
            .num_classes
            .unwrap_or_else(|| template.default_num_classes())
            .max(1);
        let input = descriptor.parsed_input_shape();

        let graph = match template {
            ArchitectureTemplate::GraphConvPose => build_graph_conv_pose(batch, classes, input),
            ArchitectureTemplate::ResidualCnn => build_residual_cnn(batch, classes, input),
            ArchitectureTemplate::TransformerEncoder => {
                build_transformer(template.as_str(), TransformerDims::base(), batch, classes, input)
            }
            ArchitectureTemplate::Generic => build_generic(descriptor, batch, classes, input),
        };

        tracing::debug!(
            "built {} graph with {} nodes (batch {batch}, classes {classes})",
            template,
            graph.num_nodes()
        );

        match graph.validate() {
            Ok(g) => g,
            Err(e) => {
                // Unreachable for the built-in templates; degrade rather than fail.
                tracing::warn!("template graph failed validation ({e}), using single-node fallback");
                ComputationGraph::single_node(
                    template.as_str(),
                    OperationNode::new(
                        "fallback",
                        OpKind::Unknown,
                        Shape::matrix(batch, 1),
                        Shape::matrix(batch, 1),
                    ),
                )
            }
        }
    }
}

// ── Chain assembly ─────────────────────────────────────────────────

/// Accumulates a linear chain of nodes, threading each node's output shape
/// into the next node's input.
struct Chain {
    batch: usize,
    nodes: Vec<OperationNode>,
    current: Shape,
}

impl Chain {
    fn start(batch: usize, sample: &[usize]) -> Self {
        let shape = batched(batch, sample);
        let input = OperationNode::new("input", OpKind::Input, shape.clone(), shape.clone());
        Self {
            batch,
            nodes: vec![input],
            current: shape,
        }
    }

    /// Appends a node producing `sample_out` (per-sample dims).
    fn push(&mut self, id: impl Into<String>, kind: OpKind, sample_out: &[usize], params: OpParams) {
        self.push_shaped(id, kind, batched(self.batch, sample_out), params);
    }

    /// Appends a node whose input is the current activation reshaped to
    /// `sample_in` (e.g. a flatten before a classifier).
    fn push_reshaped(
        &mut self,
        id: impl Into<String>,
        kind: OpKind,
        sample_in: &[usize],
        sample_out: &[usize],
        params: OpParams,
    ) {
        self.current = batched(self.batch, sample_in);
        self.push(id, kind, sample_out, params);
    }

    fn push_shaped(&mut self, id: impl Into<String>, kind: OpKind, out: Shape, params: OpParams) {
        let node = OperationNode::new(id, kind, self.current.clone(), out.clone()).with_params(params);
        self.nodes.push(node);
        self.current = out;
    }

    fn finish(self, name: &str) -> ComputationGraph<Loaded> {
        ComputationGraph::chain(name, self.nodes)
    }
}

fn batched(batch: usize, sample: &[usize]) -> Shape {
    let mut dims = Vec::with_capacity(sample.len() + 1);
    dims.push(batch);
    dims.extend_from_slice(sample);
    Shape::new(dims)
}

/// Output size of a strided window along one spatial axis. Saturates
/// instead of overflowing on very large inputs.
fn window_out(size: usize, kernel: usize, stride: usize, padding: usize) -> usize {
    let padded = size.saturating_add(padding.saturating_mul(2));
    (padded.saturating_sub(kernel) / stride.max(1)).saturating_add(1).max(1)
}

fn dense(in_features: usize, out_features: usize) -> OpParams {
    OpParams {
        in_features: Some(in_features),
        out_features: Some(out_features),
        ..Default::default()
    }
}

fn conv(in_channels: usize, out_channels: usize, kernel: usize, stride: usize, padding: usize) -> OpParams {
    OpParams {
        in_channels: Some(in_channels),
        out_channels: Some(out_channels),
        kernel_size: Some(kernel),
        stride: Some(stride),
        padding: Some(padding),
        ..Default::default()
    }
}

// ── Templates ──────────────────────────────────────────────────────

const POSE_SAMPLE: [usize; 4] = [3, 300, 25, 2];
const POSE_CHANNELS: [usize; 3] = [64, 128, 256];

/// `[N, C, T, V, M]` input → 3 graph convolutions → prototype matching →
/// linear classifier.
fn build_graph_conv_pose(batch: usize, classes: usize, input: Option<Vec<usize>>) -> ComputationGraph<Loaded> {
    let sample = match input {
        Some(dims) if dims.len() == 4 => dims,
        _ => POSE_SAMPLE.to_vec(),
    };
    let (t, v, m) = (sample[1], sample[2], sample[3]);
    let mut chain = Chain::start(batch, &sample);

    let mut in_channels = sample[0];
    for (i, &out_channels) in POSE_CHANNELS.iter().enumerate() {
        let params = OpParams {
            in_channels: Some(in_channels),
            out_channels: Some(out_channels),
            ..Default::default()
        };
        chain.push(format!("gcn_{}", i + 1), OpKind::GraphConv, &[out_channels, t, v, m], params);
        in_channels = out_channels;
    }

    let feature_dim = in_channels;
    chain.push(
        "prototype",
        OpKind::PrototypeMatching,
        &[classes, feature_dim],
        OpParams {
            num_prototypes: Some(classes),
            feature_dim: Some(feature_dim),
            ..Default::default()
        },
    );
    let flat = classes.saturating_mul(feature_dim);
    chain.push_reshaped("classifier", OpKind::Dense, &[flat], &[classes], dense(flat, classes));
    chain.finish(ArchitectureTemplate::GraphConvPose.as_str())
}

const IMAGE_SAMPLE: [usize; 3] = [3, 224, 224];

/// `(blocks, [in, mid, out], stride)` for each ResNet-50 stage.
const RESIDUAL_STAGES: [(usize, [usize; 3], usize); 4] = [
    (3, [64, 64, 256], 1),
    (4, [256, 128, 512], 2),
    (6, [512, 256, 1024], 2),
    (3, [1024, 512, 2048], 2),
];

/// Stem (7×7/2 conv, norm, ReLU, 3×3/2 max pool) → 4 bottleneck stages →
/// global average pool → linear.
fn build_residual_cnn(batch: usize, classes: usize, input: Option<Vec<usize>>) -> ComputationGraph<Loaded> {
    let sample = match input {
        Some(dims) if dims.len() == 3 => dims,
        _ => IMAGE_SAMPLE.to_vec(),
    };
    let (c, mut h, mut w) = (sample[0], sample[1], sample[2]);
    let mut chain = Chain::start(batch, &sample);

    h = window_out(h, 7, 2, 3);
    w = window_out(w, 7, 2, 3);
    chain.push("conv1", OpKind::Conv2d, &[64, h, w], conv(c, 64, 7, 2, 3));
    chain.push("bn1", OpKind::Normalization, &[64, h, w], OpParams::default());
    chain.push("relu", OpKind::Activation, &[64, h, w], OpParams::default());
    h = window_out(h, 3, 2, 1);
    w = window_out(w, 3, 2, 1);
    chain.push(
        "maxpool",
        OpKind::Pooling,
        &[64, h, w],
        OpParams {
            kernel_size: Some(3),
            stride: Some(2),
            padding: Some(1),
            ..Default::default()
        },
    );

    let mut channels = 64;
    for (i, &(blocks, triple, stride)) in RESIDUAL_STAGES.iter().enumerate() {
        h = h.div_ceil(stride);
        w = w.div_ceil(stride);
        let params = OpParams {
            num_blocks: Some(blocks),
            channels: Some(triple),
            in_channels: Some(channels),
            out_channels: Some(triple[2]),
            stride: Some(stride),
            ..Default::default()
        };
        chain.push(format!("layer{}", i + 1), OpKind::ResidualBlock, &[triple[2], h, w], params);
        channels = triple[2];
    }

    chain.push("avgpool", OpKind::Pooling, &[channels, 1, 1], OpParams::default());
    chain.push_reshaped("fc", OpKind::Dense, &[channels], &[classes], dense(channels, classes));
    chain.finish(ArchitectureTemplate::ResidualCnn.as_str())
}

/// Dimensions of a transformer encoder stack.
#[derive(Debug, Clone, Copy)]
struct TransformerDims {
    seq_len: usize,
    hidden: usize,
    heads: usize,
    layers: usize,
    intermediate: usize,
    vocab: usize,
}

impl TransformerDims {
    /// BERT-base.
    fn base() -> Self {
        Self {
            seq_len: 512,
            hidden: 768,
            heads: 12,
            layers: 12,
            intermediate: 3072,
            vocab: 30_522,
        }
    }

    /// Two-layer encoder used when only a hint mentions attention.
    fn small() -> Self {
        Self {
            seq_len: 128,
            hidden: 256,
            heads: 4,
            layers: 2,
            intermediate: 1024,
            vocab: 30_522,
        }
    }
}

/// Token input → embedding → L × (norm → attention → norm → feed-forward)
/// → pooled linear head.
fn build_transformer(
    name: &str,
    mut dims: TransformerDims,
    batch: usize,
    classes: usize,
    input: Option<Vec<usize>>,
) -> ComputationGraph<Loaded> {
    if let Some(&seq_len) = input.as_deref().and_then(|d| d.first()) {
        dims.seq_len = seq_len;
    }
    let TransformerDims {
        seq_len: s,
        hidden: h,
        ..
    } = dims;
    let mut chain = Chain::start(batch, &[s]);

    chain.push(
        "embedding",
        OpKind::Embedding,
        &[s, h],
        OpParams {
            vocab_size: Some(dims.vocab),
            hidden_size: Some(h),
            ..Default::default()
        },
    );
    for i in 0..dims.layers {
        chain.push(format!("ln_attn_{i}"), OpKind::Normalization, &[s, h], OpParams::default());
        chain.push(
            format!("attention_{i}"),
            OpKind::MultiHeadAttention,
            &[s, h],
            OpParams {
                num_heads: Some(dims.heads),
                hidden_size: Some(h),
                ..Default::default()
            },
        );
        chain.push(format!("ln_ffn_{i}"), OpKind::Normalization, &[s, h], OpParams::default());
        chain.push(
            format!("ffn_{i}"),
            OpKind::FeedForward,
            &[s, h],
            OpParams {
                hidden_size: Some(h),
                intermediate_size: Some(dims.intermediate),
                ..Default::default()
            },
        );
    }
    chain.push("pooler", OpKind::Pooling, &[h], OpParams::default());
    chain.push("classifier", OpKind::Dense, &[classes], dense(h, classes));
    chain.finish(name)
}

const SMALL_IMAGE_SAMPLE: [usize; 3] = [3, 32, 32];
const CONV_STACK: [usize; 3] = [64, 128, 256];
const SEQUENCE_SAMPLE: [usize; 2] = [100, 128];
const RECURRENT_HIDDEN: usize = 256;
const MLP_INPUT: usize = 512;

/// Which shape the generic template takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GenericShape {
    ConvStack,
    SmallEncoder,
    Recurrent,
    Mlp,
}

impl GenericShape {
    fn infer(descriptor: &ModelDescriptor) -> Self {
        match descriptor.model_type {
            ModelType::Convolutional => return Self::ConvStack,
            ModelType::Recurrent => return Self::Recurrent,
            ModelType::Mlp => return Self::Mlp,
            _ => {}
        }
        let hint = descriptor
            .architecture_detail
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        if hint.contains("cnn") || hint.contains("conv") {
            Self::ConvStack
        } else if hint.contains("transformer") || hint.contains("attention") {
            Self::SmallEncoder
        } else if hint.contains("lstm") || hint.contains("rnn") || hint.contains("gru") {
            Self::Recurrent
        } else {
            Self::Mlp
        }
    }
}

fn build_generic(
    descriptor: &ModelDescriptor,
    batch: usize,
    classes: usize,
    input: Option<Vec<usize>>,
) -> ComputationGraph<Loaded> {
    let name = ArchitectureTemplate::Generic.as_str();
    let shape = GenericShape::infer(descriptor);
    tracing::debug!("generic template resolved to {shape:?}");

    match shape {
        GenericShape::ConvStack => {
            let sample = match input {
                Some(dims) if dims.len() == 3 => dims,
                _ => SMALL_IMAGE_SAMPLE.to_vec(),
            };
            let (mut c, h, w) = (sample[0], sample[1], sample[2]);
            let mut chain = Chain::start(batch, &sample);
            for (i, &out) in CONV_STACK.iter().enumerate() {
                chain.push(format!("conv_{i}"), OpKind::Conv2d, &[out, h, w], conv(c, out, 3, 1, 1));
                chain.push(format!("relu_{i}"), OpKind::Activation, &[out, h, w], OpParams::default());
                c = out;
            }
            chain.push("pool", OpKind::Pooling, &[c, 1, 1], OpParams::default());
            chain.push_reshaped("fc", OpKind::Dense, &[c], &[classes], dense(c, classes));
            chain.finish(name)
        }
        GenericShape::SmallEncoder => build_transformer(name, TransformerDims::small(), batch, classes, input),
        GenericShape::Recurrent => {
            let sample = match input {
                Some(dims) if dims.len() == 2 => dims,
                _ => SEQUENCE_SAMPLE.to_vec(),
            };
            let (s, mut features) = (sample[0], sample[1]);
            let mut chain = Chain::start(batch, &sample);
            // Each recurrent layer is priced as its fused gate projection
            // plus the gate nonlinearities.
            for i in 0..2 {
                let gates = 4 * RECURRENT_HIDDEN;
                chain.push(format!("rnn_{i}_gates"), OpKind::Dense, &[s, gates], dense(features, gates));
                chain.push(format!("rnn_{i}_act"), OpKind::Activation, &[s, RECURRENT_HIDDEN], OpParams::default());
                features = RECURRENT_HIDDEN;
            }
            chain.push("last_step", OpKind::Pooling, &[features], OpParams::default());
            chain.push("fc", OpKind::Dense, &[classes], dense(features, classes));
            chain.finish(name)
        }
        GenericShape::Mlp => {
            let in_features = input
                .map(|dims| dims.iter().fold(1usize, |acc, &d| acc.saturating_mul(d)))
                .unwrap_or(MLP_INPUT);
            let mut chain = Chain::start(batch, &[in_features]);
            chain.push("fc_0", OpKind::Dense, &[512], dense(in_features, 512));
            chain.push("relu_0", OpKind::Activation, &[512], OpParams::default());
            chain.push("fc_1", OpKind::Dense, &[256], dense(512, 256));
            chain.push("relu_1", OpKind::Activation, &[256], OpParams::default());
            chain.push("fc_2", OpKind::Dense, &[classes], dense(256, classes));
            chain.finish(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(graph: &ComputationGraph<Validated>) -> Vec<String> {
        graph.iter_nodes().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn test_template_selection() {
        let pick = |t: &str| ArchitectureTemplate::select(&ModelDescriptor::new(ModelType::from_str_loose(t)));
        assert_eq!(pick("protogcn"), ArchitectureTemplate::GraphConvPose);
        assert_eq!(pick("resnet"), ArchitectureTemplate::ResidualCnn);
        assert_eq!(pick("bert"), ArchitectureTemplate::TransformerEncoder);
        assert_eq!(pick("yolo"), ArchitectureTemplate::Generic);
        assert_eq!(pick("???"), ArchitectureTemplate::Generic);
    }

    #[test]
    fn test_graph_conv_pose_structure() {
        let d = ModelDescriptor::new(ModelType::GraphConvPose)
            .with_batch_size(16)
            .with_num_classes(60);
        let g = GraphBuilder::build(&d);
        assert_eq!(
            ids(&g),
            vec!["input", "gcn_1", "gcn_2", "gcn_3", "prototype", "classifier"]
        );
        let input = g.node("input").unwrap();
        assert_eq!(input.output_shape.dims(), &[16, 3, 300, 25, 2]);
        let gcn3 = g.node("gcn_3").unwrap();
        assert_eq!(gcn3.output_shape.dims(), &[16, 256, 300, 25, 2]);
        let proto = g.node("prototype").unwrap();
        assert_eq!(proto.params.num_prototypes, Some(60));
        let fc = g.node("classifier").unwrap();
        assert_eq!(fc.input_shape.dims(), &[16, 60 * 256]);
        assert_eq!(fc.output_shape.dims(), &[16, 60]);
        assert_eq!(g.edges().len(), 5);
    }

    #[test]
    fn test_residual_cnn_spatial_sizes() {
        let g = GraphBuilder::build(&ModelDescriptor::new(ModelType::ResidualCnn));
        let size = |id: &str| g.node(id).unwrap().output_shape.dims().to_vec();
        assert_eq!(size("conv1"), vec![32, 64, 112, 112]);
        assert_eq!(size("maxpool"), vec![32, 64, 56, 56]);
        assert_eq!(size("layer1"), vec![32, 256, 56, 56]);
        assert_eq!(size("layer2"), vec![32, 512, 28, 28]);
        assert_eq!(size("layer3"), vec![32, 1024, 14, 14]);
        assert_eq!(size("layer4"), vec![32, 2048, 7, 7]);
        assert_eq!(size("fc"), vec![32, 1000]);
        assert_eq!(g.node("layer3").unwrap().params.num_blocks, Some(6));
    }

    #[test]
    fn test_residual_cnn_input_override() {
        let d = ModelDescriptor::new(ModelType::ResidualCnn).with_input_shape("[3, 128, 128]");
        let g = GraphBuilder::build(&d);
        assert_eq!(g.node("input").unwrap().output_shape.dims(), &[32, 3, 128, 128]);
        assert_eq!(g.node("conv1").unwrap().output_shape.dims(), &[32, 64, 64, 64]);
    }

    #[test]
    fn test_transformer_layers() {
        let g = GraphBuilder::build(&ModelDescriptor::new(ModelType::Transformer).with_batch_size(8));
        assert_eq!(g.num_nodes(), 2 + 12 * 4 + 2);
        assert_eq!(g.count_by_kind()[&OpKind::MultiHeadAttention], 12);
        let attn = g.node("attention_0").unwrap();
        assert_eq!(attn.input_shape.dims(), &[8, 512, 768]);
        assert_eq!(g.node("classifier").unwrap().output_shape.dims(), &[8, 2]);
    }

    #[test]
    fn test_generic_hints() {
        let cnn = GraphBuilder::build(
            &ModelDescriptor::default().with_architecture_detail("3-layer CNN with 64, 128, 256 channels"),
        );
        assert_eq!(cnn.count_by_kind()[&OpKind::Conv2d], 3);
        assert_eq!(cnn.node("fc").unwrap().output_shape.dims(), &[32, 10]);

        let enc = GraphBuilder::build(
            &ModelDescriptor::default().with_architecture_detail("small self-attention model"),
        );
        assert_eq!(enc.count_by_kind()[&OpKind::MultiHeadAttention], 2);

        let rnn = GraphBuilder::build(&ModelDescriptor::new(ModelType::Recurrent));
        assert!(rnn.node("rnn_1_gates").is_some());

        let mlp = GraphBuilder::build(&ModelDescriptor::default());
        assert_eq!(mlp.count_by_kind()[&OpKind::Dense], 3);
        assert_eq!(mlp.name, "generic");
    }

    #[test]
    fn test_malformed_input_shape_is_ignored() {
        let d = ModelDescriptor::new(ModelType::ResidualCnn).with_input_shape("huge");
        let g = GraphBuilder::build(&d);
        assert_eq!(g.node("input").unwrap().output_shape.dims(), &[32, 3, 224, 224]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let d = ModelDescriptor::new(ModelType::GraphConvPose).with_batch_size(4);
        let a = GraphBuilder::build(&d);
        let b = GraphBuilder::build(&d);
        let nodes_a: Vec<_> = a.iter_nodes().cloned().collect();
        let nodes_b: Vec<_> = b.iter_nodes().cloned().collect();
        assert_eq!(nodes_a, nodes_b);
        assert_eq!(a.edges(), b.edges());
    }

    #[test]
    fn test_tiny_inputs_still_validate() {
        let d = ModelDescriptor::new(ModelType::ResidualCnn)
            .with_batch_size(1)
            .with_input_shape("1x1x1");
        let g = GraphBuilder::build(&d);
        assert!(g.iter_nodes().all(|n| n.output_shape.num_elements() > 0));
    }

    #[test]
    fn test_window_out_saturates() {
        assert_eq!(window_out(224, 7, 2, 3), 112);
        assert_eq!(window_out(usize::MAX, 7, 2, 3), (usize::MAX - 7) / 2 + 1);
        assert_eq!(window_out(usize::MAX, 1, 1, 0), usize::MAX);
        assert_eq!(window_out(1, 7, 0, 0), 1);
    }

    #[test]
    fn test_max_sized_dimensions_build_every_template() {
        let huge = usize::MAX;
        let cases = [
            (ModelType::GraphConvPose, format!("3x{huge}x25x2")),
            (ModelType::ResidualCnn, format!("3x{huge}x224")),
            (ModelType::ResidualCnn, format!("{huge}x{huge}x{huge}")),
            (ModelType::Transformer, format!("{huge}")),
            (ModelType::Convolutional, format!("3x{huge}x{huge}")),
            (ModelType::Recurrent, format!("{huge}x{huge}")),
            (ModelType::Mlp, format!("{huge}x{huge}")),
        ];
        for (model_type, shape) in cases {
            let d = ModelDescriptor::new(model_type)
                .with_batch_size(huge)
                .with_input_shape(shape.as_str());
            let g = GraphBuilder::build(&d);
            assert!(g.num_nodes() >= 2, "{model_type:?} with {shape}");
            assert_eq!(g.sources(), vec!["input"]);
            assert!(g.iter_nodes().all(|n| n.output_shape.num_elements() > 0));
        }
        let resnet = GraphBuilder::build(
            &ModelDescriptor::new(ModelType::ResidualCnn).with_input_shape(format!("3x{huge}x224")),
        );
        let conv1 = resnet.node("conv1").unwrap();
        assert_eq!(conv1.output_shape.dim(2), Some((huge - 7) / 2 + 1));
        assert_eq!(conv1.output_shape.dim(3), Some(112));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        const TYPES: [ModelType; 7] = [
            ModelType::GraphConvPose,
            ModelType::ResidualCnn,
            ModelType::Transformer,
            ModelType::Convolutional,
            ModelType::Recurrent,
            ModelType::Mlp,
            ModelType::Unknown,
        ];

        proptest! {
            #[test]
            fn prop_every_descriptor_builds_nonempty_graph(
                type_index in 0usize..TYPES.len(),
                batch in 1usize..256,
                classes in 1usize..2048,
            ) {
                let d = ModelDescriptor::new(TYPES[type_index])
                    .with_batch_size(batch)
                    .with_num_classes(classes);
                let g = GraphBuilder::build(&d);
                prop_assert!(g.num_nodes() >= 2);
                prop_assert_eq!(g.sources(), vec!["input"]);
                for node in g.iter_nodes() {
                    prop_assert_eq!(node.output_shape.dim(0), Some(batch));
                }
            }
        }
    }
}
