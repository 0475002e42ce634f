// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-operation cost formulas.
//!
//! Each node is priced in closed form from its kind, shapes and parameters.
//! FLOP counts include the batch dimension. Every product saturates at
//! `u64::MAX`, and a node whose shapes do not have the rank its formula
//! expects is priced at `prod(input)`, so no node is ever free.
//!
//! | Kind | FLOPs |
//! |---|---|
//! | Dense | `prod(input[..-1]) · in · out` |
//! | GraphConv `[N,C,T,V,M]` | `N · V(V−1) · Cin · Cout · T · M` |
//! | PrototypeMatching | `N · P · D · spatial(input)` |
//! | Conv2d `[N,C,H,W]` | `N · K² · Cin · Cout · Hout · Wout` |
//! | ResidualBlock | `N · blocks · Hout · Wout · (c0·c1 + 9·c1² + c1·c2)` |
//! | MultiHeadAttention `[N,S,H]` | `N · (4·S·H² + S²·H)` |
//! | FeedForward `[N,S,H]` | `N · 2 · S · H · I` |
//! | Embedding | `prod(output)` |
//! | Activation, Pooling, Unknown | `prod(input)` |
//! | Normalization | `2 · prod(input)` |
//! | Input | `0` |

use op_graph::{DType, OpKind, OperationNode, Shape};

/// The derived cost of a single operation node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct LayerCost {
    pub flops: u64,
    /// Input activations plus weights (gathered rows only for embeddings).
    pub bytes_read: u64,
    /// Output activations.
    pub bytes_written: u64,
    /// Input plus output activation bytes, without weights.
    pub activation_bytes: u64,
    /// Trainable parameter count.
    pub params: u64,
}

impl LayerCost {
    /// Total bytes moved to and from device memory.
    pub fn bytes_accessed(&self) -> u64 {
        self.bytes_read.saturating_add(self.bytes_written)
    }
}

fn prod(values: &[u64]) -> u64 {
    values.iter().fold(1u64, |acc, &v| acc.saturating_mul(v))
}

fn elements(shape: &Shape) -> u64 {
    shape.num_elements() as u64
}

fn dim(shape: &Shape, index: usize) -> u64 {
    shape.dim(index).unwrap_or(1) as u64
}

fn param_or(value: Option<usize>, fallback: u64) -> u64 {
    value.map(|v| v as u64).unwrap_or(fallback)
}

/// Computes the cost of one node.
pub fn layer_cost(node: &OperationNode, dtype: DType) -> LayerCost {
    let input = &node.input_shape;
    let output = &node.output_shape;
    let p = &node.params;
    let fallback = elements(input);

    let (flops, params) = match node.kind {
        OpKind::Input => (0, 0),
        OpKind::Dense if input.rank() >= 2 && output.rank() >= 2 => {
            let in_f = param_or(p.in_features, input.last_dim().unwrap_or(1) as u64);
            let out_f = param_or(p.out_features, output.last_dim().unwrap_or(1) as u64);
            let rows = input.leading_elements() as u64;
            (prod(&[rows, in_f, out_f]), prod(&[in_f, out_f]).saturating_add(out_f))
        }
        OpKind::GraphConv if input.rank() == 5 => {
            let (n, c_in, t, v, m) = (dim(input, 0), dim(input, 1), dim(input, 2), dim(input, 3), dim(input, 4));
            let c_in = param_or(p.in_channels, c_in);
            let c_out = param_or(p.out_channels, dim(output, 1));
            let edges = v.saturating_mul(v.saturating_sub(1));
            (
                prod(&[n, edges, c_in, c_out, t, m]),
                prod(&[c_in, c_out]).saturating_add(c_out),
            )
        }
        OpKind::PrototypeMatching if input.rank() >= 3 => {
            let n = dim(input, 0);
            let spatial = prod(&input.dims()[2..].iter().map(|&d| d as u64).collect::<Vec<_>>());
            let protos = param_or(p.num_prototypes, dim(output, 1));
            let feature_dim = param_or(p.feature_dim, dim(input, 1));
            (prod(&[n, protos, feature_dim, spatial]), prod(&[protos, feature_dim]))
        }
        OpKind::Conv2d if input.rank() == 4 && output.rank() == 4 => {
            let k = param_or(p.kernel_size, 3);
            let c_in = param_or(p.in_channels, dim(input, 1));
            let c_out = param_or(p.out_channels, dim(output, 1));
            let (n, h_out, w_out) = (dim(output, 0), dim(output, 2), dim(output, 3));
            (
                prod(&[n, k, k, c_in, c_out, h_out, w_out]),
                prod(&[k, k, c_in, c_out]).saturating_add(c_out),
            )
        }
        OpKind::ResidualBlock if output.rank() == 4 => {
            let blocks = param_or(p.num_blocks, 1);
            let [c0, c1, c2] = match p.channels {
                Some([a, b, c]) => [a as u64, b as u64, c as u64],
                None => {
                    let out = dim(output, 1);
                    [dim(input, 1), (out / 4).max(1), out]
                }
            };
            let per_pixel = prod(&[c0, c1])
                .saturating_add(prod(&[9, c1, c1]))
                .saturating_add(prod(&[c1, c2]));
            let (n, h_out, w_out) = (dim(output, 0), dim(output, 2), dim(output, 3));
            (
                prod(&[n, blocks, h_out, w_out, per_pixel]),
                prod(&[blocks, per_pixel]),
            )
        }
        OpKind::MultiHeadAttention if input.rank() == 3 => {
            let (n, s) = (dim(input, 0), dim(input, 1));
            let h = param_or(p.hidden_size, dim(input, 2));
            let projections = prod(&[4, s, h, h]);
            let scores = prod(&[s, s, h]);
            (
                prod(&[n, projections.saturating_add(scores)]),
                prod(&[4, h, h]).saturating_add(prod(&[4, h])),
            )
        }
        OpKind::FeedForward if input.rank() == 3 => {
            let (n, s) = (dim(input, 0), dim(input, 1));
            let h = param_or(p.hidden_size, dim(input, 2));
            let i = param_or(p.intermediate_size, h.saturating_mul(4));
            (
                prod(&[n, 2, s, h, i]),
                prod(&[2, h, i]).saturating_add(h).saturating_add(i),
            )
        }
        OpKind::Embedding => {
            let hidden = param_or(p.hidden_size, output.last_dim().unwrap_or(1) as u64);
            (elements(output), prod(&[param_or(p.vocab_size, 0), hidden]))
        }
        OpKind::Activation | OpKind::Pooling => (fallback, 0),
        OpKind::Normalization => {
            let channels = if input.rank() == 4 {
                dim(input, 1)
            } else {
                input.last_dim().unwrap_or(1) as u64
            };
            (fallback.saturating_mul(2), channels.saturating_mul(2))
        }
        kind => {
            if kind != OpKind::Unknown {
                tracing::trace!(
                    "node '{}' ({kind}) has unexpected rank {} -> {}, using O(n) floor",
                    node.id,
                    input.rank(),
                    output.rank()
                );
            }
            (fallback, 0)
        }
    };

    let elem = dtype.size_bytes() as u64;
    let input_bytes = elements(input).saturating_mul(elem);
    let output_bytes = elements(output).saturating_mul(elem);
    let weight_bytes = params.saturating_mul(elem);

    let bytes_read = match node.kind {
        OpKind::Input => 0,
        // Only the looked-up rows of the table are touched.
        OpKind::Embedding => input_bytes.saturating_add(output_bytes),
        _ => input_bytes.saturating_add(weight_bytes),
    };
    let activation_bytes = match node.kind {
        OpKind::Input => output_bytes,
        _ => input_bytes.saturating_add(output_bytes),
    };

    LayerCost {
        flops: flops.max(if node.kind == OpKind::Input { 0 } else { 1 }),
        bytes_read,
        bytes_written: output_bytes,
        activation_bytes,
        params,
    }
}
