// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `trainest inspect` command: display the computation graph and what each
//! node costs on the selected GPU.

use super::ModelArgs;
use estimator::EstimatorConfig;
use op_graph::GraphBuilder;

pub async fn execute(config: EstimatorConfig, model: ModelArgs) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              trainest · Graph Inspector             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let estimator = super::open_estimator(config)?;
    let descriptor = model.descriptor()?;
    let graph = match model.manifest_graph()? {
        Some(graph) => graph,
        None => GraphBuilder::build(&descriptor),
    };
    let profile = estimator.cost_model().profile(&model.hardware());
    let snapshot = estimator.snapshot();
    let estimate = estimator.cost_model().estimate_forward(&graph, profile, snapshot.as_ref());

    // ── Summary ────────────────────────────────────────────────
    println!("  Graph:      {}", graph.summary());
    println!(
        "  Hardware:   {} ({:.1} TFLOP/s peak, {:.0} GB/s)",
        profile.name,
        profile.peak_ops_per_second() / 1e12,
        profile.memory_bandwidth_gbps
    );
    println!(
        "  Forward:    {:.6} s ({}-bound)",
        estimate.pass.forward_time_s, estimate.pass.bottleneck
    );
    println!();

    // ── Per-Node Detail ────────────────────────────────────────
    println!(
        "  {:<16} {:<20} {:<22} {:>12} {:>12} {:>12}",
        "Id", "Kind", "Output", "GFLOPs", "Compute µs", "Memory µs",
    );
    println!("  {}", "-".repeat(100));
    for node in &estimate.nodes {
        let output = graph
            .node(&node.id)
            .map(|n| n.output_shape.to_string())
            .unwrap_or_default();
        println!(
            "  {:<16} {:<20} {:<22} {:>12.4} {:>12.2} {:>12.2}",
            truncate(&node.id, 16),
            node.kind.as_str(),
            truncate(&output, 22),
            node.cost.flops as f64 / 1e9,
            node.hardware.compute_time_s * 1e6,
            node.memory_time_s * 1e6,
        );
    }
    println!();
    Ok(())
}

/// Truncates a string to `max_len` characters with ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
