// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `trainest predict` command: estimate a training job.

use super::ModelArgs;
use estimator::EstimatorConfig;

pub async fn execute(config: EstimatorConfig, model: ModelArgs, json: bool) -> anyhow::Result<()> {
    let estimator = super::open_estimator(config)?;
    let descriptor = model.descriptor()?;
    let hardware = model.hardware();
    let prediction = match model.manifest_graph()? {
        Some(graph) => estimator.predict_graph(&graph, &descriptor, &hardware),
        None => estimator.predict(&descriptor, &hardware),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
        return Ok(());
    }

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            trainest · Training Estimate             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Job ────────────────────────────────────────────────────
    println!("  Model:      {} ({})", descriptor.model_type.as_str(), prediction.graph);
    println!("  Hardware:   {}", prediction.hardware);
    println!(
        "  Schedule:   {} epochs × {} batches of {}",
        prediction.epochs,
        prediction.batches_per_epoch,
        descriptor.batch_size()
    );
    println!();

    // ── Estimate ───────────────────────────────────────────────
    println!("  Total time:        {}", format_duration(prediction.estimated_time_seconds));
    println!("  Per epoch:         {}", format_duration(prediction.time_per_epoch_seconds));
    println!("  Per batch:         {:.3} ms", prediction.time_per_batch_ms);
    println!(
        "  Memory:            {:.1} MB (peak {:.1} MB, {:.1}% of device)",
        prediction.memory_usage_mb, prediction.memory_peak_mb, prediction.memory_utilization_percent
    );
    println!("  SM utilization:    {:.2}%", prediction.sm_utilization);
    println!("  Bottleneck:        {}", prediction.bottleneck);
    println!(
        "  Complexity:        {} ({:.3} GFLOPs/batch forward)",
        prediction.complexity,
        prediction.total_flops as f64 / 1e9
    );
    println!();

    // ── Breakdown ──────────────────────────────────────────────
    println!("  {:<22} {:>6} {:>14} {:>8}", "Kind", "Nodes", "GFLOPs", "Share");
    println!("  {}", "-".repeat(54));
    for b in &prediction.breakdown {
        println!(
            "  {:<22} {:>6} {:>14.3} {:>7.1}%",
            b.kind.as_str(),
            b.nodes,
            b.flops as f64 / 1e9,
            b.compute_share * 100.0
        );
    }
    println!();
    Ok(())
}

/// Formats seconds as `1h 02m 03s`, or with millisecond precision below a minute.
pub(crate) fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        return format!("{seconds:.3} s");
    }
    let total = seconds.round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else {
        format!("{m}m {s:02}s")
    }
}
