// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `trainest record` command: feed an observed run back into calibration.

use super::ModelArgs;
use calibration::Observation;
use estimator::EstimatorConfig;

pub async fn execute(config: EstimatorConfig, model: ModelArgs, actual: Observation, json: bool) -> anyhow::Result<()> {
    if config.store_path.is_none() {
        tracing::warn!("no calibration store configured; this update will not be persisted");
    }
    let estimator = super::open_estimator(config)?;
    let descriptor = model.descriptor()?;
    let hardware = model.hardware();
    let result = match model.manifest_graph()? {
        Some(graph) => estimator.record_graph(&graph, &descriptor, &hardware, actual)?,
        None => estimator.record(&descriptor, &hardware, actual)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("  Recorded run #{}", result.record_id);
    println!();
    println!("  {:<14} {:>14} {:>14} {:>8}", "", "Predicted", "Actual", "Error");
    println!("  {}", "-".repeat(54));
    let rows = [
        ("time (s)", result.predicted.time_seconds, actual.time_seconds, result.prediction_error.time_error),
        ("memory (MB)", result.predicted.memory_mb, actual.memory_mb, result.prediction_error.memory_error),
        (
            "util (%)",
            result.predicted.utilization_percent,
            actual.utilization_percent,
            result.prediction_error.utilization_error,
        ),
    ];
    for (label, predicted, observed, error) in rows {
        println!("  {label:<14} {predicted:>14.3} {observed:>14.3} {:>7.1}%", error * 100.0);
    }
    println!();

    let snapshot = estimator.snapshot();
    println!("  Updated factors:");
    for key in &result.updated_keys {
        let factor = snapshot.factor_or_default(key);
        println!("   {:<36} {:.6}  (confidence {:.2})", key.to_string(), factor.value, factor.confidence);
    }
    if !result.skipped_keys.is_empty() {
        println!("  Skipped (no signal):");
        for key in &result.skipped_keys {
            println!("   {key}");
        }
    }
    println!();
    Ok(())
}
