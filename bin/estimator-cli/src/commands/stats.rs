// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `trainest stats` command: prediction accuracy over recent runs.

use calibration::DAY_MS;
use estimator::EstimatorConfig;
use std::time::Duration;

pub async fn execute(config: EstimatorConfig, window_days: Option<u64>) -> anyhow::Result<()> {
    let days = window_days.unwrap_or(config.accuracy_window_days);
    let estimator = super::open_estimator(config)?;
    let stats = estimator.accuracy_within(Duration::from_millis(days.saturating_mul(DAY_MS)))?;

    println!("  Accuracy over the last {days} days ({} runs)", stats.sample_count);
    if stats.sample_count == 0 {
        println!("  No recorded runs in this window.");
        return Ok(());
    }
    println!();
    println!("  {:<14} {:>10} {:>10}", "", "MAPE", "Accuracy");
    println!("  {}", "-".repeat(36));
    for (label, mape, accuracy) in [
        ("time", stats.time_mape, stats.time_accuracy),
        ("memory", stats.memory_mape, stats.memory_accuracy),
        ("utilization", stats.utilization_mape, stats.utilization_accuracy),
    ] {
        println!("  {label:<14} {:>9.1}% {:>9.1}%", mape * 100.0, accuracy * 100.0);
    }
    println!();
    println!("  Confidence: {:.2}", stats.confidence);
    Ok(())
}
