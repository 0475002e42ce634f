// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `trainest factors` command: list learned calibration factors.

use estimator::EstimatorConfig;

pub async fn execute(config: EstimatorConfig) -> anyhow::Result<()> {
    let estimator = super::open_estimator(config)?;
    let factors = estimator.factors();
    if factors.is_empty() {
        println!("  No calibration recorded yet; predictions use default factors.");
        return Ok(());
    }

    println!(
        "  {:<40} {:>10} {:>10} {:>8} {:>10}",
        "Key", "Value", "Default", "Updates", "Confidence"
    );
    println!("  {}", "-".repeat(82));
    for entry in factors {
        println!(
            "  {:<40} {:>10.6} {:>10.4} {:>8} {:>10.3}",
            entry.key.to_string(),
            entry.factor.value,
            entry.key.default_factor().value,
            entry.factor.update_count,
            entry.factor.confidence,
        );
    }
    println!();
    Ok(())
}
