// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `trainest hardware` command: list known GPU profiles.

use cost_model::{normalize_gpu_name, HardwareProfile};
use estimator::EstimatorConfig;

pub async fn execute(config: EstimatorConfig) -> anyhow::Result<()> {
    println!(
        "  {:<10} {:>5} {:>10} {:>9} {:>12} {:>12} {:>12}",
        "GPU", "SMs", "Cores", "Memory", "Bandwidth", "Clock", "FP32 peak"
    );
    println!("  {}", "-".repeat(78));
    let default = normalize_gpu_name(&config.default_gpu);
    for p in HardwareProfile::all() {
        let marker = if p.name == default { " *" } else { "" };
        println!(
            "  {:<10} {:>5} {:>10} {:>6.0} GB {:>7.0} GB/s {:>8.0} MHz {:>6.1} TFLOP/s{marker}",
            p.name,
            p.sm_count,
            p.total_cores(),
            p.memory_gb,
            p.memory_bandwidth_gbps,
            p.base_clock_mhz,
            p.peak_ops_per_second() / 1e12,
        );
    }
    println!();
    println!("  * configured default; unknown GPU names fall back to it.");
    Ok(())
}
