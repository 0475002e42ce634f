// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Static GPU hardware profiles.
//!
//! Profiles are looked up by a normalized model name, so `"NVIDIA GeForce
//! RTX 4090"`, `"rtx-4090"` and `"RTX4090"` all resolve to the same entry.
//! Unknown names never fail: they resolve to the default profile.

/// Name of the profile used when a GPU model is missing or unknown.
pub const DEFAULT_GPU: &str = "rtx4090";

/// Peak capabilities of a GPU model.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HardwareProfile {
    /// Normalized model name (the lookup key).
    pub name: &'static str,
    /// Number of streaming multiprocessors.
    pub sm_count: u32,
    /// CUDA cores per SM.
    pub cores_per_sm: u32,
    /// Device memory in GiB.
    pub memory_gb: f64,
    /// Peak memory bandwidth in GB/s.
    pub memory_bandwidth_gbps: f64,
    /// Clock used for throughput estimates, in MHz.
    pub base_clock_mhz: f64,
    /// Tensor-core throughput in TOPS (informational).
    pub tensor_tops: f64,
}

impl HardwareProfile {
    /// Total CUDA cores across all SMs.
    pub fn total_cores(&self) -> u64 {
        u64::from(self.sm_count) * u64::from(self.cores_per_sm)
    }

    pub fn clock_hz(&self) -> f64 {
        self.base_clock_mhz * 1e6
    }

    /// Peak scalar operations per second (`cores × clock`).
    pub fn peak_ops_per_second(&self) -> f64 {
        self.total_cores() as f64 * self.clock_hz()
    }

    pub fn bandwidth_bytes_per_second(&self) -> f64 {
        self.memory_bandwidth_gbps * 1e9
    }

    pub fn memory_bytes(&self) -> f64 {
        self.memory_gb * 1024.0 * 1024.0 * 1024.0
    }

    /// Looks up a profile by exact normalized name.
    pub fn lookup(name: &str) -> Option<&'static HardwareProfile> {
        let key = normalize_gpu_name(name);
        PROFILES.iter().find(|p| p.name == key)
    }

    /// Resolves a GPU model name, falling back to `default` and then to
    /// [`DEFAULT_GPU`].
    pub fn resolve(name: Option<&str>, default: &str) -> &'static HardwareProfile {
        if let Some(profile) = name.and_then(Self::lookup) {
            return profile;
        }
        if let Some(requested) = name {
            tracing::debug!("unknown GPU model '{requested}', using default profile '{default}'");
        }
        Self::lookup(default).unwrap_or(&PROFILES[0])
    }

    /// Every known profile.
    pub fn all() -> &'static [HardwareProfile] {
        &PROFILES
    }
}

/// Normalizes a GPU model name for lookup: lowercase, vendor and brand
/// prefixes stripped, separators removed.
pub fn normalize_gpu_name(name: &str) -> String {
    let mut s = name.to_lowercase();
    for noise in ["nvidia", "geforce", "tesla"] {
        s = s.replace(noise, "");
    }
    s.retain(|c| !c.is_whitespace() && c != '-' && c != '_');
    s
}

/// The hardware half of a prediction request.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HardwareSpec {
    pub gpu_model: Option<String>,
}

impl HardwareSpec {
    pub fn new(gpu_model: impl Into<String>) -> Self {
        Self {
            gpu_model: Some(gpu_model.into()),
        }
    }
}

// The first entry is the fallback of last resort.
static PROFILES: [HardwareProfile; 6] = [
    HardwareProfile {
        name: "rtx4090",
        sm_count: 128,
        cores_per_sm: 128,
        memory_gb: 24.0,
        memory_bandwidth_gbps: 1008.0,
        base_clock_mhz: 2520.0,
        tensor_tops: 165.0,
    },
    HardwareProfile {
        name: "rtx3080",
        sm_count: 68,
        cores_per_sm: 128,
        memory_gb: 10.0,
        memory_bandwidth_gbps: 760.0,
        base_clock_mhz: 1710.0,
        tensor_tops: 58.0,
    },
    HardwareProfile {
        name: "v100",
        sm_count: 80,
        cores_per_sm: 64,
        memory_gb: 32.0,
        memory_bandwidth_gbps: 900.0,
        base_clock_mhz: 1530.0,
        tensor_tops: 125.0,
    },
    HardwareProfile {
        name: "a100",
        sm_count: 108,
        cores_per_sm: 64,
        memory_gb: 40.0,
        memory_bandwidth_gbps: 1555.0,
        base_clock_mhz: 1410.0,
        tensor_tops: 312.0,
    },
    HardwareProfile {
        name: "h100",
        sm_count: 132,
        cores_per_sm: 128,
        memory_gb: 80.0,
        memory_bandwidth_gbps: 3350.0,
        base_clock_mhz: 1755.0,
        tensor_tops: 989.0,
    },
    HardwareProfile {
        name: "t4",
        sm_count: 40,
        cores_per_sm: 64,
        memory_gb: 16.0,
        memory_bandwidth_gbps: 320.0,
        base_clock_mhz: 1590.0,
        tensor_tops: 65.0,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_names() {
        assert_eq!(normalize_gpu_name("NVIDIA GeForce RTX 4090"), "rtx4090");
        assert_eq!(normalize_gpu_name("rtx-3080"), "rtx3080");
        assert_eq!(normalize_gpu_name("Tesla V100"), "v100");
        assert_eq!(normalize_gpu_name("a100_sxm"), "a100sxm");
    }

    #[test]
    fn test_lookup_known() {
        let p = HardwareProfile::lookup("Tesla T4").unwrap();
        assert_eq!(p.name, "t4");
        assert_eq!(p.total_cores(), 40 * 64);
    }

    #[test]
    fn test_resolve_unknown_uses_default() {
        let p = HardwareProfile::resolve(Some("unknown_gpu_xyz"), DEFAULT_GPU);
        assert_eq!(p.name, "rtx4090");
        let p = HardwareProfile::resolve(None, "v100");
        assert_eq!(p.name, "v100");
        // A bad default still resolves.
        let p = HardwareProfile::resolve(None, "not-a-gpu");
        assert_eq!(p.name, DEFAULT_GPU);
    }

    #[test]
    fn test_rtx4090_throughput() {
        let p = HardwareProfile::lookup("rtx4090").unwrap();
        let expected = 128.0 * 128.0 * 2520.0e6;
        assert!((p.peak_ops_per_second() - expected).abs() < 1.0);
        assert!((p.bandwidth_bytes_per_second() - 1.008e12).abs() < 1.0);
    }

    #[test]
    fn test_profiles_are_positive() {
        for p in HardwareProfile::all() {
            assert!(p.peak_ops_per_second() > 0.0, "{}", p.name);
            assert!(p.bandwidth_bytes_per_second() > 0.0, "{}", p.name);
            assert!(p.memory_bytes() > 0.0, "{}", p.name);
        }
    }
}
