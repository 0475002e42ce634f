// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: descriptor → graph → prediction → calibration.
//!
//! These exercise the full record/predict loop across all four library
//! crates, including journal persistence and concurrent callers.

use calibration::{
    CalibrationError, CalibrationKey, CalibrationSnapshot, CalibrationStore, CommitBatch, ExecutionRecord,
    Observation,
};
use cost_model::{Bottleneck, HardwareSpec};
use estimator::{Estimator, EstimatorConfig};
use op_graph::{GraphManifest, ModelDescriptor, ModelType, OpKind};
use std::sync::Arc;

// ── Helpers ────────────────────────────────────────────────────

fn pose() -> ModelDescriptor {
    ModelDescriptor::new(ModelType::GraphConvPose)
        .with_batch_size(16)
        .with_num_classes(60)
        .with_dataset("ntu60")
}

fn in_memory() -> Estimator {
    Estimator::open(EstimatorConfig::default()).unwrap()
}

/// The observation a perfectly calibrated model would have produced,
/// with time scaled by `time_scale`.
fn observed(estimator: &Estimator, descriptor: &ModelDescriptor, hw: &HardwareSpec, time_scale: f64) -> Observation {
    let p = estimator.predict(descriptor, hw);
    Observation::new(p.estimated_time_seconds * time_scale, p.memory_usage_mb, p.sm_utilization)
}

/// A store whose commits always fail.
struct FailingStore;

impl CalibrationStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    fn load(&self) -> Result<CalibrationSnapshot, CalibrationError> {
        Ok(CalibrationSnapshot::new())
    }

    fn commit(&self, _batch: &CommitBatch) -> Result<u64, CalibrationError> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only filesystem").into())
    }

    fn records(&self) -> Result<Vec<ExecutionRecord>, CalibrationError> {
        Ok(Vec::new())
    }
}

// ── Prediction ─────────────────────────────────────────────────

#[test]
fn test_every_template_predicts_sane_values() {
    let estimator = in_memory();
    let descriptors = [
        pose(),
        ModelDescriptor::new(ModelType::ResidualCnn).with_batch_size(64),
        ModelDescriptor::new(ModelType::Transformer).with_architecture_detail("bert-base"),
        ModelDescriptor::new(ModelType::Convolutional).with_input_shape("3x32x32"),
        ModelDescriptor::new(ModelType::Recurrent),
        ModelDescriptor::new(ModelType::Mlp),
        ModelDescriptor::default(),
    ];
    for gpu in ["rtx4090", "rtx3080", "v100", "a100", "h100", "t4"] {
        let hw = HardwareSpec::new(gpu);
        for d in &descriptors {
            let p = estimator.predict(d, &hw);
            assert!(p.estimated_time_seconds > 0.0, "{:?} on {gpu}", d.model_type);
            assert!(p.estimated_time_seconds.is_finite());
            assert!((0.0..=100.0).contains(&p.sm_utilization));
            assert!(p.memory_peak_mb >= p.memory_usage_mb);
            assert_eq!(p.hardware, gpu);
        }
    }
}

#[test]
fn test_pose_reference_case() {
    let p = in_memory().predict(&pose(), &HardwareSpec::new("rtx4090"));
    assert!(matches!(p.bottleneck, Bottleneck::Compute | Bottleneck::Memory));
    assert!((0.0..=100.0).contains(&p.sm_utilization));
    assert!(p.estimated_time_seconds > 0.0);
}

#[test]
fn test_faster_gpu_is_not_slower() {
    let estimator = in_memory();
    let d = ModelDescriptor::new(ModelType::ResidualCnn);
    let t4 = estimator.predict(&d, &HardwareSpec::new("t4"));
    let h100 = estimator.predict(&d, &HardwareSpec::new("h100"));
    assert!(h100.estimated_time_seconds < t4.estimated_time_seconds);
}

#[test]
fn test_descriptor_from_json() {
    let d: ModelDescriptor = serde_json::from_str(
        r#"{"model_type": "ResNet50", "batch_size": 128, "epochs": 90, "dataset": "ImageNet", "optimizer": "adam"}"#,
    )
    .unwrap();
    assert_eq!(d.model_type, ModelType::ResidualCnn);
    let p = in_memory().predict(&d, &HardwareSpec::default());
    assert_eq!(p.epochs, 90);
    assert_eq!(p.batches_per_epoch, 1_281_167 / 128);
}

#[test]
fn test_manifest_graph_round_trip() {
    let manifest = GraphManifest::from_json(
        r#"{
            "name": "wide-mlp",
            "nodes": [
                { "id": "x",   "operation": "input",  "input_shape": [4096, 4096], "output_shape": [4096, 4096] },
                { "id": "fc1", "operation": "linear", "input_shape": [4096, 4096], "output_shape": [4096, 4096] },
                { "id": "act", "operation": "relu",   "input_shape": [4096, 4096], "output_shape": [4096, 4096] },
                { "id": "fc2", "operation": "linear", "input_shape": [4096, 4096], "output_shape": [4096, 10] }
            ],
            "edges": [
                { "from": "x", "to": "fc1" }, { "from": "fc1", "to": "act" }, { "from": "act", "to": "fc2" }
            ]
        }"#,
    )
    .unwrap();
    let graph = manifest.into_graph().unwrap();
    let estimator = in_memory();
    let d = ModelDescriptor::new(ModelType::Mlp).with_batch_size(4096);
    let hw = HardwareSpec::new("v100");

    let before = estimator.predict_graph(&graph, &d, &hw);
    assert_eq!(before.graph, "wide-mlp");
    assert_eq!(before.bottleneck, Bottleneck::Compute);
    let actual = Observation::new(before.estimated_time_seconds * 3.0, before.memory_usage_mb, before.sm_utilization);
    let result = estimator.record_graph(&graph, &d, &hw, actual).unwrap();
    assert!(result.updated_keys.contains(&CalibrationKey::efficiency(OpKind::Dense)));
    assert!(estimator.predict_graph(&graph, &d, &hw).estimated_time_seconds > before.estimated_time_seconds);
}

// ── Calibration ────────────────────────────────────────────────

#[test]
fn test_repeated_slow_runs_converge_monotonically() {
    let estimator = in_memory();
    let hw = HardwareSpec::new("rtx4090");
    let key = CalibrationKey::efficiency(OpKind::GraphConv);
    let actual = observed(&estimator, &pose(), &hw, 2.0);

    let mut previous = estimator.snapshot().factor_or_default(&key).value;
    let mut previous_step = f64::INFINITY;
    for _ in 0..20 {
        // Same absolute observation every time.
        estimator.record(&pose(), &hw, actual).unwrap();
        let value = estimator.snapshot().factor_or_default(&key).value;
        let step = previous - value;
        assert!(step > 0.0);
        assert!(step < previous_step);
        previous = value;
        previous_step = step;
    }
    // Still above the implied value of half the starting efficiency.
    assert!(previous > 0.25);
}

#[test]
fn test_failing_store_is_retryable_and_changes_nothing() {
    let estimator = Estimator::with_store(EstimatorConfig::default(), Arc::new(FailingStore)).unwrap();
    let hw = HardwareSpec::new("rtx4090");
    let before = estimator.predict(&pose(), &hw);
    let err = estimator
        .record(&pose(), &hw, observed(&estimator, &pose(), &hw, 2.0))
        .unwrap_err();
    assert!(err.is_retryable(), "{err}");
    assert!(estimator.factors().is_empty());
    assert_eq!(estimator.predict(&pose(), &hw), before);
}

#[test]
fn test_journal_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = EstimatorConfig {
        store_path: Some(dir.path().join("calibration.jsonl")),
        ..Default::default()
    };
    let hw = HardwareSpec::new("a100");

    let calibrated = {
        let estimator = Estimator::open(config.clone()).unwrap();
        let actual = observed(&estimator, &pose(), &hw, 1.5);
        let first = estimator.record(&pose(), &hw, actual).unwrap();
        assert_eq!(first.record_id, 1);
        estimator.predict(&pose(), &hw)
    };

    let reopened = Estimator::open(config).unwrap();
    let replayed = reopened.predict(&pose(), &hw);
    let drift = (replayed.estimated_time_seconds - calibrated.estimated_time_seconds).abs();
    assert!(drift <= 1e-12 * calibrated.estimated_time_seconds);
    // graph_conv, prototype_matching, dense and the a100 correction.
    assert_eq!(reopened.factors().len(), 4);
    let records = reopened.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fingerprint, pose().fingerprint());
    assert_eq!(records[0].hardware, "a100");

    let second = reopened
        .record(&pose(), &hw, observed(&reopened, &pose(), &hw, 1.0))
        .unwrap();
    assert_eq!(second.record_id, 2);
}

#[test]
fn test_config_file_drives_estimator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("estimator.toml");
    std::fs::write(&path, "default_gpu = \"t4\"\nbackward_multiplier = 1.0\n").unwrap();
    let config = EstimatorConfig::from_file(&path).unwrap();
    let estimator = Estimator::open(config).unwrap();
    let p = estimator.predict(&pose(), &HardwareSpec::default());
    assert_eq!(p.hardware, "t4");
    assert!((p.time_per_batch_ms - p.forward_time_seconds * 2.0 * 1000.0).abs() < 1e-9);
}

// ── Concurrency ────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_records_lose_no_updates() {
    let estimator = Arc::new(in_memory());
    let hw = HardwareSpec::new("rtx4090");
    let actual = observed(&estimator, &pose(), &hw, 1.5);
    const TASKS: usize = 8;
    const PER_TASK: usize = 10;

    let mut handles = Vec::new();
    for _ in 0..TASKS {
        let estimator = Arc::clone(&estimator);
        let hw = hw.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let mut ids = Vec::new();
            for _ in 0..PER_TASK {
                ids.push(estimator.record(&pose(), &hw, actual).unwrap().record_id);
                let p = estimator.predict(&pose(), &hw);
                assert!(p.estimated_time_seconds.is_finite() && p.estimated_time_seconds > 0.0);
            }
            ids
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.extend(handle.await.unwrap());
    }
    ids.sort_unstable();
    let total = TASKS * PER_TASK;
    assert_eq!(ids, (1..=total as u64).collect::<Vec<_>>());

    let gc = estimator
        .snapshot()
        .factor_or_default(&CalibrationKey::efficiency(OpKind::GraphConv));
    assert_eq!(gc.update_count, total as u64);
    assert_eq!(estimator.records().unwrap().len(), total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_gpus_calibrate_independently() {
    let estimator = Arc::new(in_memory());
    let mut handles = Vec::new();
    for gpu in ["v100", "t4"] {
        let estimator = Arc::clone(&estimator);
        handles.push(tokio::task::spawn_blocking(move || {
            let hw = HardwareSpec::new(gpu);
            let p = estimator.predict(&pose(), &hw);
            let actual = Observation::new(p.estimated_time_seconds, p.memory_usage_mb, p.sm_utilization * 2.0);
            estimator.record(&pose(), &hw, actual).unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    let snapshot = estimator.snapshot();
    for gpu in ["v100", "t4"] {
        let correction = snapshot.get(&CalibrationKey::general_correction(gpu)).unwrap();
        assert!((correction.value - 1.05).abs() < 1e-9, "{gpu}: {}", correction.value);
    }
}
