use crate::assert_err;
use crate::cyclegan::{CycleGanConfig, CycleGanError};

#[test]
fn test_default_config() {
    let config = CycleGanConfig::default();
    assert_eq!(config.lambda_cycle, 10.0);
    assert_eq!(config.lambda_identity, 25.0);
    assert_eq!(config.patience, 7);
    assert_eq!(config.factor, 0.5);
    assert_eq!(config.plateau_threshold, 1e-4);
    assert_eq!(config.min_lr, 0.0);
    config.validate().unwrap();
}

#[test]
fn test_validate_rejects_bad_values() {
    let bad = [
        CycleGanConfig {
            batch_size: 0,
            ..CycleGanConfig::default()
        },
        CycleGanConfig {
            factor: 1.0,
            ..CycleGanConfig::default()
        },
        CycleGanConfig {
            // 30 不能被 2^2 整除
            image_size: [8, 30, 32],
            ..CycleGanConfig::default()
        },
        CycleGanConfig {
            learning_rate: f32::NAN,
            ..CycleGanConfig::default()
        },
        CycleGanConfig {
            beta2: 1.0,
            ..CycleGanConfig::default()
        },
        CycleGanConfig {
            lambda_cycle: -1.0,
            ..CycleGanConfig::default()
        },
    ];
    for config in bad {
        assert_err!(config.validate(), CycleGanError::InvalidConfig(_));
    }
}

#[test]
fn test_json_round_trip_and_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let config = CycleGanConfig {
        n_filters: 16,
        seed: 7,
        ..CycleGanConfig::default()
    };
    config.to_json_file(&path).unwrap();
    assert_eq!(CycleGanConfig::from_json_file(&path).unwrap(), config);

    // 缺失的字段取默认值
    std::fs::write(&path, r#"{ "image_size": [4, 16, 16], "cnn_layers": 3 }"#).unwrap();
    let partial = CycleGanConfig::from_json_file(&path).unwrap();
    assert_eq!(partial.image_size, [4, 16, 16]);
    assert_eq!(partial.cnn_layers, 3);
    assert_eq!(partial.batch_size, CycleGanConfig::default().batch_size);

    std::fs::write(&path, r#"{ "factor": 2.0 }"#).unwrap();
    assert_err!(
        CycleGanConfig::from_json_file(&path),
        CycleGanError::InvalidConfig(_)
    );
    std::fs::write(&path, "not json").unwrap();
    assert_err!(
        CycleGanConfig::from_json_file(&path),
        CycleGanError::Serialization(_)
    );
    assert_err!(
        CycleGanConfig::from_json_file(dir.path().join("missing.json")),
        CycleGanError::Io(_)
    );
}

#[test]
fn test_resume_mismatches() {
    let base = CycleGanConfig::default();
    let run_control_only = CycleGanConfig {
        seed: 7,
        max_epochs: 5,
        ..CycleGanConfig::default()
    };
    assert!(base.resume_mismatches(&run_control_only).is_empty());

    let changed = [
        CycleGanConfig { image_size: [4, 32, 32], ..base.clone() },
        CycleGanConfig { n_filters: 4, ..base.clone() },
        CycleGanConfig { cnn_layers: 3, ..base.clone() },
        CycleGanConfig { batch_size: 4, ..base.clone() },
        CycleGanConfig { lambda_cycle: 1.0, ..base.clone() },
        CycleGanConfig { lambda_identity: 5.0, ..base.clone() },
        CycleGanConfig { learning_rate: 1e-2, ..base.clone() },
        CycleGanConfig { beta1: 0.9, ..base.clone() },
        CycleGanConfig { beta2: 0.99, ..base.clone() },
        CycleGanConfig { epsilon: 1e-6, ..base.clone() },
        CycleGanConfig { weight_decay: 1e-4, ..base.clone() },
        CycleGanConfig { patience: 2, ..base.clone() },
        CycleGanConfig { factor: 0.1, ..base.clone() },
        CycleGanConfig { plateau_threshold: 1e-2, ..base.clone() },
        CycleGanConfig { min_lr: 1e-6, ..base.clone() },
        CycleGanConfig { leaky_slope: 0.1, ..base.clone() },
    ];
    let expected = [
        "image_size",
        "n_filters",
        "cnn_layers",
        "batch_size",
        "lambda_cycle",
        "lambda_identity",
        "learning_rate",
        "beta1",
        "beta2",
        "epsilon",
        "weight_decay",
        "patience",
        "factor",
        "plateau_threshold",
        "min_lr",
        "leaky_slope",
    ];
    for (other, field) in changed.iter().zip(expected) {
        assert_eq!(base.resume_mismatches(other), vec![field]);
    }

    let several = CycleGanConfig {
        lambda_cycle: 1.0,
        patience: 2,
        ..base.clone()
    };
    assert_eq!(base.resume_mismatches(&several), vec!["lambda_cycle", "patience"]);
}
