use super::{random_batch, tiny_config, values_of};
use crate::assert_err;
use crate::cyclegan::{
    CycleGanError, EpochAccumulator, LossComposer, LossRecord, ModelState, SampleImages,
    ValidationAggregator,
};
use crate::data::Batch;
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_accumulator_means_per_key() {
    let mut accumulator = EpochAccumulator::new();
    for (d, g) in [(1.0, 10.0), (2.0, 20.0), (3.0, 60.0)] {
        accumulator.push(&LossRecord::from_pairs([("d_loss", d), ("g_loss", g)]));
    }
    assert_eq!(accumulator.len(), 3);

    let aggregate = accumulator.reduce().unwrap();
    assert_abs_diff_eq!(aggregate.get("d_loss_val").unwrap(), 2.0);
    assert_abs_diff_eq!(aggregate.get("g_loss_val").unwrap(), 30.0);
    assert_abs_diff_eq!(aggregate.get("val_loss").unwrap(), 32.0);
    assert_eq!(aggregate.get("d_loss"), None);
}

#[test]
fn test_accumulator_without_both_totals_has_no_val_loss() {
    let mut accumulator = EpochAccumulator::new();
    accumulator.push(&LossRecord::from_pairs([("d_loss", 1.0)]));
    let aggregate = accumulator.reduce().unwrap();
    assert_eq!(aggregate.len(), 1);
    assert_eq!(aggregate.get("val_loss"), None);
}

#[test]
fn test_empty_accumulator() {
    assert_err!(
        EpochAccumulator::new().reduce(),
        CycleGanError::EmptyValidationSet
    );
}

#[test]
fn test_validation_run_changes_nothing() {
    let config = tiny_config();
    let model = ModelState::from_config(&config).unwrap();
    let before = values_of(&model.graph().parameters());
    let source: Vec<Batch> = (0..3).map(|seed| random_batch(&config, seed)).collect();

    let outcome = ValidationAggregator
        .run(&model, &LossComposer::default(), &source, 1)
        .unwrap();

    assert_eq!(outcome.num_batches, 3);
    let keys: Vec<&str> = outcome.aggregate.keys().collect();
    for key in [
        "d_loss_val",
        "d_x_val",
        "d_y_val",
        "g_adv_x_val",
        "g_adv_y_val",
        "g_cyc_x_val",
        "g_cyc_y_val",
        "g_idt_val",
        "g_loss_val",
        "val_loss",
    ] {
        assert!(keys.contains(&key), "缺少{key}");
    }
    assert_eq!(values_of(&model.graph().parameters()), before);
    assert_eq!(model.graph().nodes_count(), before.len());
    // 验证结束后恢复 train 模式
    assert!(!model.graph().is_eval());

    let samples = outcome.samples.unwrap();
    assert_eq!(samples.real_x.shape(), &[8, 8]);
    // 第0个样本的中间层（depth=2 => 第1层）
    let expected = source[0].x.index_axis(0, 0).unwrap().index_axis(0, 1).unwrap();
    assert_eq!(samples.real_x, expected);
}

#[test]
fn test_validation_on_empty_source() {
    let config = tiny_config();
    let model = ModelState::from_config(&config).unwrap();
    let empty: Vec<Batch> = Vec::new();
    assert_err!(
        ValidationAggregator.run(&model, &LossComposer::default(), &empty, 1),
        CycleGanError::EmptyValidationSet
    );
}

#[test]
fn test_sample_extraction_bounds() {
    let batch = Batch::new(Tensor::zeros(&[1, 2, 4, 4]), Tensor::zeros(&[1, 2, 4, 4]));
    let fake = Tensor::ones(&[1, 2, 4, 4]);
    let samples = SampleImages::extract(&batch, &fake, &fake, 1).unwrap();
    assert_eq!(samples.panels()[1].1, &Tensor::ones(&[4, 4]));
    assert_err!(
        SampleImages::extract(&batch, &fake, &fake, 2),
        CycleGanError::Tensor(_)
    );
}
