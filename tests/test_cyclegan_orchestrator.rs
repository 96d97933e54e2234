/*
 * @Description  : 编排器的各生命周期阶段：交替步、学习率平台衰减、最佳检查点、空验证集与发散检测
 */

mod common;

use approx::assert_abs_diff_eq;
use artifact_gan::assert_err;
use artifact_gan::cyclegan::{
    CheckpointStore, CycleGanError, FileCheckpointStore, InMemoryCheckpointStore, LossRecord,
    StepKind, TrainingOrchestrator,
};
use artifact_gan::data::Batch;
use artifact_gan::tensor::Tensor;
use common::{aggregate, init_tracing, random_batches, tiny_config};

fn orchestrator() -> TrainingOrchestrator {
    TrainingOrchestrator::from_config(tiny_config(), Box::new(InMemoryCheckpointStore::new()))
        .unwrap()
}

#[test]
fn test_steps_alternate_and_restart_each_epoch() {
    init_tracing();
    let mut orchestrator = orchestrator();
    let batches = random_batches(orchestrator.config(), 5, 0);

    for _ in 0..2 {
        let kinds: Vec<StepKind> = orchestrator
            .run_training_epoch(&batches)
            .unwrap()
            .iter()
            .map(|outcome| outcome.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::GeneratorStep,
                StepKind::DiscriminatorStep,
                StepKind::GeneratorStep,
                StepKind::DiscriminatorStep,
                StepKind::GeneratorStep,
            ]
        );
    }
    // 训练 epoch 本身不推进 epoch 计数
    assert_eq!(orchestrator.epochs_completed(), 0);
    // 每步结束后中间节点都已释放
    let graph = orchestrator.model().graph();
    assert_eq!(graph.nodes_count(), graph.parameters().len());
}

#[test]
fn test_manual_lifecycle_restarts_with_generator_step() {
    init_tracing();
    let mut orchestrator = orchestrator();
    let train = random_batches(orchestrator.config(), 3, 30);
    let val = random_batches(orchestrator.config(), 1, 40);

    // 只用单步训练、验证、结束 epoch 三个阶段驱动，每个 epoch 奇数个批次
    let mut epochs = Vec::new();
    for _ in 0..2 {
        let kinds: Vec<StepKind> = train
            .iter()
            .map(|batch| orchestrator.run_training_batch(batch).unwrap().kind)
            .collect();
        let aggregate = orchestrator.run_validation_epoch(&val).unwrap();
        orchestrator.end_epoch(aggregate).unwrap();
        epochs.push(kinds);
    }

    let expected = vec![
        StepKind::GeneratorStep,
        StepKind::DiscriminatorStep,
        StepKind::GeneratorStep,
    ];
    assert_eq!(epochs, vec![expected.clone(), expected]);
    assert_eq!(orchestrator.epochs_completed(), 2);
}

#[test]
fn test_each_step_reports_finite_losses() {
    init_tracing();
    let mut orchestrator = orchestrator();
    let batches = random_batches(orchestrator.config(), 2, 10);
    let outcomes = orchestrator.run_training_epoch(&batches).unwrap();

    let generator = &outcomes[0];
    for key in ["g_loss", "g_adv_x", "g_adv_y", "g_cyc_x", "g_cyc_y", "g_idt"] {
        assert!(generator.losses.get(key).unwrap().is_finite(), "{key}");
    }
    let discriminator = &outcomes[1];
    for key in ["d_loss", "d_x", "d_y"] {
        assert!(discriminator.losses.get(key).unwrap().is_finite(), "{key}");
    }
    assert!(outcomes.iter().all(|o| o.grad_norm > 0.0));
}

#[test]
fn test_plateau_halves_learning_rate_after_patience() {
    init_tracing();
    let mut orchestrator = orchestrator();
    let initial_lr = orchestrator.config().learning_rate;
    let patience = orchestrator.config().patience;

    // 第1个 epoch 建立基准，随后 patience 个 epoch 没有改善
    let summaries: Vec<_> = (0..=patience)
        .map(|_| orchestrator.end_epoch(aggregate(1.0, 1.0)).unwrap())
        .collect();

    for summary in &summaries[..patience] {
        assert_eq!(summary.lr_update.generator, None);
        assert_eq!(summary.generator_lr, initial_lr);
    }
    let last = summaries.last().unwrap();
    assert_eq!(last.epoch, patience + 1);
    assert_abs_diff_eq!(last.lr_update.generator.unwrap(), initial_lr * 0.5);
    assert_abs_diff_eq!(last.generator_lr, initial_lr * 0.5);
    assert_abs_diff_eq!(last.discriminator_lr, initial_lr * 0.5);
}

#[test]
fn test_plateau_groups_are_independent() {
    init_tracing();
    let mut orchestrator = orchestrator();
    let initial_lr = orchestrator.config().learning_rate;
    let patience = orchestrator.config().patience;

    // 判别器指标持续改善，生成器指标停滞
    let mut d_loss = 1.0;
    let mut last = None;
    for _ in 0..=patience {
        last = Some(orchestrator.end_epoch(aggregate(1.0, d_loss)).unwrap());
        d_loss *= 0.5;
    }
    let last = last.unwrap();
    assert_abs_diff_eq!(last.generator_lr, initial_lr * 0.5);
    assert_eq!(last.lr_update.discriminator, None);
    assert_eq!(last.discriminator_lr, initial_lr);
}

#[test]
fn test_only_best_checkpoint_is_kept() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = FileCheckpointStore::open(dir.path()).unwrap();
    let mut orchestrator =
        TrainingOrchestrator::from_config(tiny_config(), Box::new(store)).unwrap();

    let is_best: Vec<bool> = [(0.25, 0.25), (0.2, 0.1), (0.2, 0.2)]
        .into_iter()
        .map(|(g, d)| orchestrator.end_epoch(aggregate(g, d)).unwrap().is_best)
        .collect();
    assert_eq!(is_best, vec![true, true, false]);

    let (epoch, val_loss) = orchestrator.store().best().unwrap();
    assert_eq!(epoch, 2);
    assert_abs_diff_eq!(val_loss, 0.3);

    let mut files: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files, vec!["best.json", "epoch=02.ckpt", "last.ckpt"]);
    assert_eq!(orchestrator.store().load_last().unwrap().unwrap().epoch, 3);

    let best = orchestrator.store().load_best().unwrap().unwrap();
    assert_eq!(best.epoch, 2);
    assert_eq!(best.parameters, orchestrator.model().snapshot().unwrap());
}

#[test]
fn test_empty_validation_set() {
    init_tracing();
    let mut orchestrator = orchestrator();
    assert_err!(
        orchestrator.run_validation_epoch(&Vec::<Batch>::new()),
        CycleGanError::EmptyValidationSet
    );
    // 缺少 val_loss 的聚合记录不能结束 epoch
    assert_err!(
        orchestrator.end_epoch(LossRecord::from_pairs([("g_loss_val", 1.0)])),
        CycleGanError::MissingMetric(key) if key == "val_loss"
    );
    assert_eq!(orchestrator.epochs_completed(), 0);
    assert!(orchestrator.store().best().is_none());
}

#[test]
fn test_validation_keeps_parameters() {
    init_tracing();
    let mut orchestrator = orchestrator();
    let before = orchestrator.model().snapshot().unwrap();
    let batches = random_batches(orchestrator.config(), 2, 20);

    let record = orchestrator.run_validation_epoch(&batches).unwrap();
    let g = record.get("g_loss_val").unwrap();
    let d = record.get("d_loss_val").unwrap();
    assert_abs_diff_eq!(record.get("val_loss").unwrap(), g + d, epsilon = 1e-4);
    assert_eq!(orchestrator.model().snapshot().unwrap(), before);
}

#[test]
fn test_divergence_is_reported_without_update() {
    init_tracing();
    let mut orchestrator = orchestrator();
    let config = orchestrator.config().clone();
    let [d, h, w] = config.image_size;
    let shape = [config.batch_size, d, h, w];
    let before = orchestrator.model().snapshot().unwrap();

    let poisoned = Batch::new(Tensor::full(f32::NAN, &shape), Tensor::zeros(&shape));
    assert_err!(
        orchestrator.run_training_batch(&poisoned),
        CycleGanError::DivergedLoss { value, .. } if value.is_nan()
    );
    assert_eq!(orchestrator.model().snapshot().unwrap(), before);
}

#[test]
fn test_batch_shape_mismatch() {
    init_tracing();
    let mut orchestrator = orchestrator();
    let before = orchestrator.model().snapshot().unwrap();

    let wrong = Batch::new(Tensor::zeros(&[2, 2, 4, 4]), Tensor::zeros(&[2, 2, 4, 4]));
    assert_err!(
        orchestrator.run_training_batch(&wrong),
        CycleGanError::ShapeMismatch { expected, actual }
            if expected == &[2, 2, 8, 8] && actual == &[2, 2, 4, 4]
    );
    assert_err!(
        orchestrator.run_validation_epoch(&vec![wrong]),
        CycleGanError::ShapeMismatch { .. }
    );
    assert_eq!(orchestrator.model().snapshot().unwrap(), before);
}
