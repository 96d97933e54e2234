/*
 * @Description  : 完整训练循环（fit）、停止请求，以及从检查点恢复训练
 */

mod common;

use artifact_gan::assert_err;
use artifact_gan::cyclegan::{
    CheckpointStore, CycleGanConfig, CycleGanError, FileCheckpointStore,
    InMemoryCheckpointStore, StepKind, TracingSink, TrainingOrchestrator,
};
use artifact_gan::data::UnpairedDataLoader;
use common::{aggregate, init_tracing, random_batches, random_images, tiny_config};

fn loaders(config: &CycleGanConfig) -> (UnpairedDataLoader, UnpairedDataLoader) {
    // 两个域的样本数不同：一个 epoch 的长度取较小者
    let train = UnpairedDataLoader::new(
        random_images(config, 5, 1),
        random_images(config, 4, 2),
        config.batch_size,
    )
    .unwrap()
    .shuffle(true)
    .seed(config.seed);
    let val = UnpairedDataLoader::new(
        random_images(config, 2, 3),
        random_images(config, 2, 4),
        config.batch_size,
    )
    .unwrap();
    (train, val)
}

#[test]
fn test_fit_runs_all_epochs() {
    init_tracing();
    let config = tiny_config();
    let (train, val) = loaders(&config);
    let dir = tempfile::tempdir().unwrap();
    let store = FileCheckpointStore::open(dir.path()).unwrap();
    let mut orchestrator = TrainingOrchestrator::from_config(config.clone(), Box::new(store)).unwrap();
    orchestrator.add_sink(Box::new(TracingSink));

    let report = orchestrator.fit(&train, &val, config.max_epochs).unwrap();

    assert!(!report.stopped_early);
    let epochs: Vec<usize> = report.summaries.iter().map(|s| s.epoch).collect();
    assert_eq!(epochs, vec![1, 2]);
    for summary in &report.summaries {
        assert!(summary.aggregate.get("val_loss").unwrap().is_finite());
    }
    assert_eq!(orchestrator.epochs_completed(), 2);

    // 第1个 epoch 一定成为最佳
    assert!(report.summaries[0].is_best);
    assert!(orchestrator.store().best().is_some());
    let last = orchestrator.store().load_last().unwrap().unwrap();
    assert_eq!(last.epoch, 2);
    assert_eq!(last.parameters, orchestrator.model().snapshot().unwrap());
}

#[test]
fn test_stop_request_before_first_epoch() {
    init_tracing();
    let config = tiny_config();
    let (train, val) = loaders(&config);
    let mut orchestrator =
        TrainingOrchestrator::from_config(config.clone(), Box::new(InMemoryCheckpointStore::new()))
            .unwrap();
    let before = orchestrator.model().snapshot().unwrap();

    let handle = orchestrator.stop_handle();
    std::thread::spawn(move || handle.request_stop())
        .join()
        .unwrap();

    let report = orchestrator.fit(&train, &val, config.max_epochs).unwrap();
    assert!(report.stopped_early);
    assert!(report.summaries.is_empty());
    assert_eq!(orchestrator.model().snapshot().unwrap(), before);

    // 即使提前停止也写入 "last"
    let last = orchestrator.store().load_last().unwrap().unwrap();
    assert_eq!(last.epoch, 0);
    assert_eq!(last.val_loss, None);
    assert!(orchestrator.store().best().is_none());
}

#[test]
fn test_resume_restores_state_and_continues() {
    init_tracing();
    let config = tiny_config();
    let (train, val) = loaders(&config);
    let dir = tempfile::tempdir().unwrap();

    let mut first = TrainingOrchestrator::from_config(
        config.clone(),
        Box::new(FileCheckpointStore::open(dir.path()).unwrap()),
    )
    .unwrap();
    first.fit(&train, &val, 2).unwrap();

    // 新进程：同样的配置，不同的初始参数
    let reopened = FileCheckpointStore::open(dir.path()).unwrap();
    let mut second = TrainingOrchestrator::from_config(
        CycleGanConfig {
            seed: config.seed + 1,
            ..config.clone()
        },
        Box::new(InMemoryCheckpointStore::new()),
    )
    .unwrap();
    assert_ne!(second.model().snapshot().unwrap(), first.model().snapshot().unwrap());

    assert_eq!(second.resume(&reopened).unwrap(), Some(2));
    assert_eq!(second.epochs_completed(), 2);
    assert_eq!(second.model().snapshot().unwrap(), first.model().snapshot().unwrap());
    assert_eq!(
        second.scheduler().export_state().unwrap(),
        first.scheduler().export_state().unwrap()
    );

    // 已完成2个 epoch，max_epochs=3 时只再训练1个
    let report = second.fit(&train, &val, 3).unwrap();
    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.summaries[0].epoch, 3);
}

#[test]
fn test_resume_from_empty_store() {
    init_tracing();
    let mut orchestrator =
        TrainingOrchestrator::from_config(tiny_config(), Box::new(InMemoryCheckpointStore::new()))
            .unwrap();
    assert_eq!(
        orchestrator
            .resume(&InMemoryCheckpointStore::new())
            .unwrap(),
        None
    );
    assert_eq!(orchestrator.epochs_completed(), 0);
}

#[test]
fn test_resume_with_mismatched_architecture() {
    init_tracing();
    let config = tiny_config();
    let (train, val) = loaders(&config);
    let mut trained =
        TrainingOrchestrator::from_config(config.clone(), Box::new(InMemoryCheckpointStore::new()))
            .unwrap();
    trained.fit(&train, &val, 1).unwrap();

    let mut wider = TrainingOrchestrator::from_config(
        CycleGanConfig {
            n_filters: 4,
            ..config
        },
        Box::new(InMemoryCheckpointStore::new()),
    )
    .unwrap();
    let before = wider.model().snapshot().unwrap();
    let scheduler_before = wider.scheduler().export_state().unwrap();

    assert_err!(
        wider.resume(trained.store()),
        CycleGanError::CheckpointRestoreMismatch { .. }
    );
    assert_eq!(wider.epochs_completed(), 0);
    assert_eq!(wider.model().snapshot().unwrap(), before);
    assert_eq!(wider.scheduler().export_state().unwrap(), scheduler_before);
}

#[test]
fn test_resume_after_run_without_fit_returning() {
    init_tracing();
    let config = tiny_config();
    let (train, val) = loaders(&config);
    let dir = tempfile::tempdir().unwrap();
    let open_orchestrator = || {
        TrainingOrchestrator::from_config(
            config.clone(),
            Box::new(FileCheckpointStore::open(dir.path()).unwrap()),
        )
        .unwrap()
    };

    // 第一次运行：fit 完成1个 epoch
    open_orchestrator().fit(&train, &val, 1).unwrap();

    // 第二次运行：恢复后手动再跑2个 epoch，然后“中断”（fit 从未返回）
    let mut second = open_orchestrator();
    let store = FileCheckpointStore::open(dir.path()).unwrap();
    assert_eq!(second.resume(&store).unwrap(), Some(1));
    let batches = random_batches(&config, 2, 50);
    for _ in 0..2 {
        for batch in &batches {
            second.run_training_batch(batch).unwrap();
        }
        let aggregate = second.run_validation_epoch(&val).unwrap();
        second.end_epoch(aggregate).unwrap();
    }

    // 第三次运行：从最近完成的 epoch 继续
    let mut third = open_orchestrator();
    let store = FileCheckpointStore::open(dir.path()).unwrap();
    assert_eq!(third.resume(&store).unwrap(), Some(3));
    assert_eq!(third.model().snapshot().unwrap(), second.model().snapshot().unwrap());
    assert_eq!(
        third.scheduler().export_state().unwrap(),
        second.scheduler().export_state().unwrap()
    );
    assert_eq!(third.scheduler().phase(), StepKind::GeneratorStep);
}

#[test]
fn test_resume_prefers_newer_best_over_stale_last() {
    init_tracing();
    let mut trained =
        TrainingOrchestrator::from_config(tiny_config(), Box::new(InMemoryCheckpointStore::new()))
            .unwrap();
    trained.end_epoch(aggregate(1.0, 1.0)).unwrap();
    let stale_last = trained.store().load_last().unwrap().unwrap();
    trained.end_epoch(aggregate(0.5, 0.5)).unwrap();
    trained.end_epoch(aggregate(0.4, 0.4)).unwrap();
    let newest_best = trained.store().load_best().unwrap().unwrap();
    assert_eq!((stale_last.epoch, newest_best.epoch), (1, 3));

    let mut store = InMemoryCheckpointStore::new();
    store.offer(&newest_best).unwrap();
    store.save_last(&stale_last).unwrap();

    let mut resumed =
        TrainingOrchestrator::from_config(tiny_config(), Box::new(InMemoryCheckpointStore::new()))
            .unwrap();
    assert_eq!(resumed.resume(&store).unwrap(), Some(3));
    assert_eq!(resumed.epochs_completed(), 3);
}

#[test]
fn test_resume_with_mismatched_hyperparameters() {
    init_tracing();
    let config = tiny_config();
    let (train, val) = loaders(&config);
    let mut trained =
        TrainingOrchestrator::from_config(config.clone(), Box::new(InMemoryCheckpointStore::new()))
            .unwrap();
    trained.fit(&train, &val, 1).unwrap();

    let mut retuned = TrainingOrchestrator::from_config(
        CycleGanConfig {
            lambda_cycle: 1.0,
            patience: 2,
            factor: 0.1,
            learning_rate: 1e-2,
            ..config
        },
        Box::new(InMemoryCheckpointStore::new()),
    )
    .unwrap();
    let before = retuned.model().snapshot().unwrap();

    assert_err!(
        retuned.resume(trained.store()),
        CycleGanError::CheckpointRestoreMismatch { reason }
            if ["lambda_cycle", "learning_rate", "patience", "factor"]
                .iter()
                .all(|field| reason.contains(field))
    );
    assert_eq!(retuned.epochs_completed(), 0);
    assert_eq!(retuned.model().snapshot().unwrap(), before);
    assert_eq!(
        retuned
            .scheduler()
            .group(StepKind::GeneratorStep)
            .learning_rate(),
        1e-2
    );
}
