use super::tiny_config;
use crate::cyclegan::{
    AlternatingScheduler, CheckpointStore, FileCheckpointStore, InMemoryCheckpointStore,
    ModelState, TrainingCheckpoint,
};

fn checkpoint(epoch: usize, val_loss: Option<f32>) -> TrainingCheckpoint {
    let config = tiny_config();
    let model = ModelState::from_config(&config).unwrap();
    let scheduler = AlternatingScheduler::new(&model, &config);
    TrainingCheckpoint {
        epoch,
        val_loss,
        config,
        parameters: model.snapshot().unwrap(),
        scheduler: scheduler.export_state().unwrap(),
    }
}

fn offer_sequence(store: &mut dyn CheckpointStore, losses: &[f32]) -> Vec<bool> {
    losses
        .iter()
        .enumerate()
        .map(|(i, &loss)| store.offer(&checkpoint(i + 1, Some(loss))).unwrap())
        .collect()
}

#[test]
fn test_in_memory_keeps_best_only() {
    let mut store = InMemoryCheckpointStore::new();
    assert_eq!(offer_sequence(&mut store, &[0.5, 0.3, 0.4]), vec![true, true, false]);
    assert_eq!(store.best(), Some((2, 0.3)));
    assert_eq!(store.load_best().unwrap().unwrap().epoch, 2);
    assert!(store.load_last().unwrap().is_none());
}

#[test]
fn test_nan_or_missing_metric_is_never_best() {
    let mut store = InMemoryCheckpointStore::new();
    assert!(!store.offer(&checkpoint(1, Some(f32::NAN))).unwrap());
    assert!(!store.offer(&checkpoint(2, None)).unwrap());
    assert!(store.best().is_none());
}

#[test]
fn test_file_store_retains_single_best_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileCheckpointStore::open(dir.path()).unwrap();
    offer_sequence(&mut store, &[0.5, 0.3, 0.4]);

    let mut files: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files, vec!["best.json", "epoch=02.ckpt"]);

    let best = store.load_best().unwrap().unwrap();
    assert_eq!(best, checkpoint(2, Some(0.3)));

    // 重新打开目录时读回索引
    let reopened = FileCheckpointStore::open(dir.path()).unwrap();
    assert_eq!(reopened.best(), Some((2, 0.3)));
}

#[test]
fn test_file_store_last_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileCheckpointStore::open(dir.path().join("nested")).unwrap();
    assert!(store.load_last().unwrap().is_none());
    assert!(store.load_best().unwrap().is_none());

    let last = checkpoint(4, None);
    store.save_last(&last).unwrap();
    assert_eq!(store.load_last().unwrap(), Some(last));
    assert!(store.best().is_none());
}

#[test]
fn test_failed_write_keeps_previous_best() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileCheckpointStore::open(dir.path()).unwrap();
    assert!(store.offer(&checkpoint(1, Some(0.5))).unwrap());

    // 目标文件名被目录占用，改名必然失败
    std::fs::create_dir(dir.path().join("epoch=02.ckpt")).unwrap();
    assert!(store.offer(&checkpoint(2, Some(0.3))).is_err());

    assert_eq!(store.best(), Some((1, 0.5)));
    assert_eq!(store.load_best().unwrap().unwrap().epoch, 1);
    assert!(!dir.path().join("epoch=02.tmp").exists());
    let reopened = FileCheckpointStore::open(dir.path()).unwrap();
    assert_eq!(reopened.best(), Some((1, 0.5)));
}
