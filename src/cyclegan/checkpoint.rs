/*
 * @Description  : 训练检查点与存储（按 val_loss 保留最好的一个，另有 "last" 检查点）
 */

use super::{CycleGanConfig, CycleGanError, ParameterSnapshot, SchedulerState};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// 恢复训练所需的全部状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingCheckpoint {
    /// 已完成的 epoch 数（从1开始计）
    pub epoch: usize,
    pub val_loss: Option<f32>,
    pub config: CycleGanConfig,
    pub parameters: Vec<ParameterSnapshot>,
    pub scheduler: SchedulerState,
}

impl TrainingCheckpoint {
    /// `val_loss`是否严格优于`best`（越小越好；NaN 永远不是更优）
    fn improves_on(&self, best: Option<f32>) -> bool {
        match (self.val_loss, best) {
            (Some(v), _) if v.is_nan() => false,
            (Some(_), None) => true,
            (Some(v), Some(b)) => v < b,
            (None, _) => false,
        }
    }
}

/// 检查点存储
pub trait CheckpointStore {
    /// 按 top-1 规则提交一个检查点；若它成为新的最佳则返回 true
    fn offer(&mut self, checkpoint: &TrainingCheckpoint) -> Result<bool, CycleGanError>;

    fn save_last(&mut self, checkpoint: &TrainingCheckpoint) -> Result<(), CycleGanError>;

    fn load_last(&self) -> Result<Option<TrainingCheckpoint>, CycleGanError>;

    fn load_best(&self) -> Result<Option<TrainingCheckpoint>, CycleGanError>;

    /// 当前最佳检查点的（epoch, val_loss）
    fn best(&self) -> Option<(usize, f32)>;
}

// ==================== 内存存储 ====================

#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    best: Option<TrainingCheckpoint>,
    last: Option<TrainingCheckpoint>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn offer(&mut self, checkpoint: &TrainingCheckpoint) -> Result<bool, CycleGanError> {
        let current = self.best().map(|(_, loss)| loss);
        if checkpoint.improves_on(current) {
            self.best = Some(checkpoint.clone());
            return Ok(true);
        }
        Ok(false)
    }

    fn save_last(&mut self, checkpoint: &TrainingCheckpoint) -> Result<(), CycleGanError> {
        self.last = Some(checkpoint.clone());
        Ok(())
    }

    fn load_last(&self) -> Result<Option<TrainingCheckpoint>, CycleGanError> {
        Ok(self.last.clone())
    }

    fn load_best(&self) -> Result<Option<TrainingCheckpoint>, CycleGanError> {
        Ok(self.best.clone())
    }

    fn best(&self) -> Option<(usize, f32)> {
        let best = self.best.as_ref()?;
        Some((best.epoch, best.val_loss?))
    }
}

// ==================== 文件存储 ====================

const BEST_INDEX: &str = "best.json";
const LAST_FILE: &str = "last.ckpt";

/// `best.json`的内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BestEntry {
    epoch: usize,
    val_loss: f32,
    file: String,
}

/// 目录下的文件存储：
/// - `epoch=NN.ckpt`：当前最佳（bincode），被更优者取代时删除
/// - `best.json`：最佳检查点的索引
/// - `last.ckpt`：最近一次`save_last`
#[derive(Debug)]
pub struct FileCheckpointStore {
    dir: PathBuf,
    best: Option<BestEntry>,
}

impl FileCheckpointStore {
    /// 打开（必要时创建）目录；已有的`best.json`会被读入
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, CycleGanError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let index = dir.join(BEST_INDEX);
        let best = if index.exists() {
            Some(serde_json::from_str(&fs::read_to_string(index)?)?)
        } else {
            None
        };
        Ok(Self { dir, best })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 当前最佳检查点文件的路径
    pub fn best_path(&self) -> Option<PathBuf> {
        self.best.as_ref().map(|entry| self.dir.join(&entry.file))
    }

    /// 先写入同目录下的`.tmp`文件并落盘，成功后再改名覆盖`path`；失败时`path`保持原样
    fn write_atomically<F>(path: &Path, fill: F) -> Result<(), CycleGanError>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<(), CycleGanError>,
    {
        let tmp = path.with_extension("tmp");
        let result = File::create(&tmp)
            .map_err(CycleGanError::from)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                fill(&mut writer)?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
                Ok(())
            })
            .and_then(|()| Ok(fs::rename(&tmp, path)?));
        if result.is_err() && tmp.exists() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    fn write(path: &Path, checkpoint: &TrainingCheckpoint) -> Result<(), CycleGanError> {
        Self::write_atomically(path, |writer| Ok(bincode::serialize_into(writer, checkpoint)?))
    }

    fn read(path: &Path) -> Result<Option<TrainingCheckpoint>, CycleGanError> {
        if !path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(Some(bincode::deserialize_from(reader)?))
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn offer(&mut self, checkpoint: &TrainingCheckpoint) -> Result<bool, CycleGanError> {
        let current = self.best.as_ref().map(|entry| entry.val_loss);
        let Some(val_loss) = checkpoint.val_loss.filter(|_| checkpoint.improves_on(current))
        else {
            return Ok(false);
        };

        let entry = BestEntry {
            epoch: checkpoint.epoch,
            val_loss,
            file: format!("epoch={:02}.ckpt", checkpoint.epoch),
        };
        // 新检查点与索引都写好之后才删除旧的最佳文件
        Self::write(&self.dir.join(&entry.file), checkpoint)?;
        Self::write_atomically(&self.dir.join(BEST_INDEX), |writer| {
            Ok(serde_json::to_writer_pretty(writer, &entry)?)
        })?;
        if let Some(old) = self.best.replace(entry) {
            let old_path = self.dir.join(&old.file);
            if self.best_path().as_deref() != Some(old_path.as_path()) && old_path.exists() {
                fs::remove_file(old_path)?;
            }
        }
        tracing::info!("保存最佳检查点：epoch {}，val_loss={val_loss:.4}", checkpoint.epoch);
        Ok(true)
    }

    fn save_last(&mut self, checkpoint: &TrainingCheckpoint) -> Result<(), CycleGanError> {
        Self::write(&self.dir.join(LAST_FILE), checkpoint)
    }

    fn load_last(&self) -> Result<Option<TrainingCheckpoint>, CycleGanError> {
        Self::read(&self.dir.join(LAST_FILE))
    }

    fn load_best(&self) -> Result<Option<TrainingCheckpoint>, CycleGanError> {
        match self.best_path() {
            Some(path) => Self::read(&path),
            None => Ok(None),
        }
    }

    fn best(&self) -> Option<(usize, f32)> {
        self.best.as_ref().map(|entry| (entry.epoch, entry.val_loss))
    }
}
