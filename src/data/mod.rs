//! 数据加载模块
//!
//! 提供非配对（unpaired）双域图像的批处理功能。
//!
//! # 主要组件
//!
//! - [`Batch`]: 一个批次，`x`（X 域）与 `y`（Y 域）同形、按第0维分批、互不配对
//! - [`BatchSource`]: 训练/验证循环消费的批次来源，惰性、有限、每个 epoch 可重新开始
//! - [`UnpairedDataLoader`]: 基于内存张量的 `BatchSource` 实现
//! - [`DataError`]: 数据加载错误类型
//!
//! # 使用示例
//!
//! ```ignore
//! use artifact_gan::data::{BatchSource, UnpairedDataLoader};
//!
//! let loader = UnpairedDataLoader::new(images_x, images_y, 2)?
//!     .shuffle(true)
//!     .seed(42);
//!
//! for batch in loader.batches(epoch) {
//!     orchestrator.run_training_batch(&batch)?;
//! }
//! ```

mod dataloader;
pub mod error;


use crate::tensor::Tensor;

pub use dataloader::{UnpairedBatchIter, UnpairedDataLoader};
pub use error::DataError;

/// 一个非配对批次：`x`为含伪影（X 域）样本，`y`为无伪影（Y 域）样本
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub x: Tensor,
    pub y: Tensor,
}

impl Batch {
    pub const fn new(x: Tensor, y: Tensor) -> Self {
        Self { x, y }
    }

    /// 第0维的样本数（以`x`为准）
    pub fn batch_size(&self) -> usize {
        self.x.shape().first().copied().unwrap_or(0)
    }
}

/// 批次来源
///
/// 每次调用`batches`都从头产生一个新的、有限的批次序列；`epoch`可用于决定打乱顺序。
/// 不完整的尾批次应当被丢弃。
pub trait BatchSource {
    fn batches(&self, epoch: usize) -> Box<dyn Iterator<Item = Batch> + '_>;

    fn num_batches(&self) -> usize;
}

/// 预先切好的批次列表（顺序固定，与 epoch 无关）
impl BatchSource for Vec<Batch> {
    fn batches(&self, _epoch: usize) -> Box<dyn Iterator<Item = Batch> + '_> {
        Box::new(self.iter().cloned())
    }

    fn num_batches(&self) -> usize {
        self.len()
    }
}
