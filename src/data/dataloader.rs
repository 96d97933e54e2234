/*
 * @Description  : UnpairedDataLoader - 非配对双域数据的批量加载器
 *
 * 提供统一的数据迭代 API，支持：
 * - 自动分批 (batch_size)
 * - 随机打乱 (shuffle)，两个域各自独立打乱
 * - 丢弃不完整批次 (drop_last，默认开启)
 */

use super::{Batch, BatchSource, DataError};
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// UnpairedDataLoader - 持有两个域的样本张量，每个 epoch 产生一个批次序列
///
/// 两个域的样本数可以不同；一个 epoch 的样本数取两者中较小的那个。
///
/// # 示例
/// ```ignore
/// let train = UnpairedDataLoader::new(x, y, 2)?.shuffle(true).seed(42);
/// let val = UnpairedDataLoader::new(val_x, val_y, 2)?;
/// ```
#[derive(Debug)]
pub struct UnpairedDataLoader {
    x: Tensor,
    y: Tensor,
    batch_size: usize,
    shuffle: bool,
    drop_last: bool,
    seed: Option<u64>,
}

impl UnpairedDataLoader {
    /// 创建新的 UnpairedDataLoader
    ///
    /// # 参数
    /// - `x`: X 域样本 [Nx, C, H, W]
    /// - `y`: Y 域样本 [Ny, C, H, W]，单样本形状须与`x`一致
    /// - `batch_size`: 批大小
    pub fn new(x: Tensor, y: Tensor, batch_size: usize) -> Result<Self, DataError> {
        if batch_size == 0 {
            return Err(DataError::ZeroBatchSize);
        }
        for (domain, tensor) in [("X", &x), ("Y", &y)] {
            if tensor.dimension() != 4 {
                return Err(DataError::RankMismatch {
                    domain,
                    expected: 4,
                    got: tensor.dimension(),
                });
            }
        }
        if x.shape()[1..] != y.shape()[1..] {
            return Err(DataError::ShapeMismatch {
                expected: x.shape().to_vec(),
                got: y.shape().to_vec(),
            });
        }
        Ok(Self {
            x,
            y,
            batch_size,
            shuffle: false,
            drop_last: true,
            seed: None,
        })
    }

    /// 设置是否打乱数据
    pub const fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// 设置是否丢弃最后一个不完整的批次
    pub const fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    /// 设置随机种子（用于 shuffle；实际种子还会混入 epoch）
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 一个 epoch 使用的样本数
    pub fn len(&self) -> usize {
        self.x.shape()[0].min(self.y.shape()[0])
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 创建某个 epoch 的迭代器
    pub fn iter_epoch(&self, epoch: usize) -> UnpairedBatchIter<'_> {
        let mut x_indices: Vec<usize> = (0..self.x.shape()[0]).collect();
        let mut y_indices: Vec<usize> = (0..self.y.shape()[0]).collect();

        if self.shuffle {
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed ^ epoch as u64),
                None => StdRng::from_entropy(),
            };
            x_indices.shuffle(&mut rng);
            y_indices.shuffle(&mut rng);
        }

        let len = self.len();
        x_indices.truncate(len);
        y_indices.truncate(len);

        UnpairedBatchIter {
            loader: self,
            x_indices,
            y_indices,
            current_batch: 0,
        }
    }
}

impl BatchSource for UnpairedDataLoader {
    fn batches(&self, epoch: usize) -> Box<dyn Iterator<Item = Batch> + '_> {
        Box::new(self.iter_epoch(epoch))
    }

    fn num_batches(&self) -> usize {
        let n = self.len();
        if self.drop_last {
            n / self.batch_size
        } else {
            n.div_ceil(self.batch_size)
        }
    }
}

/// UnpairedDataLoader 迭代器
pub struct UnpairedBatchIter<'a> {
    loader: &'a UnpairedDataLoader,
    x_indices: Vec<usize>,
    y_indices: Vec<usize>,
    current_batch: usize,
}

impl Iterator for UnpairedBatchIter<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.x_indices.len();
        let batch_size = self.loader.batch_size;
        let start = self.current_batch * batch_size;

        // 检查是否还有数据
        if start >= n {
            return None;
        }

        let end = (start + batch_size).min(n);

        // 如果 drop_last 且批次不完整，则结束
        if self.loader.drop_last && end - start < batch_size {
            return None;
        }

        self.current_batch += 1;

        // 索引来自本加载器自身的样本范围，不会越界
        let x = self.loader.x.select_samples(&self.x_indices[start..end]).ok()?;
        let y = self.loader.y.select_samples(&self.y_indices[start..end]).ok()?;
        Some(Batch::new(x, y))
    }
}
