//! 数据加载错误类型定义

use crate::errors::TensorError;
use thiserror::Error;

/// 数据加载相关错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    /// 样本张量的阶数不对（须为 [N, C, H, W]）
    #[error("{domain} 域张量阶数不对: 期望 {expected}, 实际 {got}")]
    RankMismatch {
        domain: &'static str,
        expected: usize,
        got: usize,
    },

    /// 形状不匹配（两个域的单样本形状不同）
    #[error("形状不匹配: 期望 {expected:?}, 实际 {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// 批大小为0
    #[error("批大小必须大于0")]
    ZeroBatchSize,

    #[error(transparent)]
    Tensor(#[from] TensorError),
}
