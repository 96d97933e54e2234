/*
 * @Description  : CycleGAN 训练协议的错误类型
 */

use crate::data::DataError;
use crate::errors::TensorError;
use crate::nn::GraphError;
use thiserror::Error;

/// 训练编排过程中的错误；任何错误都不会在内部重试
#[derive(Debug, Error)]
pub enum CycleGanError {
    /// 批次形状与配置不符（在任何前向传播之前检查）
    #[error("形状不匹配：期望{expected:?}，实际{actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("验证集为空，无法计算验证指标")]
    EmptyValidationSet,

    /// 某个损失项出现 NaN/inf，训练已发散
    #[error("损失项{term}发散：{value}")]
    DivergedLoss { term: String, value: f32 },

    /// 检查点与当前模型/配置不一致（在任何训练步之前检测）
    #[error("检查点无法恢复：{reason}")]
    CheckpointRestoreMismatch { reason: String },

    /// 聚合记录缺少所需的指标
    #[error("缺少指标{0}")]
    MissingMetric(String),

    #[error("配置无效：{0}")]
    InvalidConfig(String),

    #[error("序列化失败：{0}")]
    Serialization(String),

    #[error("日志输出失败：{0}")]
    Sink(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Tensor(#[from] TensorError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CycleGanError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for CycleGanError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
