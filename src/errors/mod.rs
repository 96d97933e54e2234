/*
 * @Description  : 张量层面的错误类型
 */

use thiserror::Error;
mod ops;
pub use self::ops::*;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TensorError {
    // 张量二元运算
    #[error(
        "形状不一致，故无法{operator}：第一个张量的形状为{tensor1_shape:?}，第二个张量的形状为{tensor2_shape:?}"
    )]
    OperatorError {
        operator: Operator,
        tensor1_shape: Vec<usize>,
        tensor2_shape: Vec<usize>,
    },
    #[error("数据长度{data_len}与形状{shape:?}不匹配")]
    DataShapeMismatch { data_len: usize, shape: Vec<usize> },
    #[error("张量形状不兼容：无法从{from:?}变为{to:?}")]
    IncompatibleShape { from: Vec<usize>, to: Vec<usize> },
    #[error("索引{index}越界（该维长度为{len}）")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("张量不是图像：{0}")]
    NotAnImage(String),
}
