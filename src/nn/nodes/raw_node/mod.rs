/*
 * @Description  : 具体节点类型。每种节点只描述“如何由父节点的值计算自身的值”
 *                 以及“如何把上游梯度传给第i个父节点”（VJP），值与梯度的存放由`NodeHandle`负责。
 */

mod input;
mod loss;
mod ops;
mod parameter;

pub(in crate::nn) use input::Input;
pub(in crate::nn) use loss::*;
pub(in crate::nn) use ops::*;
pub(in crate::nn) use parameter::Parameter;

use crate::nn::GraphError;
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
#[derive(Clone)]
pub(in crate::nn) enum NodeType {
    Input,
    Parameter,
    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓算子↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    Add,
    ScalarMultiply,
    MatMul,
    Conv2d,
    ChannelBiasAdd,
    AvgPool2d,
    Flatten,
    LeakyReLU,
    Tanh,
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑算子↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
    BceWithLogitsLoss,
    L1Loss,
}

#[enum_dispatch(NodeType)]
pub(in crate::nn) trait TraitNode {
    /// 节点类型名，用于自动命名和错误信息
    fn type_name(&self) -> &'static str;

    /// 根据父节点的值计算本节点的值（父节点的值在调用前均已存在）
    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError>;

    /// 给定上游梯度`upstream_grad`（与本节点值同形），计算对第`parent_index`个父节点的梯度
    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError>;
}

/// 校验父节点数量
pub(in crate::nn) fn check_parents_count(
    type_name: &str,
    parents: &[&Tensor],
    expected: usize,
) -> Result<(), GraphError> {
    if parents.len() == expected {
        Ok(())
    } else {
        Err(GraphError::InvalidOperation(format!(
            "{type_name}节点需要{expected}个父节点，得到{}个",
            parents.len()
        )))
    }
}

/// 父节点下标越界时的统一错误
pub(in crate::nn) fn invalid_parent_index(type_name: &str, parent_index: usize) -> GraphError {
    GraphError::InvalidOperation(format!("{type_name}节点没有第{parent_index}个父节点"))
}
