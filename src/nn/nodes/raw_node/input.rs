use super::TraitNode;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 输入（常量）节点：数据、标签以及截断梯度后的副本都用它表示，不参与训练
#[derive(Clone, Default)]
pub(in crate::nn) struct Input;

impl TraitNode for Input {
    fn type_name(&self) -> &'static str {
        "Input"
    }

    fn calc_value_by_parents(&self, _parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation(
            "输入节点的值应通过 set_value 设置，而非由父节点计算".to_string(),
        ))
    }

    fn calc_grad_to_parent(
        &self,
        _parent_index: usize,
        _parents: &[&Tensor],
        _value: &Tensor,
        _upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation("输入节点没有父节点".to_string()))
    }
}
