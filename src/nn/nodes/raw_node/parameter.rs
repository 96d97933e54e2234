use super::TraitNode;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 参数节点：唯一会被写入梯度、被优化器更新的节点
#[derive(Clone, Default)]
pub(in crate::nn) struct Parameter;

impl TraitNode for Parameter {
    fn type_name(&self) -> &'static str {
        "Parameter"
    }

    fn calc_value_by_parents(&self, _parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation(
            "参数节点的值由初始化或优化器设置，而非由父节点计算".to_string(),
        ))
    }

    fn calc_grad_to_parent(
        &self,
        _parent_index: usize,
        _parents: &[&Tensor],
        _value: &Tensor,
        _upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation("参数节点没有父节点".to_string()))
    }
}
