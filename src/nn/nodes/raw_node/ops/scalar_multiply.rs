use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_parents_count, invalid_parent_index};
use crate::tensor::Tensor;

/// 乘以固定纯数（损失加权、取平均等）
#[derive(Clone)]
pub(in crate::nn) struct ScalarMultiply {
    factor: f32,
}

impl ScalarMultiply {
    pub(in crate::nn) const fn new(factor: f32) -> Self {
        Self { factor }
    }
}

impl TraitNode for ScalarMultiply {
    fn type_name(&self) -> &'static str {
        "ScalarMultiply"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        check_parents_count(self.type_name(), parents, 1)?;
        Ok(parents[0] * self.factor)
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        _parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        if parent_index != 0 {
            return Err(invalid_parent_index(self.type_name(), parent_index));
        }
        Ok(upstream_grad * self.factor)
    }
}
