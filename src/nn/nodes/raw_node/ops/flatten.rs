use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_parents_count, invalid_parent_index};
use crate::tensor::Tensor;

/// 保留第0维（batch），其余维度展平：[N, ...] -> [N, prod(...)]
#[derive(Clone, Default)]
pub(in crate::nn) struct Flatten;

impl TraitNode for Flatten {
    fn type_name(&self) -> &'static str {
        "Flatten"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        check_parents_count(self.type_name(), parents, 1)?;
        let input = parents[0];
        let batch = input.shape().first().copied().ok_or_else(|| {
            GraphError::InvalidOperation("Flatten 不能作用于0阶张量".to_string())
        })?;
        let features = input.shape()[1..].iter().product::<usize>();
        Ok(input.reshape(&[batch, features])?)
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        if parent_index != 0 {
            return Err(invalid_parent_index(self.type_name(), parent_index));
        }
        Ok(upstream_grad.reshape(parents[0].shape())?)
    }
}
