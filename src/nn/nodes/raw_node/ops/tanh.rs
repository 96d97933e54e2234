use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_parents_count, invalid_parent_index};
use crate::tensor::Tensor;

#[derive(Clone, Default)]
pub(in crate::nn) struct Tanh;

impl TraitNode for Tanh {
    fn type_name(&self) -> &'static str {
        "Tanh"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        check_parents_count(self.type_name(), parents, 1)?;
        Ok(parents[0].map(f32::tanh))
    }

    // dy/dx = 1 - y²，直接复用本节点的值
    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        _parents: &[&Tensor],
        value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        if parent_index != 0 {
            return Err(invalid_parent_index(self.type_name(), parent_index));
        }
        Ok(value.zip_map(upstream_grad, |y, g| (1.0 - y * y) * g))
    }
}
