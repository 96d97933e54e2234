use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_parents_count, invalid_parent_index};
use crate::tensor::Tensor;

/// 矩阵乘法：[n, k] x [k, m] -> [n, m]
#[derive(Clone, Default)]
pub(in crate::nn) struct MatMul;

impl TraitNode for MatMul {
    fn type_name(&self) -> &'static str {
        "MatMul"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        check_parents_count(self.type_name(), parents, 2)?;
        Ok(parents[0].mat_mul(parents[1])?)
    }

    // Y = A·B  =>  dA = G·Bᵀ，dB = Aᵀ·G
    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        match parent_index {
            0 => Ok(upstream_grad.mat_mul(&parents[1].transpose())?),
            1 => Ok(parents[0].transpose().mat_mul(upstream_grad)?),
            _ => Err(invalid_parent_index(self.type_name(), parent_index)),
        }
    }
}
