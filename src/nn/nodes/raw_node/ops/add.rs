/*
 * @Description  : 加法节点。两个父节点形状一致时逐元素相加；
 *                 第二个父节点为[1, m]而第一个为[n, m]时按行广播（用于全连接层偏置）。
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_parents_count, invalid_parent_index};
use crate::tensor::Tensor;

#[derive(Clone, Default)]
pub(in crate::nn) struct Add;

impl Add {
    fn is_row_broadcast(a: &Tensor, b: &Tensor) -> bool {
        matches!((a.shape(), b.shape()), ([_, m], [1, k]) if m == k)
    }
}

impl TraitNode for Add {
    fn type_name(&self) -> &'static str {
        "Add"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        check_parents_count(self.type_name(), parents, 2)?;
        let (a, b) = (parents[0], parents[1]);
        if a.is_same_shape(b) {
            return Ok(a + b);
        }
        if Self::is_row_broadcast(a, b) {
            let rows = a.shape()[0];
            let broadcast = Tensor::ones(&[rows, 1]).mat_mul(b)?;
            return Ok(a + &broadcast);
        }
        Err(GraphError::ShapeMismatch {
            expected: a.shape().to_vec(),
            got: b.shape().to_vec(),
            message: "Add节点的两个父节点形状须一致，或第二个为可按行广播的[1, m]".to_string(),
        })
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        match parent_index {
            0 => Ok(upstream_grad.clone()),
            1 if parents[1].is_same_shape(upstream_grad) => Ok(upstream_grad.clone()),
            1 => Ok(upstream_grad.sum_rows_keepdim()),
            _ => Err(invalid_parent_index(self.type_name(), parent_index)),
        }
    }
}
