/*
 * @Description  : 平均绝对误差（mean 归约），输出 [1, 1]
 *
 * 梯度：∂L/∂a = sign(a − b) / numel（sign(0) = 0），∂L/∂b 取相反数
 */

use super::check_loss_pair;
use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_parents_count, invalid_parent_index};
use crate::tensor::Tensor;

#[derive(Clone, Default)]
pub(in crate::nn) struct L1Loss;

impl TraitNode for L1Loss {
    fn type_name(&self) -> &'static str {
        "L1Loss"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        check_parents_count(self.type_name(), parents, 2)?;
        let (input, target) = (parents[0], parents[1]);
        check_loss_pair(self.type_name(), input, target)?;
        let mean = (input - target).abs().mean();
        Ok(Tensor::new(&[mean], &[1, 1]))
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        let (input, target) = (parents[0], parents[1]);
        let scale = upstream_grad.get_data_number().unwrap_or(1.0) / input.size() as f32;
        let sign = (input - target).sign();
        match parent_index {
            0 => Ok(sign * scale),
            1 => Ok(sign * -scale),
            _ => Err(invalid_parent_index(self.type_name(), parent_index)),
        }
    }
}
