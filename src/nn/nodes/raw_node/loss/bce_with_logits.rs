/*
 * @Description  : 带 logits 的二元交叉熵（mean 归约），输出 [1, 1]
 *
 * 数值稳定形式：ℓ(z, t) = max(z, 0) − z·t + ln(1 + e^{−|z|})
 * 梯度：∂L/∂z = (sigmoid(z) − t) / N，∂L/∂t = −z / N
 *
 * 父节点：
 * - parents[0]: logits
 * - parents[1]: 目标（通常是 0/1 常量）
 */

use super::check_loss_pair;
use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_parents_count, invalid_parent_index};
use crate::tensor::Tensor;

#[derive(Clone, Default)]
pub(in crate::nn) struct BceWithLogitsLoss;

impl TraitNode for BceWithLogitsLoss {
    fn type_name(&self) -> &'static str {
        "BceWithLogitsLoss"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        check_parents_count(self.type_name(), parents, 2)?;
        let (logits, target) = (parents[0], parents[1]);
        check_loss_pair(self.type_name(), logits, target)?;
        let per_element =
            logits.zip_map(target, |z, t| z.max(0.0) - z * t + (-z.abs()).exp().ln_1p());
        Ok(Tensor::new(&[per_element.mean()], &[1, 1]))
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        let (logits, target) = (parents[0], parents[1]);
        let scale = upstream_grad.get_data_number().unwrap_or(1.0) / logits.size() as f32;
        match parent_index {
            0 => Ok((&logits.sigmoid() - target) * scale),
            1 => Ok(-logits * scale),
            _ => Err(invalid_parent_index(self.type_name(), parent_index)),
        }
    }
}
