use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_parents_count, invalid_parent_index};
use crate::tensor::Tensor;

/// 卷积输出 [batch, C, H, W] 加逐通道偏置 [1, C]
#[derive(Clone, Default)]
pub(in crate::nn) struct ChannelBiasAdd;

impl TraitNode for ChannelBiasAdd {
    fn type_name(&self) -> &'static str {
        "ChannelBiasAdd"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        check_parents_count(self.type_name(), parents, 2)?;
        Ok(parents[0].add_channel_bias(parents[1])?)
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        _parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        match parent_index {
            0 => Ok(upstream_grad.clone()),
            1 => Ok(upstream_grad.sum_per_channel()),
            _ => Err(invalid_parent_index(self.type_name(), parent_index)),
        }
    }
}
