use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_parents_count, invalid_parent_index};
use crate::tensor::Tensor;

/// 非重叠平均池化（窗口 = 步长 = kernel）
#[derive(Clone)]
pub(in crate::nn) struct AvgPool2d {
    kernel: usize,
}

impl AvgPool2d {
    pub(in crate::nn) const fn new(kernel: usize) -> Self {
        Self { kernel }
    }
}

impl TraitNode for AvgPool2d {
    fn type_name(&self) -> &'static str {
        "AvgPool2d"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        check_parents_count(self.type_name(), parents, 1)?;
        Ok(parents[0].avg_pool2d(self.kernel)?)
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
        Ok(Tensor::avg_pool2d_grad(
            upstream_grad,
            parents[0].shape(),
            self.kernel,
        )?)
    }
}
