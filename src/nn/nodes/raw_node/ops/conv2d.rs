/*
 * @Description  : 2D 卷积节点（PyTorch 风格，单节点处理多通道）
 *
 * 父节点：
 * - parents[0]: 输入数据 [batch, C_in, H, W]
 * - parents[1]: 卷积核参数 [C_out, C_in, kH, kW]
 * 输出：[batch, C_out, H', W']
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_parents_count, invalid_parent_index};
use crate::tensor::Tensor;

#[derive(Clone)]
pub(in crate::nn) struct Conv2d {
    stride: (usize, usize),
    padding: (usize, usize),
}

impl Conv2d {
    pub(in crate::nn) const fn new(stride: (usize, usize), padding: (usize, usize)) -> Self {
        Self { stride, padding }
    }
}

impl TraitNode for Conv2d {
    fn type_name(&self) -> &'static str {
        "Conv2d"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        check_parents_count(self.type_name(), parents, 2)?;
        let (input, kernel) = (parents[0], parents[1]);
        if input.dimension() != 4 || kernel.dimension() != 4 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: input.shape().to_vec(),
                message: format!(
                    "Conv2d 输入须为 4D [batch, C_in, H, W]、卷积核须为 4D [C_out, C_in, kH, kW]，得到输入{:?}、卷积核{:?}",
                    input.shape(),
                    kernel.shape()
                ),
            });
        }
        if input.shape()[1] != kernel.shape()[1] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![kernel.shape()[1]],
                got: vec![input.shape()[1]],
                message: format!(
                    "输入通道数 {} 与卷积核输入通道数 {} 不匹配",
                    input.shape()[1],
                    kernel.shape()[1]
                ),
            });
        }
        Ok(input.conv2d(kernel, self.stride, self.padding)?)
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        let (input, kernel) = (parents[0], parents[1]);
        match parent_index {
            0 => Ok(Tensor::conv2d_grad_input(
                upstream_grad,
                kernel,
                input.shape(),
                self.stride,
                self.padding,
            )?),
            1 => Ok(Tensor::conv2d_grad_kernel(
                upstream_grad,
                input,
                kernel.shape(),
                self.stride,
                self.padding,
            )?),
            _ => Err(invalid_parent_index(self.type_name(), parent_index)),
        }
    }
}
