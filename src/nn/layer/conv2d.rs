/*
 * @Description  : Conv2d (2D 卷积) 层 - PyTorch 风格 API
 *
 * 输入/输出形状：
 * - 输入：[batch_size, in_channels, H, W]
 * - 输出：[batch_size, out_channels, H', W']
 *
 * 输出尺寸计算：
 * H' = (H + 2*padding_h - kernel_h) / stride_h + 1
 * W' = (W + 2*padding_w - kernel_w) / stride_w + 1
 *
 * 计算：output = conv2d(x, K) + b
 */

use crate::nn::{Graph, GraphError, Init, Module, Var};

/// Conv2d (2D 卷积) 层
///
/// ```ignore
/// let conv = Conv2d::new(&graph, 1, 32, (3, 3), (1, 1), (1, 1), true, "conv1")?;
/// let h = conv.forward(&x)?.leaky_relu(0.2)?;
/// ```
pub struct Conv2d {
    /// 卷积核参数 [out_channels, in_channels, kernel_h, kernel_w]
    kernel: Var,
    /// 偏置参数 [1, out_channels]（可选）
    bias: Option<Var>,
    in_channels: usize,
    out_channels: usize,
    stride: (usize, usize),
    padding: (usize, usize),
    name: String,
}

impl Conv2d {
    /// 创建新的 Conv2d 层：卷积核 Kaiming 初始化（参数名`{name}_K`），偏置零初始化（`{name}_b`）
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: &Graph,
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize),
        stride: (usize, usize),
        padding: (usize, usize),
        use_bias: bool,
        name: &str,
    ) -> Result<Self, GraphError> {
        let (k_h, k_w) = kernel_size;
        let kernel = graph.parameter(
            &[out_channels, in_channels, k_h, k_w],
            Init::Kaiming,
            &format!("{name}_K"),
        )?;
        let bias = if use_bias {
            Some(graph.parameter(&[1, out_channels], Init::Zeros, &format!("{name}_b"))?)
        } else {
            None
        };

        Ok(Self {
            kernel,
            bias,
            in_channels,
            out_channels,
            stride,
            padding,
            name: name.to_string(),
        })
    }

    /// 计算 `conv2d(x, K) + b`
    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let (stride, padding) = (self.stride, self.padding);
        let conv_out = x.binary_op(&self.kernel, "卷积", |g, input, kernel| {
            g.new_conv2d_node(input, kernel, stride, padding, None)
        })?;
        match &self.bias {
            Some(bias) => conv_out.binary_op(bias, "通道偏置加法", |g, input, bias| {
                g.new_channel_bias_add_node(input, bias, None)
            }),
            None => Ok(conv_out),
        }
    }

    pub const fn kernel(&self) -> &Var {
        &self.kernel
    }

    pub const fn bias(&self) -> Option<&Var> {
        self.bias.as_ref()
    }

    pub const fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub const fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Module for Conv2d {
    fn parameters(&self) -> Vec<Var> {
        let mut params = vec![self.kernel.clone()];
        params.extend(self.bias.clone());
        params
    }
}
