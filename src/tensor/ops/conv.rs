/*
 * @Description  : 2D卷积、平均池化与通道偏置的张量级实现（前向与反向），供计算图节点调用。
 *                 约定 Batch-First：输入为 [batch, C, H, W]，卷积核为 [C_out, C_in, kH, kW]。
 */

use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use ndarray::{Array4, ArrayView4, Ix4};

fn view4(tensor: &Tensor) -> Result<ArrayView4<'_, f32>, TensorError> {
    tensor
        .array()
        .view()
        .into_dimensionality::<Ix4>()
        .map_err(|_| TensorError::IncompatibleShape {
            from: tensor.shape().to_vec(),
            to: vec![0, 0, 0, 0],
        })
}

/// 卷积输出的空间尺寸；输入（含填充）小于卷积核时返回None
pub fn conv2d_output_size(
    input_hw: (usize, usize),
    kernel_hw: (usize, usize),
    stride: (usize, usize),
    padding: (usize, usize),
) -> Option<(usize, usize)> {
    let padded_h = input_hw.0 + 2 * padding.0;
    let padded_w = input_hw.1 + 2 * padding.1;
    if stride.0 == 0 || stride.1 == 0 || padded_h < kernel_hw.0 || padded_w < kernel_hw.1 {
        return None;
    }
    Some((
        (padded_h - kernel_hw.0) / stride.0 + 1,
        (padded_w - kernel_hw.1) / stride.1 + 1,
    ))
}

impl Tensor {
    /// 2D卷积（互相关）。填充区域视为0
    pub fn conv2d(
        &self,
        kernel: &Tensor,
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Tensor, TensorError> {
        let input = view4(self)?;
        let k = view4(kernel)?;
        let (batch, in_c, in_h, in_w) = input.dim();
        let (out_c, k_in_c, k_h, k_w) = k.dim();
        if in_c != k_in_c {
            return Err(TensorError::OperatorError {
                operator: Operator::Conv2d,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: kernel.shape().to_vec(),
            });
        }
        let (out_h, out_w) = conv2d_output_size((in_h, in_w), (k_h, k_w), stride, padding)
            .ok_or_else(|| TensorError::OperatorError {
                operator: Operator::Conv2d,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: kernel.shape().to_vec(),
            })?;

        let mut output = Array4::<f32>::zeros((batch, out_c, out_h, out_w));
        for b in 0..batch {
            for oc in 0..out_c {
                for oh in 0..out_h {
                    for ow in 0..out_w {
                        let mut sum = 0.0f32;
                        for ic in 0..in_c {
                            for kh in 0..k_h {
                                let Some(ih) = source_index(oh, kh, stride.0, padding.0, in_h)
                                else {
                                    continue;
                                };
                                for kw in 0..k_w {
                                    let Some(iw) = source_index(ow, kw, stride.1, padding.1, in_w)
                                    else {
                                        continue;
                                    };
                                    sum += input[[b, ic, ih, iw]] * k[[oc, ic, kh, kw]];
                                }
                            }
                        }
                        output[[b, oc, oh, ow]] = sum;
                    }
                }
            }
        }
        Ok(Tensor::from_array(output.into_dyn()))
    }

    /// 卷积对输入的梯度：把上游梯度按卷积核“撒回”输入的对应位置（即转置卷积）
    pub fn conv2d_grad_input(
        upstream: &Tensor,
        kernel: &Tensor,
        input_shape: &[usize],
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Tensor, TensorError> {
        let grad = view4(upstream)?;
        let k = view4(kernel)?;
        let (batch, out_c, out_h, out_w) = grad.dim();
        let (_, in_c, k_h, k_w) = k.dim();
        let [_, _, in_h, in_w] = *input_shape else {
            return Err(TensorError::IncompatibleShape {
                from: input_shape.to_vec(),
                to: vec![0, 0, 0, 0],
            });
        };

        let mut result = Array4::<f32>::zeros((batch, in_c, in_h, in_w));
        for b in 0..batch {
            for oc in 0..out_c {
                for oh in 0..out_h {
                    for ow in 0..out_w {
                        let g = grad[[b, oc, oh, ow]];
                        if g == 0.0 {
                            continue;
                        }
                        for ic in 0..in_c {
                            for kh in 0..k_h {
                                let Some(ih) = source_index(oh, kh, stride.0, padding.0, in_h)
                                else {
                                    continue;
                                };
                                for kw in 0..k_w {
                                    let Some(iw) = source_index(ow, kw, stride.1, padding.1, in_w)
                                    else {
                                        continue;
                                    };
                                    result[[b, ic, ih, iw]] += g * k[[oc, ic, kh, kw]];
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(Tensor::from_array(result.into_dyn()))
    }

    /// 卷积对卷积核的梯度：输入与上游梯度的互相关，batch维求和
    pub fn conv2d_grad_kernel(
        upstream: &Tensor,
        input: &Tensor,
        kernel_shape: &[usize],
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Tensor, TensorError> {
        let grad = view4(upstream)?;
        let x = view4(input)?;
        let (batch, out_c, out_h, out_w) = grad.dim();
        let (_, _, in_h, in_w) = x.dim();
        let [k_out_c, in_c, k_h, k_w] = *kernel_shape else {
            return Err(TensorError::IncompatibleShape {
                from: kernel_shape.to_vec(),
                to: vec![0, 0, 0, 0],
            });
        };
        debug_assert_eq!(k_out_c, out_c);

        let mut result = Array4::<f32>::zeros((out_c, in_c, k_h, k_w));
        for b in 0..batch {
            for oc in 0..out_c {
                for oh in 0..out_h {
                    for ow in 0..out_w {
                        let g = grad[[b, oc, oh, ow]];
                        if g == 0.0 {
                            continue;
                        }
                        for ic in 0..in_c {
                            for kh in 0..k_h {
                                let Some(ih) = source_index(oh, kh, stride.0, padding.0, in_h)
                                else {
                                    continue;
                                };
                                for kw in 0..k_w {
                                    let Some(iw) = source_index(ow, kw, stride.1, padding.1, in_w)
                                    else {
                                        continue;
                                    };
                                    result[[oc, ic, kh, kw]] += g * x[[b, ic, ih, iw]];
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(Tensor::from_array(result.into_dyn()))
    }

    /// 非重叠平均池化（窗口=步长=`kernel`），不能整除的边缘被丢弃
    pub fn avg_pool2d(&self, kernel: usize) -> Result<Tensor, TensorError> {
        let input = view4(self)?;
        let (batch, c, h, w) = input.dim();
        let (out_h, out_w) = (h / kernel.max(1), w / kernel.max(1));
        if kernel == 0 || out_h == 0 || out_w == 0 {
            return Err(TensorError::IncompatibleShape {
                from: self.shape().to_vec(),
                to: vec![batch, c, out_h, out_w],
            });
        }
        let area = (kernel * kernel) as f32;
        let mut output = Array4::<f32>::zeros((batch, c, out_h, out_w));
        for ((b, ci, oh, ow), out) in output.indexed_iter_mut() {
            let mut sum = 0.0f32;
            for kh in 0..kernel {
                for kw in 0..kernel {
                    sum += input[[b, ci, oh * kernel + kh, ow * kernel + kw]];
                }
            }
            *out = sum / area;
        }
        Ok(Tensor::from_array(output.into_dyn()))
    }

    /// 平均池化的梯度：每个窗口内的元素均分上游梯度
    pub fn avg_pool2d_grad(
        upstream: &Tensor,
        input_shape: &[usize],
        kernel: usize,
    ) -> Result<Tensor, TensorError> {
        let grad = view4(upstream)?;
        let [batch, c, h, w] = *input_shape else {
            return Err(TensorError::IncompatibleShape {
                from: input_shape.to_vec(),
                to: vec![0, 0, 0, 0],
            });
        };
        let area = (kernel * kernel) as f32;
        let mut result = Array4::<f32>::zeros((batch, c, h, w));
        for ((b, ci, oh, ow), &g) in grad.indexed_iter() {
            for kh in 0..kernel {
                for kw in 0..kernel {
                    result[[b, ci, oh * kernel + kh, ow * kernel + kw]] = g / area;
                }
            }
        }
        Ok(Tensor::from_array(result.into_dyn()))
    }

    /// [batch, C, H, W] 加上逐通道偏置 [1, C]
    pub fn add_channel_bias(&self, bias: &Tensor) -> Result<Tensor, TensorError> {
        let input = view4(self)?;
        let channels = input.dim().1;
        if bias.shape() != [1, channels] {
            return Err(TensorError::OperatorError {
                operator: Operator::Add,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: bias.shape().to_vec(),
            });
        }
        let bias_data = bias.array();
        let mut output = input.to_owned();
        for ((_, ci, _, _), value) in output.indexed_iter_mut() {
            *value += bias_data[[0, ci]];
        }
        Ok(Tensor::from_array(output.into_dyn()))
    }
}

/// 输出位置`out`、核偏移`k`对应的输入坐标；落在填充区时返回None
fn source_index(out: usize, k: usize, stride: usize, padding: usize, len: usize) -> Option<usize> {
    let padded = out * stride + k;
    if padded < padding {
        return None;
    }
    let index = padded - padding;
    (index < len).then_some(index)
}
