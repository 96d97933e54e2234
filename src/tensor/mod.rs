/*
 * @Description  : 张量（Tensor）：基于ndarray的f32动态维数组，是计算图中所有值与梯度的载体
 */

use ndarray::{Array, ArrayD, IxDyn};
use rand::Rng;
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::errors::TensorError;

mod ops {
    pub mod arith;
    pub mod conv;
    pub mod others;
}

mod image;
mod print;
mod property;

pub use ops::conv::conv2d_output_size;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：只要通Tensor初始化的都是张量（即使标量也是张量）；
/// 而通常意义上的数字（类型为usize、i32、f64等）就只是纯数（number），在这里不被认为是张量。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tensor {
    data: ArrayD<f32>,
}

impl Tensor {
    /// 创建一个张量。`data`的长度必须和`shape`中所有元素的乘积相等，否则panic。
    /// 需要可恢复的错误时请用`try_new`。
    pub fn new(data: &[f32], shape: &[usize]) -> Self {
        match Self::try_new(data, shape) {
            Ok(tensor) => tensor,
            Err(e) => panic!("{e}"),
        }
    }

    /// `new`的可失败版本
    pub fn try_new(data: &[f32], shape: &[usize]) -> Result<Self, TensorError> {
        let data = Array::from_shape_vec(IxDyn(shape), data.to_vec()).map_err(|_| {
            TensorError::DataShapeMismatch {
                data_len: data.len(),
                shape: shape.to_vec(),
            }
        })?;
        Ok(Self { data })
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::ones(IxDyn(shape)),
        }
    }

    /// 所有元素均为`value`的张量
    pub fn full(value: f32, shape: &[usize]) -> Self {
        Self {
            data: ArrayD::from_elem(IxDyn(shape), value),
        }
    }

    /// 创建一个随机张量，其值在[min, max]的闭区间（使用指定的RNG，便于复现）
    pub fn uniform_with_rng<R: Rng>(min: f32, max: f32, shape: &[usize], rng: &mut R) -> Self {
        let dist = Uniform::from(min..=max);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| dist.sample(rng))
            .collect::<Vec<_>>();
        Self::new(&data, shape)
    }

    /// 创建一个服从正态分布的随机张量（Box-Muller变换，使用指定的RNG）
    pub fn normal_with_rng<R: Rng>(mean: f32, std_dev: f32, shape: &[usize], rng: &mut R) -> Self {
        let data_len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(data_len);
        let unit = Uniform::from(f32::EPSILON..1.0);

        while data.len() < data_len {
            let u1 = unit.sample(rng);
            let u2 = unit.sample(rng);
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f32::consts::PI * u2;
            let z0 = mean + std_dev * r * theta.cos();
            let z1 = mean + std_dev * r * theta.sin();

            if z0.is_finite() {
                data.push(z0);
            }
            if data.len() < data_len && z1.is_finite() {
                data.push(z1);
            }
        }

        Self::new(&data, shape)
    }

    /// 由ndarray数组直接构造（crate内部使用）
    pub(crate) fn from_array(data: ArrayD<f32>) -> Self {
        Self { data }
    }

    pub(crate) const fn array(&self) -> &ArrayD<f32> {
        &self.data
    }
}
