/*
 * @Description  : 张量的归约、逐元素映射、矩阵乘法与形状变换等运算
 */

use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use ndarray::{Axis, Ix2, IxDyn};

impl Tensor {
    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓归约↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 所有元素之和（纯数）
    pub fn sum(&self) -> f32 {
        self.data.sum()
    }

    /// 所有元素的算术平均（纯数）；空张量返回NaN
    pub fn mean(&self) -> f32 {
        self.data.mean().unwrap_or(f32::NAN)
    }

    /// 所有元素平方和（用于梯度范数）
    pub fn squared_sum(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum()
    }

    /// 2D张量按行求和，保留维度：[n, m] -> [1, m]
    pub fn sum_rows_keepdim(&self) -> Tensor {
        Tensor::from_array(self.data.sum_axis(Axis(0)).insert_axis(Axis(0)))
    }

    /// 4D张量[n, c, h, w]按通道求和：-> [1, c]
    pub fn sum_per_channel(&self) -> Tensor {
        let summed = self
            .data
            .sum_axis(Axis(3))
            .sum_axis(Axis(2))
            .sum_axis(Axis(0));
        Tensor::from_array(summed.insert_axis(Axis(0)))
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑归约↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓逐元素↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Tensor {
        Tensor::from_array(self.data.mapv(f))
    }

    /// 两个同形张量逐元素组合
    pub fn zip_map<F: Fn(f32, f32) -> f32>(&self, other: &Tensor, f: F) -> Tensor {
        assert!(
            self.is_same_shape(other),
            "{}",
            TensorError::OperatorError {
                operator: Operator::ZipMap,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: other.shape().to_vec(),
            }
        );
        let mut result = self.data.clone();
        result.zip_mut_with(&other.data, |a, &b| *a = f(*a, b));
        Tensor::from_array(result)
    }

    pub fn abs(&self) -> Tensor {
        self.map(f32::abs)
    }

    /// 符号函数，0处取0（与PyTorch的`sign`一致）
    pub fn sign(&self) -> Tensor {
        self.map(|x| {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        })
    }

    pub fn sqrt(&self) -> Tensor {
        self.map(f32::sqrt)
    }

    /// 数值稳定的sigmoid：对负数用 e^x / (1 + e^x) 形式避免溢出
    pub fn sigmoid(&self) -> Tensor {
        self.map(|x| {
            if x >= 0.0 {
                1.0 / (1.0 + (-x).exp())
            } else {
                let e = x.exp();
                e / (1.0 + e)
            }
        })
    }

    /// 按元素裁剪到[min, max]
    pub fn clip(&self, min: f32, max: f32) -> Tensor {
        self.map(|x| x.clamp(min, max))
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑逐元素↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓矩阵↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 2D矩阵乘法：[n, k] x [k, m] -> [n, m]
    pub fn mat_mul(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        let mismatch = || TensorError::OperatorError {
            operator: Operator::MatMul,
            tensor1_shape: self.shape().to_vec(),
            tensor2_shape: other.shape().to_vec(),
        };
        let a = self.data.view().into_dimensionality::<Ix2>().map_err(|_| mismatch())?;
        let b = other.data.view().into_dimensionality::<Ix2>().map_err(|_| mismatch())?;
        if a.ncols() != b.nrows() {
            return Err(mismatch());
        }
        Ok(Tensor::from_array(a.dot(&b).into_dyn()))
    }

    /// 2D矩阵转置
    pub fn transpose(&self) -> Tensor {
        Tensor::from_array(self.data.t().to_owned())
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑矩阵↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓形状↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    pub fn reshape(&self, shape: &[usize]) -> Result<Tensor, TensorError> {
        let incompatible = || TensorError::IncompatibleShape {
            from: self.shape().to_vec(),
            to: shape.to_vec(),
        };
        if self.size() != shape.iter().product::<usize>() {
            return Err(incompatible());
        }
        let contiguous = self.data.as_standard_layout().to_owned();
        contiguous
            .into_shape(IxDyn(shape))
            .map(Tensor::from_array)
            .map_err(|_| incompatible())
    }

    /// 沿第`axis`维取第`index`个切片，结果降一维
    pub fn index_axis(&self, axis: usize, index: usize) -> Result<Tensor, TensorError> {
        let len = *self.shape().get(axis).ok_or(TensorError::IndexOutOfBounds {
            index: axis,
            len: self.dimension(),
        })?;
        if index >= len {
            return Err(TensorError::IndexOutOfBounds { index, len });
        }
        Ok(Tensor::from_array(
            self.data.index_axis(Axis(axis), index).to_owned(),
        ))
    }

    /// 沿第0维（batch维）按索引挑选样本
    pub fn select_samples(&self, indices: &[usize]) -> Result<Tensor, TensorError> {
        let len = self.shape().first().copied().unwrap_or(0);
        if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
            return Err(TensorError::IndexOutOfBounds { index: bad, len });
        }
        Ok(Tensor::from_array(self.data.select(Axis(0), indices)))
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑形状↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
}
