/*
 * @Description  : 张量的逐元素四则运算。
 *                 1. 其中一个操作数为纯数而另一个为张量：则返回的张量形状与该张量相同；
 *                 2. 两个操作数均为张量：形状必须严格一致，否则panic（错误信息见`TensorError::OperatorError`）。
 *                 需要广播的场景（如偏置）由计算图节点自行处理。
 */

use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub};

fn assert_same_shape(operator: Operator, a: &Tensor, b: &Tensor) {
    assert!(
        a.is_same_shape(b),
        "{}",
        TensorError::OperatorError {
            operator,
            tensor1_shape: a.shape().to_vec(),
            tensor2_shape: b.shape().to_vec(),
        }
    );
}

// 为“张量 op 张量”的4种所有权组合统一生成实现
macro_rules! impl_tensor_binary_op {
    ($trait:ident, $method:ident, $operator:expr, $op:tt) => {
        impl $trait<&Tensor> for &Tensor {
            type Output = Tensor;

            fn $method(self, other: &Tensor) -> Tensor {
                assert_same_shape($operator, self, other);
                Tensor {
                    data: &self.data $op &other.data,
                }
            }
        }
        impl $trait<Tensor> for &Tensor {
            type Output = Tensor;

            fn $method(self, other: Tensor) -> Tensor {
                self $op &other
            }
        }
        impl $trait<&Tensor> for Tensor {
            type Output = Tensor;

            fn $method(self, other: &Tensor) -> Tensor {
                &self $op other
            }
        }
        impl $trait<Tensor> for Tensor {
            type Output = Tensor;

            fn $method(self, other: Tensor) -> Tensor {
                &self $op &other
            }
        }
    };
}

// 为“张量 op 纯数”以及“纯数 op 张量”生成实现
macro_rules! impl_tensor_scalar_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait<f32> for &Tensor {
            type Output = Tensor;

            fn $method(self, scalar: f32) -> Tensor {
                Tensor {
                    data: &self.data $op scalar,
                }
            }
        }
        impl $trait<f32> for Tensor {
            type Output = Tensor;

            fn $method(self, scalar: f32) -> Tensor {
                &self $op scalar
            }
        }
        impl $trait<&Tensor> for f32 {
            type Output = Tensor;

            fn $method(self, tensor: &Tensor) -> Tensor {
                Tensor {
                    data: tensor.data.mapv(|x| self $op x),
                }
            }
        }
        impl $trait<Tensor> for f32 {
            type Output = Tensor;

            fn $method(self, tensor: Tensor) -> Tensor {
                self $op &tensor
            }
        }
    };
}

impl_tensor_binary_op!(Add, add, Operator::Add, +);
impl_tensor_binary_op!(Sub, sub, Operator::Sub, -);
impl_tensor_binary_op!(Mul, mul, Operator::Mul, *);
impl_tensor_binary_op!(Div, div, Operator::Div, /);

impl_tensor_scalar_op!(Add, add, +);
impl_tensor_scalar_op!(Sub, sub, -);
impl_tensor_scalar_op!(Mul, mul, *);
impl_tensor_scalar_op!(Div, div, /);

impl Neg for &Tensor {
    type Output = Tensor;

    fn neg(self) -> Tensor {
        Tensor {
            data: self.data.mapv(|x| -x),
        }
    }
}

impl Neg for Tensor {
    type Output = Self;

    fn neg(self) -> Self {
        -&self
    }
}

impl AddAssign<&Tensor> for Tensor {
    fn add_assign(&mut self, other: &Tensor) {
        assert_same_shape(Operator::AddAssign, self, other);
        self.data += &other.data;
    }
}

impl MulAssign<f32> for Tensor {
    fn mul_assign(&mut self, scalar: f32) {
        self.data *= scalar;
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}
