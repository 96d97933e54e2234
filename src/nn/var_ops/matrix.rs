use crate::nn::{GraphError, Var};

/// 矩阵运算扩展 trait
pub trait VarMatrixOps {
    /// 矩阵乘法：[n, k] x [k, m] -> [n, m]
    fn matmul(&self, other: &Var) -> Result<Var, GraphError>;
}

impl VarMatrixOps for Var {
    fn matmul(&self, other: &Var) -> Result<Var, GraphError> {
        self.binary_op(other, "矩阵乘法", |g, a, b| g.new_mat_mul_node(a, b, None))
    }
}
