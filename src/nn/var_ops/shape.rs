use crate::nn::{GraphError, Var};

/// 形状变换扩展 trait
pub trait VarShapeOps {
    /// 保留batch维并展平其余维度：[N, ...] -> [N, prod(...)]
    fn flatten(&self) -> Result<Var, GraphError>;

    /// 非重叠平均池化：[N, C, H, W] -> [N, C, H/k, W/k]
    fn avg_pool2d(&self, kernel: usize) -> Result<Var, GraphError>;
}

impl VarShapeOps for Var {
    fn flatten(&self) -> Result<Var, GraphError> {
        self.unary_op(|g, id| g.new_flatten_node(id, None))
    }

    fn avg_pool2d(&self, kernel: usize) -> Result<Var, GraphError> {
        self.unary_op(|g, id| g.new_avg_pool2d_node(id, kernel, None))
    }
}
