use crate::nn::{GraphError, Var};

/// 损失函数扩展 trait（结果均为 [1, 1]，mean 归约）
pub trait VarLossOps {
    /// 带 logits 的二元交叉熵；`target`与`self`同形，元素通常为0或1
    fn bce_with_logits(&self, target: &Var) -> Result<Var, GraphError>;

    /// 平均绝对误差
    fn l1_loss(&self, target: &Var) -> Result<Var, GraphError>;
}

impl VarLossOps for Var {
    fn bce_with_logits(&self, target: &Var) -> Result<Var, GraphError> {
        self.binary_op(target, "BCEWithLogits", |g, a, b| {
            g.new_bce_with_logits_loss_node(a, b, None)
        })
    }

    fn l1_loss(&self, target: &Var) -> Result<Var, GraphError> {
        self.binary_op(target, "L1损失", |g, a, b| g.new_l1_loss_node(a, b, None))
    }
}
