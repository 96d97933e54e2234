/*
 * @Description  : 优化器基础trait和辅助结构
 */

use crate::nn::{GraphError, NodeId, Var};
use std::collections::HashSet;

/// 优化器核心 trait
///
/// 每个优化器只负责构造时传入的那组参数（参数组）。
/// `minimize`只把梯度写进本组参数，因此多个优化器可以共享一张图而互不干扰（如 GAN 的 G 与 D）。
pub trait Optimizer {
    /// 参数更新（使用已计算的梯度，不做 forward/backward）；没有梯度的参数保持不变
    fn step(&mut self) -> Result<(), GraphError>;

    /// 本优化器负责的参数
    fn params(&self) -> &[Var];

    fn learning_rate(&self) -> f32;

    fn set_learning_rate(&mut self, lr: f32);

    /// 清零本组参数的梯度（不影响其它参数组）
    fn zero_grad(&self) -> Result<(), GraphError> {
        let Some(first) = self.params().first() else {
            return Ok(());
        };
        let ids: Vec<NodeId> = self.params().iter().map(Var::node_id).collect();
        first.graph().borrow_mut().zero_grad_of(&ids)
    }

    /// 清零梯度 -> 反向传播（只到本组参数）-> 参数更新，返回损失值
    fn minimize(&mut self, loss: &Var) -> Result<f32, GraphError> {
        self.zero_grad()?;
        let targets: HashSet<NodeId> = self.params().iter().map(Var::node_id).collect();
        let loss_value = loss.backward_to(&targets)?;
        self.step()?;
        Ok(loss_value)
    }

    /// 本组参数当前梯度的 L2 范数（无梯度视为0）
    fn grad_norm(&self) -> Result<f32, GraphError> {
        let mut squared = 0.0f32;
        for param in self.params() {
            if let Some(grad) = param.grad()? {
                squared += grad.squared_sum();
            }
        }
        Ok(squared.sqrt())
    }
}

/// 优化器状态管理（内部实现，不对外暴露）
pub(crate) struct OptimizerState {
    params: Vec<Var>,
    learning_rate: f32,
}

impl OptimizerState {
    pub(crate) fn new(params: &[Var], learning_rate: f32) -> Self {
        Self {
            params: params.to_vec(),
            learning_rate,
        }
    }

    pub(crate) fn params(&self) -> &[Var] {
        &self.params
    }

    pub(crate) const fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub(crate) const fn set_learning_rate(&mut self, lr: f32) {
        self.learning_rate = lr;
    }
}
