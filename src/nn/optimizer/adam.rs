/*
 * @Description  : Adam优化器实现（可选 L2 权重衰减，状态可导出/导入以便断点续训）
 */

use super::base::{Optimizer, OptimizerState};
use crate::nn::{GraphError, NodeId, Var};
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Adam优化器
pub struct Adam {
    state: OptimizerState,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    /// L2 权重衰减：g ← g + λ·θ
    weight_decay: f32,
    /// 一阶矩估计
    m: HashMap<NodeId, Tensor>,
    /// 二阶矩估计
    v: HashMap<NodeId, Tensor>,
    /// 时间步
    t: usize,
}

/// Adam 的可序列化状态，矩估计以参数名为键（节点 ID 在重建的图中不稳定）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdamState {
    pub learning_rate: f32,
    pub step: usize,
    pub first_moments: BTreeMap<String, Tensor>,
    pub second_moments: BTreeMap<String, Tensor>,
}

impl Adam {
    /// 为指定的参数组创建Adam优化器
    ///
    /// ```ignore
    /// // GAN 训练：分别为 G 和 D 创建优化器
    /// let optimizer_g = Adam::new(&g_params, 0.0002, 0.5, 0.999, 1e-8);
    /// let optimizer_d = Adam::new(&d_params, 0.0002, 0.5, 0.999, 1e-8);
    /// ```
    pub fn new(params: &[Var], learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            state: OptimizerState::new(params, learning_rate),
            beta1,
            beta2,
            epsilon,
            weight_decay: 0.0,
            m: HashMap::new(),
            v: HashMap::new(),
            t: 0,
        }
    }

    pub const fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub const fn step_count(&self) -> usize {
        self.t
    }

    /// 导出状态（学习率、步数、各参数的矩估计）
    pub fn export_state(&self) -> Result<AdamState, GraphError> {
        let mut first_moments = BTreeMap::new();
        let mut second_moments = BTreeMap::new();
        for param in self.state.params() {
            let id = param.node_id();
            if let (Some(m), Some(v)) = (self.m.get(&id), self.v.get(&id)) {
                let name = param.name()?;
                first_moments.insert(name.clone(), m.clone());
                second_moments.insert(name, v.clone());
            }
        }
        Ok(AdamState {
            learning_rate: self.state.learning_rate(),
            step: self.t,
            first_moments,
            second_moments,
        })
    }

    /// 导入状态：每个矩估计都必须对应本组中同名且同形的参数
    pub fn import_state(&mut self, saved: &AdamState) -> Result<(), GraphError> {
        let mut by_name = HashMap::new();
        for param in self.state.params() {
            by_name.insert(param.name()?, param.clone());
        }

        let mut m = HashMap::new();
        let mut v = HashMap::new();
        for (name, first) in &saved.first_moments {
            let param = by_name.get(name).ok_or_else(|| {
                GraphError::InvalidOperation(format!("优化器状态中的参数{name}不在本参数组中"))
            })?;
            let second = saved.second_moments.get(name).ok_or_else(|| {
                GraphError::InvalidOperation(format!("优化器状态缺少参数{name}的二阶矩"))
            })?;
            let shape = param.shape()?;
            if first.shape() != shape.as_slice() || second.shape() != shape.as_slice() {
                return Err(GraphError::ShapeMismatch {
                    expected: shape,
                    got: first.shape().to_vec(),
                    message: format!("参数{name}的矩估计形状与参数不一致"),
                });
            }
            m.insert(param.node_id(), first.clone());
            v.insert(param.node_id(), second.clone());
        }

        self.m = m;
        self.v = v;
        self.t = saved.step;
        self.state.set_learning_rate(saved.learning_rate);
        Ok(())
    }

    /// Adam 参数更新的核心逻辑
    fn adam_update_with_gradient(&mut self, param: &Var, gradient: &Tensor) -> Result<(), GraphError> {
        let node_id = param.node_id();
        let current_value = param.value()?;

        let gradient = if self.weight_decay != 0.0 {
            gradient + &(&current_value * self.weight_decay)
        } else {
            gradient.clone()
        };

        // m = β1 * m + (1 - β1) * g
        let m = self
            .m
            .entry(node_id)
            .or_insert_with(|| Tensor::zeros(gradient.shape()));
        *m *= self.beta1;
        *m += &(&gradient * (1.0 - self.beta1));

        // v = β2 * v + (1 - β2) * g²
        let v = self
            .v
            .entry(node_id)
            .or_insert_with(|| Tensor::zeros(gradient.shape()));
        *v *= self.beta2;
        *v += &(&(&gradient * &gradient) * (1.0 - self.beta2));

        // 偏差修正
        let m_hat = &*m / (1.0 - self.beta1.powi(self.t as i32));
        let v_hat = &*v / (1.0 - self.beta2.powi(self.t as i32));

        // θ = θ - α * m_hat / (√v_hat + ε)
        let denominator = &v_hat.sqrt() + self.epsilon;
        let update = &m_hat / &denominator;
        let new_value = &current_value - &(&update * self.state.learning_rate());

        param.set_value(&new_value)
    }
}

impl Optimizer for Adam {
    fn step(&mut self) -> Result<(), GraphError> {
        self.t += 1;

        // 先收集梯度，避免更新时与图的借用冲突
        let mut gradients = Vec::new();
        for param in self.state.params() {
            if let Some(grad) = param.grad()? {
                gradients.push((param.clone(), grad));
            }
        }

        for (param, gradient) in gradients {
            self.adam_update_with_gradient(&param, &gradient)?;
        }
        Ok(())
    }

    fn params(&self) -> &[Var] {
        self.state.params()
    }

    fn learning_rate(&self) -> f32 {
        self.state.learning_rate()
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.state.set_learning_rate(lr);
    }
}
