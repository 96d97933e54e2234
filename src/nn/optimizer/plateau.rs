/*
 * @Description  : 基于验证指标停滞的学习率衰减（min 模式，相对阈值）
 */

use super::Optimizer;
use serde::{Deserialize, Serialize};

/// 学习率衰减前允许的最小变化量，小于它就不再改学习率
const LR_EPSILON: f32 = 1e-8;

/// 指标连续`patience`个epoch没有改进（`metric < best * (1 - threshold)`）时，学习率乘以`factor`
#[derive(Debug, Clone)]
pub struct ReduceLrOnPlateau {
    factor: f32,
    patience: usize,
    threshold: f32,
    min_lr: f32,
    state: PlateauState,
}

/// 调度器的可序列化状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlateauState {
    /// 目前最好的指标；还没有观察到任何指标时为None
    pub best: Option<f32>,
    pub num_bad_epochs: usize,
}

impl ReduceLrOnPlateau {
    pub fn new(factor: f32, patience: usize, threshold: f32, min_lr: f32) -> Self {
        Self {
            factor,
            patience,
            threshold,
            min_lr,
            state: PlateauState::default(),
        }
    }

    /// 喂入一个epoch的指标；若学习率被衰减，返回新的学习率
    pub fn step(&mut self, metric: f32, optimizer: &mut dyn Optimizer) -> Option<f32> {
        if self.is_improvement(metric) {
            self.state.best = Some(metric);
            self.state.num_bad_epochs = 0;
        } else {
            self.state.num_bad_epochs += 1;
        }

        if self.state.num_bad_epochs < self.patience {
            return None;
        }
        self.state.num_bad_epochs = 0;

        let old_lr = optimizer.learning_rate();
        let new_lr = (old_lr * self.factor).max(self.min_lr);
        if old_lr - new_lr > LR_EPSILON {
            optimizer.set_learning_rate(new_lr);
            Some(new_lr)
        } else {
            None
        }
    }

    fn is_improvement(&self, metric: f32) -> bool {
        if metric.is_nan() {
            return false;
        }
        match self.state.best {
            None => true,
            Some(best) => metric < best * (1.0 - self.threshold),
        }
    }

    pub const fn state(&self) -> &PlateauState {
        &self.state
    }

    pub fn load_state(&mut self, state: PlateauState) {
        self.state = state;
    }

    pub const fn patience(&self) -> usize {
        self.patience
    }
}
