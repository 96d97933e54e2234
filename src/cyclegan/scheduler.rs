/*
 * @Description  : 交替优化调度：每一步只更新一个参数组（生成器或判别器），
 *                 每组各自持有 Adam 优化器与 ReduceLrOnPlateau 调度器
 */

use super::{CycleGanConfig, CycleGanError, LossComposer, LossRecord, ModelState};
use crate::data::Batch;
use crate::nn::{Adam, AdamState, Optimizer, PlateauState, ReduceLrOnPlateau, Var};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 步骤类型：由调用方显式给出，不从索引推断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    GeneratorStep,
    DiscriminatorStep,
}

impl StepKind {
    pub const fn next(self) -> Self {
        match self {
            Self::GeneratorStep => Self::DiscriminatorStep,
            Self::DiscriminatorStep => Self::GeneratorStep,
        }
    }

    /// 该组在验证聚合记录中监视的指标
    pub const fn monitored_metric(self) -> &'static str {
        match self {
            Self::GeneratorStep => "g_loss_val",
            Self::DiscriminatorStep => "d_loss_val",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeneratorStep => write!(f, "生成器步"),
            Self::DiscriminatorStep => write!(f, "判别器步"),
        }
    }
}

/// 参数组：一个优化器 + 一个学习率调度器
pub struct ParamGroup {
    optimizer: Adam,
    plateau: ReduceLrOnPlateau,
}

impl ParamGroup {
    pub fn new(params: &[Var], config: &CycleGanConfig) -> Self {
        let optimizer = Adam::new(
            params,
            config.learning_rate,
            config.beta1,
            config.beta2,
            config.epsilon,
        )
        .with_weight_decay(config.weight_decay);
        let plateau = ReduceLrOnPlateau::new(
            config.factor,
            config.patience,
            config.plateau_threshold,
            config.min_lr,
        );
        Self { optimizer, plateau }
    }

    pub const fn optimizer(&self) -> &Adam {
        &self.optimizer
    }

    pub const fn plateau(&self) -> &ReduceLrOnPlateau {
        &self.plateau
    }

    pub fn learning_rate(&self) -> f32 {
        self.optimizer.learning_rate()
    }

    fn export_state(&self) -> Result<GroupState, CycleGanError> {
        Ok(GroupState {
            optimizer: self.optimizer.export_state()?,
            plateau: self.plateau.state().clone(),
        })
    }

    fn import_state(&mut self, state: &GroupState) -> Result<(), CycleGanError> {
        self.optimizer
            .import_state(&state.optimizer)
            .map_err(|err| CycleGanError::CheckpointRestoreMismatch {
                reason: format!("优化器状态不匹配：{err}"),
            })?;
        self.plateau.load_state(state.plateau.clone());
        Ok(())
    }
}

/// 单个参数组的可序列化状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupState {
    pub optimizer: AdamState,
    pub plateau: PlateauState,
}

/// 调度器的可序列化状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerState {
    pub generator: GroupState,
    pub discriminator: GroupState,
}

/// 一次优化步的结果
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub kind: StepKind,
    pub losses: LossRecord,
    /// 本组参数在更新前的梯度 L2 范数
    pub grad_norm: f32,
    pub learning_rate: f32,
}

/// 一个 epoch 结束时各组学习率的变化
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LrUpdate {
    pub generator: Option<f32>,
    pub discriminator: Option<f32>,
}

/// 交替调度器
///
/// 一个 epoch 内按 GEN, DISC, GEN, ... 交替，每个 epoch 开始时回到 GEN。
pub struct AlternatingScheduler {
    generator: ParamGroup,
    discriminator: ParamGroup,
    phase: StepKind,
}

impl AlternatingScheduler {
    pub fn new(model: &ModelState, config: &CycleGanConfig) -> Self {
        Self {
            generator: ParamGroup::new(&model.generator_params(), config),
            discriminator: ParamGroup::new(&model.discriminator_params(), config),
            phase: StepKind::GeneratorStep,
        }
    }

    pub const fn group(&self, kind: StepKind) -> &ParamGroup {
        match kind {
            StepKind::GeneratorStep => &self.generator,
            StepKind::DiscriminatorStep => &self.discriminator,
        }
    }

    const fn group_mut(&mut self, kind: StepKind) -> &mut ParamGroup {
        match kind {
            StepKind::GeneratorStep => &mut self.generator,
            StepKind::DiscriminatorStep => &mut self.discriminator,
        }
    }

    /// 下一步应执行的类型
    pub const fn phase(&self) -> StepKind {
        self.phase
    }

    /// 返回本步类型并推进相位
    pub const fn advance(&mut self) -> StepKind {
        let current = self.phase;
        self.phase = current.next();
        current
    }

    pub const fn reset_phase(&mut self) {
        self.phase = StepKind::GeneratorStep;
    }

    /// 执行一步：清零本组梯度 -> 计算损失 -> 只向本组参数反向 -> 更新 -> 记录梯度范数 -> 再次清零。
    /// 结束后释放图中的中间节点。
    pub fn step(
        &mut self,
        kind: StepKind,
        model: &ModelState,
        composer: &LossComposer,
        batch: &Batch,
    ) -> Result<StepOutcome, CycleGanError> {
        let result = self.step_inner(kind, model, composer, batch);
        model.graph().release_intermediates();
        result
    }

    fn step_inner(
        &mut self,
        kind: StepKind,
        model: &ModelState,
        composer: &LossComposer,
        batch: &Batch,
    ) -> Result<StepOutcome, CycleGanError> {
        let group = self.group_mut(kind);
        group.optimizer.zero_grad()?;

        let (total, losses) = match kind {
            StepKind::GeneratorStep => {
                let loss = composer.generator_loss(model, batch)?;
                (loss.total, loss.breakdown)
            }
            StepKind::DiscriminatorStep => {
                let loss = composer.discriminator_loss(model, batch)?;
                (loss.total, loss.breakdown)
            }
        };

        group.optimizer.minimize(&total)?;
        let grad_norm = group.optimizer.grad_norm()?;
        group.optimizer.zero_grad()?;

        tracing::debug!("{kind}：{losses}，梯度范数={grad_norm:.4}");
        Ok(StepOutcome {
            kind,
            losses,
            grad_norm,
            learning_rate: group.learning_rate(),
        })
    }

    /// 每个 epoch 用验证聚合记录更新一次两个学习率调度器
    pub fn end_epoch(&mut self, aggregate: &LossRecord) -> Result<LrUpdate, CycleGanError> {
        let g_metric = aggregate.require(StepKind::GeneratorStep.monitored_metric())?;
        let d_metric = aggregate.require(StepKind::DiscriminatorStep.monitored_metric())?;

        let mut update = LrUpdate::default();
        for (kind, metric) in [
            (StepKind::GeneratorStep, g_metric),
            (StepKind::DiscriminatorStep, d_metric),
        ] {
            let group = self.group_mut(kind);
            let reduced = group.plateau.step(metric, &mut group.optimizer);
            if let Some(lr) = reduced {
                tracing::warn!("{}停滞，学习率降为{lr:e}", kind.monitored_metric());
            }
            match kind {
                StepKind::GeneratorStep => update.generator = reduced,
                StepKind::DiscriminatorStep => update.discriminator = reduced,
            }
        }
        Ok(update)
    }

    pub fn export_state(&self) -> Result<SchedulerState, CycleGanError> {
        Ok(SchedulerState {
            generator: self.generator.export_state()?,
            discriminator: self.discriminator.export_state()?,
        })
    }

    /// 恢复两组的优化器与调度器状态；任一组不匹配时两组都不修改
    pub fn import_state(&mut self, state: &SchedulerState) -> Result<(), CycleGanError> {
        let backup = self.export_state()?;
        let result = self
            .generator
            .import_state(&state.generator)
            .and_then(|()| self.discriminator.import_state(&state.discriminator));
        if result.is_err() {
            self.generator.import_state(&backup.generator)?;
            self.discriminator.import_state(&backup.discriminator)?;
        }
        result
    }
}
