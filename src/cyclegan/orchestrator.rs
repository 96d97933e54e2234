/*
 * @Description  : 训练编排：把批次来源、模型、损失组合器、交替调度器、验证聚合器、
 *                 检查点存储和日志输出串起来。各生命周期阶段都可以被直接调用。
 */

use super::{
    AlternatingScheduler, CheckpointStore, CycleGanConfig, CycleGanError, LossComposer,
    LossRecord, LoggingSink, LrUpdate, ModelState, StepKind, StepOutcome, TrainingCheckpoint,
    ValidationAggregator,
};
use crate::data::{Batch, BatchSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 停止标志：唯一可跨线程共享的对象，只在 epoch 边界检查
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 一个 epoch 的总结
#[derive(Debug, Clone, PartialEq)]
pub struct EpochSummary {
    /// 从1开始计
    pub epoch: usize,
    pub aggregate: LossRecord,
    pub lr_update: LrUpdate,
    pub generator_lr: f32,
    pub discriminator_lr: f32,
    /// 本 epoch 的检查点是否成为新的最佳
    pub is_best: bool,
}

/// `fit`的结果
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub summaries: Vec<EpochSummary>,
    pub stopped_early: bool,
}

/// 训练编排器
pub struct TrainingOrchestrator {
    config: CycleGanConfig,
    model: ModelState,
    composer: LossComposer,
    scheduler: AlternatingScheduler,
    validator: ValidationAggregator,
    store: Box<dyn CheckpointStore>,
    sinks: Vec<Box<dyn LoggingSink>>,
    epochs_completed: usize,
    global_step: usize,
    stop: StopHandle,
}

impl TrainingOrchestrator {
    /// 用给定模型创建编排器；模型的样本形状须与配置一致
    pub fn new(
        config: CycleGanConfig,
        model: ModelState,
        store: Box<dyn CheckpointStore>,
    ) -> Result<Self, CycleGanError> {
        config.validate()?;
        if model.sample_shape() != config.sample_shape() {
            return Err(CycleGanError::ShapeMismatch {
                expected: config.sample_shape().to_vec(),
                actual: model.sample_shape().to_vec(),
            });
        }
        let composer = LossComposer::new(config.lambda_cycle, config.lambda_identity);
        let scheduler = AlternatingScheduler::new(&model, &config);
        Ok(Self {
            config,
            model,
            composer,
            scheduler,
            validator: ValidationAggregator,
            store,
            sinks: Vec::new(),
            epochs_completed: 0,
            global_step: 0,
            stop: StopHandle::new(),
        })
    }

    /// 按配置构造默认网络并创建编排器
    pub fn from_config(
        config: CycleGanConfig,
        store: Box<dyn CheckpointStore>,
    ) -> Result<Self, CycleGanError> {
        let model = ModelState::from_config(&config)?;
        Self::new(config, model, store)
    }

    pub fn add_sink(&mut self, sink: Box<dyn LoggingSink>) {
        self.sinks.push(sink);
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub const fn model(&self) -> &ModelState {
        &self.model
    }

    pub const fn scheduler(&self) -> &AlternatingScheduler {
        &self.scheduler
    }

    pub const fn config(&self) -> &CycleGanConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn CheckpointStore {
        self.store.as_ref()
    }

    pub const fn epochs_completed(&self) -> usize {
        self.epochs_completed
    }

    /// 正在进行（或下一个）的 epoch 编号，从1开始
    pub const fn current_epoch(&self) -> usize {
        self.epochs_completed + 1
    }

    // ==================== 生命周期阶段 ====================

    /// 训练一个批次：按相位执行一个生成器步或判别器步
    pub fn run_training_batch(&mut self, batch: &Batch) -> Result<StepOutcome, CycleGanError> {
        self.model.check_batch(batch)?;
        let kind = self.scheduler.advance();
        let outcome = self.scheduler.step(kind, &self.model, &self.composer, batch)?;
        self.global_step += 1;

        let global_step = self.global_step;
        self.emit(|sink| sink.log_step(global_step, &outcome));
        Ok(outcome)
    }

    /// 训练一个 epoch；相位在开始时重置为生成器步
    pub fn run_training_epoch(
        &mut self,
        source: &dyn BatchSource,
    ) -> Result<Vec<StepOutcome>, CycleGanError> {
        self.model.graph().train();
        self.scheduler.reset_phase();
        let epoch = self.current_epoch();
        let mut outcomes = Vec::with_capacity(source.num_batches());
        for batch in source.batches(epoch) {
            outcomes.push(self.run_training_batch(&batch)?);
        }
        Ok(outcomes)
    }

    /// 验证一个 epoch，返回聚合记录；首批次的样例图交给日志输出
    pub fn run_validation_epoch(
        &mut self,
        source: &dyn BatchSource,
    ) -> Result<LossRecord, CycleGanError> {
        let epoch = self.current_epoch();
        let outcome = self
            .validator
            .run(&self.model, &self.composer, source, epoch)?;
        if let Some(samples) = &outcome.samples {
            self.emit(|sink| sink.log_samples(epoch, samples));
        }
        Ok(outcome.aggregate)
    }

    /// 结束一个 epoch：更新学习率调度器 -> 按 val_loss 提交检查点并覆盖 "last" -> 输出日志
    pub fn end_epoch(&mut self, aggregate: LossRecord) -> Result<EpochSummary, CycleGanError> {
        let val_loss = aggregate.require("val_loss")?;
        let lr_update = self.scheduler.end_epoch(&aggregate)?;
        self.epochs_completed += 1;

        // 下一个 epoch 从生成器步开始，不论本 epoch 的批次数是奇是偶
        self.scheduler.reset_phase();

        let checkpoint = self.checkpoint(Some(val_loss))?;
        let is_best = self.store.offer(&checkpoint)?;
        self.store.save_last(&checkpoint)?;

        let summary = EpochSummary {
            epoch: self.epochs_completed,
            aggregate,
            lr_update,
            generator_lr: self.scheduler.group(StepKind::GeneratorStep).learning_rate(),
            discriminator_lr: self.scheduler.group(StepKind::DiscriminatorStep).learning_rate(),
            is_best,
        };
        tracing::info!("epoch {} 结束：{}", summary.epoch, summary.aggregate);
        self.emit(|sink| sink.log_epoch(&summary));
        Ok(summary)
    }

    /// 完整训练循环，直到完成`max_epochs`个 epoch（含恢复前已完成的）或收到停止请求。
    pub fn fit(
        &mut self,
        train: &dyn BatchSource,
        val: &dyn BatchSource,
        max_epochs: usize,
    ) -> Result<FitReport, CycleGanError> {
        tracing::info!(
            "数据集规模：训练{}批，验证{}批（批大小{}）",
            train.num_batches(),
            val.num_batches(),
            self.config.batch_size
        );

        let mut summaries = Vec::new();
        let mut stopped_early = false;
        while self.epochs_completed < max_epochs {
            if self.stop.is_stop_requested() {
                tracing::info!("收到停止请求，在 epoch {} 之前停止", self.current_epoch());
                stopped_early = true;
                break;
            }
            self.run_training_epoch(train)?;
            let aggregate = self.run_validation_epoch(val)?;
            summaries.push(self.end_epoch(aggregate)?);
        }

        // 每个 epoch 结束时已写过 "last"；一个 epoch 都没跑时也留下当前状态
        if summaries.is_empty() {
            let last = self.checkpoint(None)?;
            self.store.save_last(&last)?;
        }
        Ok(FitReport {
            summaries,
            stopped_early,
        })
    }

    /// 从存储中恢复到最近完成的 epoch。返回恢复到的 epoch；存储为空时返回 None，
    /// 即从头开始训练。配置不一致在修改状态之前报告。
    pub fn resume(&mut self, store: &dyn CheckpointStore) -> Result<Option<usize>, CycleGanError> {
        // "last" 与最佳检查点中取较新的一个（相同时取 "last"）
        let checkpoint = match (store.load_last()?, store.load_best()?) {
            (Some(last), Some(best)) if best.epoch > last.epoch => best,
            (Some(last), _) => last,
            (None, Some(best)) => best,
            (None, None) => {
                tracing::info!("没有可恢复的检查点，从头开始训练");
                return Ok(None);
            }
        };

        let mismatched = self.config.resume_mismatches(&checkpoint.config);
        if !mismatched.is_empty() {
            return Err(CycleGanError::CheckpointRestoreMismatch {
                reason: format!("配置字段与检查点不一致：{}", mismatched.join(", ")),
            });
        }

        let previous = self.model.snapshot()?;
        self.model.restore(&checkpoint.parameters)?;
        if let Err(err) = self.scheduler.import_state(&checkpoint.scheduler) {
            self.model.restore(&previous)?;
            return Err(err);
        }
        self.epochs_completed = checkpoint.epoch;
        self.scheduler.reset_phase();
        tracing::info!("从 epoch {} 的检查点恢复训练", checkpoint.epoch);
        Ok(Some(checkpoint.epoch))
    }

    // ==================== 内部工具 ====================

    fn checkpoint(&self, val_loss: Option<f32>) -> Result<TrainingCheckpoint, CycleGanError> {
        Ok(TrainingCheckpoint {
            epoch: self.epochs_completed,
            val_loss,
            config: self.config.clone(),
            parameters: self.model.snapshot()?,
            scheduler: self.scheduler.export_state()?,
        })
    }

    /// 日志输出失败只记录警告
    fn emit<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut dyn LoggingSink) -> Result<(), CycleGanError>,
    {
        for sink in &mut self.sinks {
            if let Err(err) = f(sink.as_mut()) {
                tracing::warn!("日志输出失败：{err}");
            }
        }
    }
}
