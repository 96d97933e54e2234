/*
 * @Description  : CycleGAN 对抗训练协议
 *
 * 两个生成器（G_XY: X->Y，G_YX: Y->X）与两个判别器（D_X，D_Y）共享一张计算图，
 * 按“生成器步、判别器步”交替优化；每步只更新一个参数组，另一组视为常量。
 *
 * ```ignore
 * let config = CycleGanConfig::from_json_file("config.json")?;
 * let store = FileCheckpointStore::open("checkpoints")?;
 * let mut trainer = TrainingOrchestrator::from_config(config.clone(), Box::new(store))?;
 * trainer.add_sink(Box::new(TracingSink));
 * trainer.add_sink(Box::new(PngSampleSink::new("samples")?));
 * trainer.fit(&train_loader, &val_loader, config.max_epochs)?;
 * ```
 */

mod checkpoint;
mod config;
mod error;
mod logging;
mod loss;
mod networks;
mod orchestrator;
mod scheduler;
mod validation;

#[cfg(test)]
mod tests;

pub use checkpoint::{
    CheckpointStore, FileCheckpointStore, InMemoryCheckpointStore, TrainingCheckpoint,
};
pub use config::CycleGanConfig;
pub use error::CycleGanError;
pub use logging::{LoggingSink, PngSampleSink, SAMPLE_CLIP_RANGE, TracingSink};
pub use loss::{DiscriminatorLoss, GeneratorLoss, LossComposer, LossRecord};
pub use networks::{
    ConvCritic, DiscriminatorPair, DomainCritic, ImageTranslator, ModelState, NetworkPair,
    ParameterSnapshot, ResidualTranslator,
};
pub use orchestrator::{EpochSummary, FitReport, StopHandle, TrainingOrchestrator};
pub use scheduler::{
    AlternatingScheduler, GroupState, LrUpdate, ParamGroup, SchedulerState, StepKind,
    StepOutcome,
};
pub use validation::{
    EpochAccumulator, SampleImages, VAL_SUFFIX, ValidationAggregator, ValidationOutcome,
};
