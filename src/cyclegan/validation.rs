/*
 * @Description  : 验证指标聚合：逐批次记录损失，epoch 结束时按键求算术平均
 */

use super::{CycleGanError, LossComposer, LossRecord, ModelState};
use crate::data::{Batch, BatchSource};
use crate::tensor::Tensor;
use std::collections::BTreeMap;

/// 聚合记录中各键的后缀
pub const VAL_SUFFIX: &str = "_val";

/// 一次验证遍历的累加器；`reduce`消耗自身，恰好产生一条聚合记录
#[derive(Debug, Default)]
pub struct EpochAccumulator {
    sums: BTreeMap<String, (f64, usize)>,
    num_records: usize,
}

impl EpochAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: &LossRecord) {
        for (key, value) in record.iter() {
            let entry = self.sums.entry(key.to_string()).or_insert((0.0, 0));
            entry.0 += f64::from(value);
            entry.1 += 1;
        }
        self.num_records += 1;
    }

    pub const fn len(&self) -> usize {
        self.num_records
    }

    pub const fn is_empty(&self) -> bool {
        self.num_records == 0
    }

    /// 每个键取均值并加上`_val`后缀；同时有`d_loss`和`g_loss`时追加
    /// `val_loss = mean(d_loss) + mean(g_loss)`
    pub fn reduce(self) -> Result<LossRecord, CycleGanError> {
        if self.is_empty() {
            return Err(CycleGanError::EmptyValidationSet);
        }
        let means: BTreeMap<String, f32> = self
            .sums
            .into_iter()
            .map(|(key, (sum, count))| (key, (sum / count as f64) as f32))
            .collect();

        let val_loss = match (means.get("d_loss"), means.get("g_loss")) {
            (Some(d), Some(g)) => Some(d + g),
            _ => None,
        };
        let pairs = means
            .into_iter()
            .map(|(key, mean)| (format!("{key}{VAL_SUFFIX}"), mean))
            .chain(val_loss.map(|v| ("val_loss".to_string(), v)));
        Ok(LossRecord::from_pairs(pairs))
    }
}

/// 验证首批次的四张样例图：x、G_XY(x)、y、G_YX(y)，均为 [H, W]
#[derive(Debug, Clone, PartialEq)]
pub struct SampleImages {
    pub real_x: Tensor,
    pub fake_y: Tensor,
    pub real_y: Tensor,
    pub fake_x: Tensor,
}

impl SampleImages {
    /// 取第0个样本的第`slice`层
    pub fn extract(
        batch: &Batch,
        fake_y: &Tensor,
        fake_x: &Tensor,
        slice: usize,
    ) -> Result<Self, CycleGanError> {
        let take = |t: &Tensor| -> Result<Tensor, CycleGanError> {
            Ok(t.index_axis(0, 0)?.index_axis(0, slice)?)
        };
        Ok(Self {
            real_x: take(&batch.x)?,
            fake_y: take(fake_y)?,
            real_y: take(&batch.y)?,
            fake_x: take(fake_x)?,
        })
    }

    pub fn panels(&self) -> [(&'static str, &Tensor); 4] {
        [
            ("x", &self.real_x),
            ("G_XY(x)", &self.fake_y),
            ("y", &self.real_y),
            ("G_YX(y)", &self.fake_x),
        ]
    }
}

/// 一次验证遍历的结果
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub aggregate: LossRecord,
    pub samples: Option<SampleImages>,
    pub num_batches: usize,
}

/// 验证聚合器：在 no_grad 下遍历验证批次
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationAggregator;

impl ValidationAggregator {
    pub fn run(
        &self,
        model: &ModelState,
        composer: &LossComposer,
        source: &dyn BatchSource,
        epoch: usize,
    ) -> Result<ValidationOutcome, CycleGanError> {
        let graph = model.graph();
        let slice = model.sample_shape()[0] / 2;

        graph.no_grad_scope(|g| {
            let mut accumulator = EpochAccumulator::new();
            let mut samples = None;
            for (index, batch) in source.batches(epoch).enumerate() {
                let batch_result = composer
                    .validation_losses(model, &batch)
                    .and_then(|(generator, record)| {
                        if index == 0 {
                            samples = Some(SampleImages::extract(
                                &batch,
                                &generator.fake_y.value()?,
                                &generator.fake_x.value()?,
                                slice,
                            )?);
                        }
                        Ok(record)
                    });
                g.release_intermediates();
                accumulator.push(&batch_result?);
            }
            let num_batches = accumulator.len();
            Ok(ValidationOutcome {
                aggregate: accumulator.reduce()?,
                samples,
                num_batches,
            })
        })
    }
}
