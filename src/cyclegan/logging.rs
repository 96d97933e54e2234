/*
 * @Description  : 日志输出（只做观察，不影响训练流程）：tracing 文本日志与 PNG 样例图
 */

use super::{CycleGanError, EpochSummary, SampleImages, StepOutcome};
use image::{GenericImage, GrayImage};
use std::fs;
use std::path::{Path, PathBuf};

/// 日志输出接口；默认实现什么也不做，按需覆盖
pub trait LoggingSink {
    fn log_step(&mut self, _global_step: usize, _outcome: &StepOutcome) -> Result<(), CycleGanError> {
        Ok(())
    }

    fn log_epoch(&mut self, _summary: &EpochSummary) -> Result<(), CycleGanError> {
        Ok(())
    }

    fn log_samples(&mut self, _epoch: usize, _samples: &SampleImages) -> Result<(), CycleGanError> {
        Ok(())
    }
}

/// 通过`tracing`输出：每步 debug，每个 epoch info
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LoggingSink for TracingSink {
    fn log_step(&mut self, global_step: usize, outcome: &StepOutcome) -> Result<(), CycleGanError> {
        tracing::debug!(
            step = global_step,
            kind = %outcome.kind,
            grad_norm = outcome.grad_norm,
            lr = outcome.learning_rate,
            "{}",
            outcome.losses
        );
        Ok(())
    }

    fn log_epoch(&mut self, summary: &EpochSummary) -> Result<(), CycleGanError> {
        tracing::info!(
            epoch = summary.epoch,
            is_best = summary.is_best,
            g_lr = summary.generator_lr,
            d_lr = summary.discriminator_lr,
            "{}",
            summary.aggregate
        );
        Ok(())
    }
}

/// 把四张样例图横向拼成一张 PNG：`samples_epoch=NNN.png`
///
/// 像素值先裁剪到[-1, 1]，再线性映射到 0..255。
#[derive(Debug, Clone)]
pub struct PngSampleSink {
    dir: PathBuf,
}

pub const SAMPLE_CLIP_RANGE: (f32, f32) = (-1.0, 1.0);

impl PngSampleSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, CycleGanError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("samples_epoch={epoch:03}.png"))
    }

    /// 拼接后的灰度图
    pub fn render(samples: &SampleImages) -> Result<GrayImage, CycleGanError> {
        let (min, max) = SAMPLE_CLIP_RANGE;
        let panels = samples
            .panels()
            .iter()
            .map(|(_, tensor)| tensor.to_gray_image_clipped(min, max))
            .collect::<Result<Vec<_>, _>>()?;

        let (width, height) = panels[0].dimensions();
        let mut strip = GrayImage::new(width * panels.len() as u32, height);
        for (i, panel) in panels.iter().enumerate() {
            strip
                .copy_from(panel, width * i as u32, 0)
                .map_err(|e| CycleGanError::Sink(e.to_string()))?;
        }
        Ok(strip)
    }
}

impl LoggingSink for PngSampleSink {
    fn log_samples(&mut self, epoch: usize, samples: &SampleImages) -> Result<(), CycleGanError> {
        let path = self.path_for(epoch);
        Self::render(samples)?
            .save(&path)
            .map_err(|e| CycleGanError::Sink(format!("{}: {e}", path.display())))
    }
}
