//! 集成测试共用的小工具
#![allow(dead_code)]

use artifact_gan::cyclegan::{CycleGanConfig, LossRecord};
use artifact_gan::data::Batch;
use artifact_gan::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// [2, 8, 8] 的小图像，便于在测试里快速跑完整个流程
pub fn tiny_config() -> CycleGanConfig {
    CycleGanConfig {
        image_size: [2, 8, 8],
        n_filters: 2,
        cnn_layers: 2,
        batch_size: 2,
        max_epochs: 2,
        ..CycleGanConfig::default()
    }
}

/// `n`个样本的 [-1, 1] 随机图像：[n, depth, height, width]
pub fn random_images(config: &CycleGanConfig, n: usize, seed: u64) -> Tensor {
    let [d, h, w] = config.image_size;
    let mut rng = StdRng::seed_from_u64(seed);
    Tensor::uniform_with_rng(-1.0, 1.0, &[n, d, h, w], &mut rng)
}

pub fn random_batches(config: &CycleGanConfig, count: usize, seed: u64) -> Vec<Batch> {
    (0..count as u64)
        .map(|i| {
            Batch::new(
                random_images(config, config.batch_size, seed + 2 * i),
                random_images(config, config.batch_size, seed + 2 * i + 1),
            )
        })
        .collect()
}

/// 只含验证指标的聚合记录
pub fn aggregate(g_loss_val: f32, d_loss_val: f32) -> LossRecord {
    LossRecord::from_pairs([
        ("g_loss_val", g_loss_val),
        ("d_loss_val", d_loss_val),
        ("val_loss", g_loss_val + d_loss_val),
    ])
}
