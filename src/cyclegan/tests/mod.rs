mod checkpoint;
mod config;
mod validation;

use crate::cyclegan::{
    ConvCritic, CycleGanConfig, DiscriminatorPair, ImageTranslator, ModelState, NetworkPair,
};
use crate::data::Batch;
use crate::nn::{Graph, GraphError, Module, Var};
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// 小尺寸配置：[2, 8, 8] 图像，2 个滤波器
pub(super) fn tiny_config() -> CycleGanConfig {
    CycleGanConfig {
        image_size: [2, 8, 8],
        n_filters: 2,
        cnn_layers: 2,
        batch_size: 2,
        max_epochs: 3,
        ..CycleGanConfig::default()
    }
}

/// [-1, 1] 均匀分布的随机批次
pub(super) fn random_batch(config: &CycleGanConfig, seed: u64) -> Batch {
    let [d, h, w] = config.image_size;
    let shape = [config.batch_size, d, h, w];
    let mut rng = StdRng::seed_from_u64(seed);
    Batch::new(
        Tensor::uniform_with_rng(-1.0, 1.0, &shape, &mut rng),
        Tensor::uniform_with_rng(-1.0, 1.0, &shape, &mut rng),
    )
}

/// 恒等生成器：没有参数，输出即输入
pub(super) struct IdentityTranslator;

impl Module for IdentityTranslator {
    fn parameters(&self) -> Vec<Var> {
        Vec::new()
    }
}

impl ImageTranslator for IdentityTranslator {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        Ok(x.clone())
    }
}

/// 生成器为恒等映射、判别器为默认卷积判别器的模型
pub(super) fn identity_model(config: &CycleGanConfig) -> ModelState {
    let graph = Graph::new_with_seed(config.seed);
    let [depth, height, width] = config.image_size;
    let critic = |name| {
        ConvCritic::new(&graph, depth, config.n_filters, config.cnn_layers, (height, width), 0.2, name)
            .unwrap()
    };
    let critics = DiscriminatorPair {
        d_x: Box::new(critic("d_x")),
        d_y: Box::new(critic("d_y")),
    };
    let generators = NetworkPair {
        g_xy: Box::new(IdentityTranslator),
        g_yx: Box::new(IdentityTranslator),
    };
    ModelState::new(graph, generators, critics, config.image_size).unwrap()
}

pub(super) fn values_of(params: &[Var]) -> Vec<Tensor> {
    params.iter().map(|p| p.value().unwrap()).collect()
}
