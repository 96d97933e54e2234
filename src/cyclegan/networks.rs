/*
 * @Description  : 可插拔的网络契约（生成器/判别器）与默认实现，以及四个网络组成的模型状态
 *
 * 2D 模式下输入为 [N, depth, H, W]，depth 作为通道：
 * - 生成器：形状不变的 [N, C, H, W] -> [N, C, H, W]
 * - 判别器：[N, C, H, W] -> [N, 1]，每个样本一个 logit
 */

use super::{CycleGanConfig, CycleGanError};
use crate::data::Batch;
use crate::nn::{
    Conv2d, Graph, GraphError, Linear, Module, Var, VarActivationOps, VarShapeOps,
};
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 图像翻译网络（生成器）：输出与输入同形
pub trait ImageTranslator: Module {
    fn forward(&self, x: &Var) -> Result<Var, GraphError>;
}

/// 域判别网络：每个样本输出一个 logit，形状 [N, 1]
pub trait DomainCritic: Module {
    fn forward(&self, x: &Var) -> Result<Var, GraphError>;
}

// ==================== 默认生成器 ====================

/// 残差卷积生成器：`tanh(x + conv_out(lrelu(conv_mid(lrelu(conv_in(x))))))`
///
/// 所有卷积都是 3x3、步长1、填充1，空间尺寸不变；输出落在与输入图像相同的 (-1, 1) 区间。
pub struct ResidualTranslator {
    conv_in: Conv2d,
    conv_mid: Conv2d,
    conv_out: Conv2d,
    slope: f32,
}

impl ResidualTranslator {
    pub fn new(
        graph: &Graph,
        channels: usize,
        n_filters: usize,
        slope: f32,
        name: &str,
    ) -> Result<Self, GraphError> {
        let conv = |in_c, out_c, suffix: &str| {
            Conv2d::new(graph, in_c, out_c, (3, 3), (1, 1), (1, 1), true, &format!("{name}_{suffix}"))
        };
        Ok(Self {
            conv_in: conv(channels, n_filters, "in")?,
            conv_mid: conv(n_filters, n_filters, "mid")?,
            conv_out: conv(n_filters, channels, "out")?,
            slope,
        })
    }
}

impl Module for ResidualTranslator {
    fn parameters(&self) -> Vec<Var> {
        [
            self.conv_in.parameters(),
            self.conv_mid.parameters(),
            self.conv_out.parameters(),
        ]
        .concat()
    }
}

impl ImageTranslator for ResidualTranslator {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let h = self.conv_in.forward(x)?.leaky_relu(self.slope)?;
        let h = self.conv_mid.forward(&h)?.leaky_relu(self.slope)?;
        let residual = self.conv_out.forward(&h)?;
        x.try_add(&residual)?.tanh()
    }
}

// ==================== 默认判别器 ====================

/// 可变深度卷积判别器
///
/// 第一块为 5x5 卷积（填充2），其余为 3x3 卷积（填充1）；每块后接 LeakyReLU 和 2x2 平均池化。
/// 第 i 块的输出通道为`min(n_filters * 2^i, 512)`。全连接层的输入长度由输入几何推出。
pub struct ConvCritic {
    blocks: Vec<Conv2d>,
    fc: Linear,
    slope: f32,
}

const MAX_CRITIC_CHANNELS: usize = 512;

impl ConvCritic {
    pub fn new(
        graph: &Graph,
        channels: usize,
        n_filters: usize,
        n_layers: usize,
        input_hw: (usize, usize),
        slope: f32,
        name: &str,
    ) -> Result<Self, GraphError> {
        let width_of = |i: usize| (n_filters << i).min(MAX_CRITIC_CHANNELS);

        let mut blocks = Vec::with_capacity(n_layers);
        blocks.push(Conv2d::new(
            graph,
            channels,
            width_of(0),
            (5, 5),
            (1, 1),
            (2, 2),
            true,
            &format!("{name}_conv0"),
        )?);
        for i in 1..n_layers {
            blocks.push(Conv2d::new(
                graph,
                width_of(i - 1),
                width_of(i),
                (3, 3),
                (1, 1),
                (1, 1),
                true,
                &format!("{name}_conv{i}"),
            )?);
        }

        let (out_h, out_w) = (input_hw.0 >> n_layers, input_hw.1 >> n_layers);
        if out_h == 0 || out_w == 0 {
            return Err(GraphError::InvalidOperation(format!(
                "输入尺寸{input_hw:?}经过{n_layers}次池化后为空"
            )));
        }
        let fc_in = width_of(n_layers - 1) * out_h * out_w;
        let fc = Linear::new(graph, fc_in, 1, true, &format!("{name}_fc"))?;

        Ok(Self { blocks, fc, slope })
    }
}

impl Module for ConvCritic {
    fn parameters(&self) -> Vec<Var> {
        let mut params: Vec<Var> = self.blocks.iter().flat_map(Module::parameters).collect();
        params.extend(self.fc.parameters());
        params
    }
}

impl DomainCritic for ConvCritic {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let mut h = x.clone();
        for block in &self.blocks {
            h = block.forward(&h)?.leaky_relu(self.slope)?.avg_pool2d(2)?;
        }
        self.fc.forward(&h.flatten()?)
    }
}

// ==================== 网络组合 ====================

/// 两个生成器：`g_xy`把 X 域映射到 Y 域，`g_yx`反之
pub struct NetworkPair {
    pub g_xy: Box<dyn ImageTranslator>,
    pub g_yx: Box<dyn ImageTranslator>,
}

/// 两个判别器：`d_x`判别 X 域真伪，`d_y`判别 Y 域真伪
pub struct DiscriminatorPair {
    pub d_x: Box<dyn DomainCritic>,
    pub d_y: Box<dyn DomainCritic>,
}

impl Module for NetworkPair {
    fn parameters(&self) -> Vec<Var> {
        [self.g_yx.parameters(), self.g_xy.parameters()].concat()
    }
}

impl Module for DiscriminatorPair {
    fn parameters(&self) -> Vec<Var> {
        [self.d_x.parameters(), self.d_y.parameters()].concat()
    }
}

/// 单个参数的快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub name: String,
    pub value: Tensor,
}

/// 模型状态：共享同一张图的四个网络
///
/// 生成器参数只在生成器步更新，判别器参数只在判别器步更新，验证期间都不变。
pub struct ModelState {
    graph: Graph,
    generators: NetworkPair,
    critics: DiscriminatorPair,
    sample_shape: [usize; 3],
}

impl ModelState {
    /// 组装任意（同图的）网络。`sample_shape`为单个样本的`[depth, height, width]`
    pub fn new(
        graph: Graph,
        generators: NetworkPair,
        critics: DiscriminatorPair,
        sample_shape: [usize; 3],
    ) -> Result<Self, CycleGanError> {
        let foreign = generators
            .parameters()
            .into_iter()
            .chain(critics.parameters())
            .any(|p| !p.get_graph().same_graph(&graph));
        if foreign {
            return Err(CycleGanError::InvalidConfig(
                "所有网络的参数必须位于同一张图中".to_string(),
            ));
        }
        Ok(Self {
            graph,
            generators,
            critics,
            sample_shape,
        })
    }

    /// 按配置构造默认网络（残差生成器 + 卷积判别器），参数用`config.seed`初始化
    pub fn from_config(config: &CycleGanConfig) -> Result<Self, CycleGanError> {
        config.validate()?;
        let graph = Graph::new_with_seed(config.seed);
        let [depth, height, width] = config.image_size;
        let translator = |name| {
            ResidualTranslator::new(&graph, depth, config.n_filters, config.leaky_slope, name)
        };
        let critic = |name| {
            ConvCritic::new(
                &graph,
                depth,
                config.n_filters,
                config.cnn_layers,
                (height, width),
                config.leaky_slope,
                name,
            )
        };
        let generators = NetworkPair {
            g_xy: Box::new(translator("g_xy")?),
            g_yx: Box::new(translator("g_yx")?),
        };
        let critics = DiscriminatorPair {
            d_x: Box::new(critic("d_x")?),
            d_y: Box::new(critic("d_y")?),
        };
        Self::new(graph, generators, critics, config.image_size)
    }

    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    pub const fn generators(&self) -> &NetworkPair {
        &self.generators
    }

    pub const fn critics(&self) -> &DiscriminatorPair {
        &self.critics
    }

    pub const fn sample_shape(&self) -> [usize; 3] {
        self.sample_shape
    }

    /// 生成器参数组（G_YX 在前，G_XY 在后）
    pub fn generator_params(&self) -> Vec<Var> {
        self.generators.parameters()
    }

    /// 判别器参数组（D_X 在前，D_Y 在后）
    pub fn discriminator_params(&self) -> Vec<Var> {
        self.critics.parameters()
    }

    /// 前向之前的形状检查：x、y 都须为 [N, depth, H, W]，N > 0
    pub fn check_batch(&self, batch: &Batch) -> Result<(), CycleGanError> {
        let [depth, height, width] = self.sample_shape;
        let n = batch.batch_size().max(1);
        let expected = vec![n, depth, height, width];
        for tensor in [&batch.x, &batch.y] {
            if tensor.shape() != expected.as_slice() {
                return Err(CycleGanError::ShapeMismatch {
                    expected,
                    actual: tensor.shape().to_vec(),
                });
            }
        }
        Ok(())
    }

    /// 导出所有网络参数
    pub fn snapshot(&self) -> Result<Vec<ParameterSnapshot>, CycleGanError> {
        self.all_params()
            .iter()
            .map(|param| {
                Ok(ParameterSnapshot {
                    name: param.name()?,
                    value: param.value()?,
                })
            })
            .collect()
    }

    /// 用快照覆盖参数；参数集合（名称）与形状必须完全一致，否则不做任何修改
    pub fn restore(&self, snapshots: &[ParameterSnapshot]) -> Result<(), CycleGanError> {
        let mismatch = |reason: String| CycleGanError::CheckpointRestoreMismatch { reason };

        let mut by_name: HashMap<String, Var> = HashMap::new();
        for param in self.all_params() {
            by_name.insert(param.name()?, param);
        }
        if by_name.len() != snapshots.len() {
            return Err(mismatch(format!(
                "参数个数不一致：模型{}个，检查点{}个",
                by_name.len(),
                snapshots.len()
            )));
        }

        let mut updates: BTreeMap<&str, (&Var, &Tensor)> = BTreeMap::new();
        for snapshot in snapshots {
            let param = by_name
                .get(&snapshot.name)
                .ok_or_else(|| mismatch(format!("模型中没有参数{}", snapshot.name)))?;
            let shape = param.shape()?;
            if snapshot.value.shape() != shape.as_slice() {
                return Err(mismatch(format!(
                    "参数{}形状不一致：模型{:?}，检查点{:?}",
                    snapshot.name,
                    shape,
                    snapshot.value.shape()
                )));
            }
            updates.insert(&snapshot.name, (param, &snapshot.value));
        }

        for (param, value) in updates.into_values() {
            param.set_value(value)?;
        }
        Ok(())
    }

    fn all_params(&self) -> Vec<Var> {
        [self.generator_params(), self.discriminator_params()].concat()
    }
}
