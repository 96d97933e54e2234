/*
 * @Description  : CycleGAN 训练配置（不可变，字段全部列举并带默认值，可从 JSON 读写）
 */

use super::CycleGanError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 训练配置
///
/// 2D 模式：图像几何`[depth, height, width]`以`[N, depth, height, width]`输入网络，
/// depth 作为卷积的输入通道。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleGanConfig {
    /// `[depth, height, width]`
    pub image_size: [usize; 3],
    /// 两种网络的初始滤波器数
    pub n_filters: usize,
    /// 判别器卷积块数
    pub cnn_layers: usize,
    pub batch_size: usize,
    pub lambda_cycle: f32,
    pub lambda_identity: f32,
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    pub weight_decay: f32,
    pub patience: usize,
    pub factor: f32,
    pub plateau_threshold: f32,
    pub min_lr: f32,
    pub leaky_slope: f32,
    pub max_epochs: usize,
    pub seed: u64,
}

impl Default for CycleGanConfig {
    fn default() -> Self {
        Self {
            image_size: [8, 32, 32],
            n_filters: 8,
            cnn_layers: 2,
            batch_size: 2,
            lambda_cycle: 10.0,
            lambda_identity: 25.0,
            learning_rate: 2e-4,
            beta1: 0.5,
            beta2: 0.999,
            epsilon: 1e-8,
            weight_decay: 0.0,
            patience: 7,
            factor: 0.5,
            plateau_threshold: 1e-4,
            min_lr: 0.0,
            leaky_slope: 0.2,
            max_epochs: 100,
            seed: 42,
        }
    }
}

impl CycleGanConfig {
    pub fn validate(&self) -> Result<(), CycleGanError> {
        let invalid = |msg: String| Err(CycleGanError::InvalidConfig(msg));

        if self.image_size.contains(&0) {
            return invalid(format!("image_size 各维须大于0：{:?}", self.image_size));
        }
        if self.n_filters == 0 || self.cnn_layers == 0 || self.batch_size == 0 {
            return invalid("n_filters、cnn_layers、batch_size 须大于0".to_string());
        }
        let stride = 1usize.checked_shl(self.cnn_layers as u32).unwrap_or(0);
        let [_, height, width] = self.image_size;
        if stride == 0 || height % stride != 0 || width % stride != 0 {
            return invalid(format!(
                "高和宽须能被 2^cnn_layers={stride} 整除：{height}x{width}"
            ));
        }
        if !(self.factor > 0.0 && self.factor < 1.0) {
            return invalid(format!("factor 须在(0, 1)内：{}", self.factor));
        }
        if self.patience == 0 {
            return invalid("patience 须大于0".to_string());
        }
        if !(self.learning_rate > 0.0) || !self.learning_rate.is_finite() {
            return invalid(format!("learning_rate 须为正数：{}", self.learning_rate));
        }
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return invalid(format!("{name} 须在[0, 1)内：{beta}"));
            }
        }
        for (name, value) in [
            ("lambda_cycle", self.lambda_cycle),
            ("lambda_identity", self.lambda_identity),
            ("weight_decay", self.weight_decay),
            ("min_lr", self.min_lr),
            ("plateau_threshold", self.plateau_threshold),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return invalid(format!("{name} 须为非负有限数：{value}"));
            }
        }
        Ok(())
    }

    /// 从 JSON 文件读取（缺失字段取默认值），并校验
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CycleGanError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CycleGanError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// 与`other`取值不同、因而不能在断点续训时更换的字段名。
    ///
    /// 网络结构（参数名与形状）与训练超参数都必须一致；只有`seed`和`max_epochs`
    /// 这两个运行控制字段可以不同。
    pub fn resume_mismatches(&self, other: &Self) -> Vec<&'static str> {
        [
            ("image_size", self.image_size == other.image_size),
            ("n_filters", self.n_filters == other.n_filters),
            ("cnn_layers", self.cnn_layers == other.cnn_layers),
            ("batch_size", self.batch_size == other.batch_size),
            ("lambda_cycle", self.lambda_cycle == other.lambda_cycle),
            ("lambda_identity", self.lambda_identity == other.lambda_identity),
            ("learning_rate", self.learning_rate == other.learning_rate),
            ("beta1", self.beta1 == other.beta1),
            ("beta2", self.beta2 == other.beta2),
            ("epsilon", self.epsilon == other.epsilon),
            ("weight_decay", self.weight_decay == other.weight_decay),
            ("patience", self.patience == other.patience),
            ("factor", self.factor == other.factor),
            ("plateau_threshold", self.plateau_threshold == other.plateau_threshold),
            ("min_lr", self.min_lr == other.min_lr),
            ("leaky_slope", self.leaky_slope == other.leaky_slope),
        ]
        .into_iter()
        .filter_map(|(name, same)| (!same).then_some(name))
        .collect()
    }

    /// 单个样本的形状`[depth, height, width]`
    pub const fn sample_shape(&self) -> [usize; 3] {
        self.image_size
    }
}
