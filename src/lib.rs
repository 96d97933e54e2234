//! # artifact_gan
//!
//! 用 CycleGAN 在两个非配对图像域之间做翻译：含伪影（X）与无伪影（Y）。
//! 目标函数由对抗损失与循环一致性损失组成。
//!
//! 核心是对抗训练的编排协议（见 [`cyclegan`]）：
//! - 两个生成器、两个判别器按交替且梯度隔离的方式优化；
//! - 多项损失的组合与分项记录；
//! - 跨 epoch 的验证指标聚合；
//! - 每个参数组各自的学习率平台期衰减；
//! - 最佳检查点保留与断点续训。
//!
//! 梯度由一个纯 CPU 的反向模式自动微分实现（见 [`nn`]），张量基于 `ndarray`（见 [`tensor`]）。

pub mod cyclegan;
pub mod data;
pub mod errors;
pub mod nn;
pub mod tensor;
pub mod utils;
