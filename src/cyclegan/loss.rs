/*
 * @Description  : 多项损失的组合（生成器损失、判别器损失）与不可变的损失记录
 *
 * 生成器：total = adv_y + adv_x + cyc_x + cyc_y + idt
 * - adv_y = BCE(D_Y(G_XY(x)), 1)，adv_x = BCE(D_X(G_YX(y)), 1)
 * - cyc_x = L1(G_YX(G_XY(x)), x)·λ_cyc，cyc_y = L1(G_XY(G_YX(y)), y)·λ_cyc
 * - idt = (L1(G_XY(x), x) + L1(G_YX(y), y))·λ_idt
 *
 * 判别器：total = (d_y + d_x) / 2，伪样本先 detach
 * - d_y = BCE(D_Y(fake_y), 0) + BCE(D_Y(y), 1)
 * - d_x = BCE(D_X(fake_x), 0) + BCE(D_X(x), 1)
 */

use super::{CycleGanError, ModelState};
use crate::data::Batch;
use crate::nn::{Var, VarLossOps};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 一组命名的损失值；构造后不可修改
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossRecord {
    values: BTreeMap<String, f32>,
}

impl LossRecord {
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f32)>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    /// 取出必需的指标
    pub fn require(&self, key: &str) -> Result<f32, CycleGanError> {
        self.get(key)
            .ok_or_else(|| CycleGanError::MissingMetric(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 两条记录的并集（键冲突时取`other`的值）
    pub fn merged(&self, other: &Self) -> Self {
        let mut values = self.values.clone();
        values.extend(other.values.iter().map(|(k, &v)| (k.clone(), v)));
        Self { values }
    }

    /// 所有值都必须有限，否则视为发散
    pub fn check_finite(&self) -> Result<(), CycleGanError> {
        match self.values.iter().find(|(_, v)| !v.is_finite()) {
            Some((term, &value)) => Err(CycleGanError::DivergedLoss {
                term: term.clone(),
                value,
            }),
            None => Ok(()),
        }
    }
}

impl std::fmt::Display for LossRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value:.4}")?;
        }
        Ok(())
    }
}

/// 生成器损失：总损失节点、分项记录，以及顺带算出的两个伪样本
#[derive(Debug)]
pub struct GeneratorLoss {
    pub total: Var,
    pub breakdown: LossRecord,
    pub fake_y: Var,
    pub fake_x: Var,
}

/// 判别器损失：总损失节点与分项记录
#[derive(Debug)]
pub struct DiscriminatorLoss {
    pub total: Var,
    pub breakdown: LossRecord,
}

/// 损失组合器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossComposer {
    lambda_cycle: f32,
    lambda_identity: f32,
}

impl Default for LossComposer {
    fn default() -> Self {
        Self::new(10.0, 25.0)
    }
}

impl LossComposer {
    pub const fn new(lambda_cycle: f32, lambda_identity: f32) -> Self {
        Self {
            lambda_cycle,
            lambda_identity,
        }
    }

    pub const fn lambda_cycle(&self) -> f32 {
        self.lambda_cycle
    }

    pub const fn lambda_identity(&self) -> f32 {
        self.lambda_identity
    }

    /// 生成器损失（梯度保留，可反向传播到生成器）
    pub fn generator_loss(
        &self,
        model: &ModelState,
        batch: &Batch,
    ) -> Result<GeneratorLoss, CycleGanError> {
        model.check_batch(batch)?;
        let graph = model.graph();
        let g = model.generators();
        let d = model.critics();
        let n = batch.batch_size();

        let x = graph.input(&batch.x)?;
        let y = graph.input(&batch.y)?;
        let ones = graph.ones(&[n, 1])?;

        let fake_y = g.g_xy.forward(&x)?;
        let fake_x = g.g_yx.forward(&y)?;

        let adv_y = d.d_y.forward(&fake_y)?.bce_with_logits(&ones)?;
        let adv_x = d.d_x.forward(&fake_x)?.bce_with_logits(&ones)?;

        let cyc_x = g.g_yx.forward(&fake_y)?.l1_loss(&x)?.scale(self.lambda_cycle)?;
        let cyc_y = g.g_xy.forward(&fake_x)?.l1_loss(&y)?.scale(self.lambda_cycle)?;

        let idt = fake_y
            .l1_loss(&x)?
            .try_add(&fake_x.l1_loss(&y)?)?
            .scale(self.lambda_identity)?;

        let total = Var::sum_all(&[
            adv_y.clone(),
            adv_x.clone(),
            cyc_x.clone(),
            cyc_y.clone(),
            idt.clone(),
        ])?;

        let breakdown = LossRecord::from_pairs([
            ("g_loss", total.item()?),
            ("g_adv_y", adv_y.item()?),
            ("g_adv_x", adv_x.item()?),
            ("g_cyc_x", cyc_x.item()?),
            ("g_cyc_y", cyc_y.item()?),
            ("g_idt", idt.item()?),
        ]);
        breakdown.check_finite()?;

        Ok(GeneratorLoss {
            total,
            breakdown,
            fake_y,
            fake_x,
        })
    }

    /// 判别器损失：重新生成伪样本并 detach，梯度不会流入生成器
    pub fn discriminator_loss(
        &self,
        model: &ModelState,
        batch: &Batch,
    ) -> Result<DiscriminatorLoss, CycleGanError> {
        model.check_batch(batch)?;
        let graph = model.graph();
        let g = model.generators();
        let x = graph.input(&batch.x)?;
        let y = graph.input(&batch.y)?;
        let fake_y = g.g_xy.forward(&x)?;
        let fake_x = g.g_yx.forward(&y)?;
        self.discriminator_loss_with_fakes(model, &x, &y, &fake_y, &fake_x)
    }

    /// 用已有的伪样本计算判别器损失（验证时复用生成器损失里的伪样本）
    pub fn discriminator_loss_with_fakes(
        &self,
        model: &ModelState,
        x: &Var,
        y: &Var,
        fake_y: &Var,
        fake_x: &Var,
    ) -> Result<DiscriminatorLoss, CycleGanError> {
        let graph = model.graph();
        let d = model.critics();
        let n = x.shape()?.first().copied().unwrap_or(0);
        let zeros = graph.zeros(&[n, 1])?;
        let ones = graph.ones(&[n, 1])?;

        let fake_y = fake_y.detach()?;
        let fake_x = fake_x.detach()?;

        let d_y = d
            .d_y
            .forward(&fake_y)?
            .bce_with_logits(&zeros)?
            .try_add(&d.d_y.forward(y)?.bce_with_logits(&ones)?)?;
        let d_x = d
            .d_x
            .forward(&fake_x)?
            .bce_with_logits(&zeros)?
            .try_add(&d.d_x.forward(x)?.bce_with_logits(&ones)?)?;
        let total = d_y.try_add(&d_x)?.scale(0.5)?;

        let breakdown = LossRecord::from_pairs([
            ("d_loss", total.item()?),
            ("d_y", d_y.item()?),
            ("d_x", d_x.item()?),
        ]);
        breakdown.check_finite()?;

        Ok(DiscriminatorLoss { total, breakdown })
    }

    /// 验证用：一次前向同时得到两组分项（调用方负责 no_grad）
    pub fn validation_losses(
        &self,
        model: &ModelState,
        batch: &Batch,
    ) -> Result<(GeneratorLoss, LossRecord), CycleGanError> {
        let generator = self.generator_loss(model, batch)?;
        let graph = model.graph();
        let x = graph.input(&batch.x)?;
        let y = graph.input(&batch.y)?;
        let discriminator = self.discriminator_loss_with_fakes(
            model,
            &x,
            &y,
            &generator.fake_y,
            &generator.fake_x,
        )?;
        let record = generator.breakdown.merged(&discriminator.breakdown);
        Ok((generator, record))
    }
}
