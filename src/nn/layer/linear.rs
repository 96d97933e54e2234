/*
 * @Description  : Linear (全连接) 层
 */

use crate::nn::{Graph, GraphError, Init, Module, Var, VarMatrixOps};

/// Linear (全连接) 层：`output = x @ W + b`
///
/// - 输入：[batch_size, in_features]
/// - 输出：[batch_size, out_features]
pub struct Linear {
    /// 权重参数 [in_features, out_features]
    weights: Var,
    /// 偏置参数 [1, out_features]（可选）
    bias: Option<Var>,
    in_features: usize,
    out_features: usize,
    name: String,
}

impl Linear {
    /// 创建新的 Linear 层：权重 Kaiming 初始化（`{name}_W`），偏置零初始化（`{name}_b`）
    pub fn new(
        graph: &Graph,
        in_features: usize,
        out_features: usize,
        use_bias: bool,
        name: &str,
    ) -> Result<Self, GraphError> {
        let weights = graph.parameter(
            &[in_features, out_features],
            Init::Kaiming,
            &format!("{name}_W"),
        )?;
        let bias = if use_bias {
            Some(graph.parameter(&[1, out_features], Init::Zeros, &format!("{name}_b"))?)
        } else {
            None
        };

        Ok(Self {
            weights,
            bias,
            in_features,
            out_features,
            name: name.to_string(),
        })
    }

    /// 计算 `x @ W + b`（偏置按行广播）
    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let xw = x.matmul(&self.weights)?;
        match &self.bias {
            Some(bias) => xw.try_add(bias),
            None => Ok(xw),
        }
    }

    pub const fn in_features(&self) -> usize {
        self.in_features
    }

    pub const fn out_features(&self) -> usize {
        self.out_features
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Module for Linear {
    fn parameters(&self) -> Vec<Var> {
        let mut params = vec![self.weights.clone()];
        params.extend(self.bias.clone());
        params
    }
}
