use crate::nn::{GraphError, Var};

/// 激活函数扩展 trait
///
/// ```ignore
/// use artifact_gan::nn::VarActivationOps;
///
/// let h = x.leaky_relu(0.2)?;
/// let out = h.tanh()?;
/// ```
pub trait VarActivationOps {
    /// `LeakyReLU` 激活：x if x > 0 else slope * x
    fn leaky_relu(&self, slope: f32) -> Result<Var, GraphError>;

    /// Tanh 激活
    fn tanh(&self) -> Result<Var, GraphError>;
}

impl VarActivationOps for Var {
    fn leaky_relu(&self, slope: f32) -> Result<Var, GraphError> {
        self.unary_op(|g, id| g.new_leaky_relu_node(id, slope, None))
    }

    fn tanh(&self) -> Result<Var, GraphError> {
        self.unary_op(|g, id| g.new_tanh_node(id, None))
    }
}
