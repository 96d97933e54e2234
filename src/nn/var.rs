/*
 * @Description  : Var - 变量句柄：节点 ID + 图引用，支持链式调用
 *
 * 所有运算都返回 Result：形状不符、节点已释放等错误向上传播，而不是 panic。
 */

use super::graph::{Graph, GraphInner};
use super::{GraphError, NodeId};
use crate::tensor::Tensor;
use rand::Rng;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

// ==================== Init 枚举 ====================

/// 参数初始化策略
#[derive(Debug, Clone)]
pub enum Init {
    /// 常数初始化
    Constant(f32),
    /// 全零
    Zeros,
    /// 正态分布
    Normal { mean: f32, std: f32 },
    /// Kaiming/He 初始化（适用于 (Leaky)ReLU）
    Kaiming,
}

impl Init {
    /// 生成初始化后的 Tensor（使用指定的 RNG）
    pub fn generate_with_rng<R: Rng>(&self, shape: &[usize], rng: &mut R) -> Tensor {
        match self {
            Self::Constant(v) => Tensor::full(*v, shape),
            Self::Zeros => Tensor::zeros(shape),
            Self::Normal { mean, std } => Tensor::normal_with_rng(*mean, *std, shape, rng),
            Self::Kaiming => {
                let std = (2.0 / Self::fan_in(shape) as f32).sqrt();
                Tensor::normal_with_rng(0.0, std, shape, rng)
            }
        }
    }

    /// 卷积核 [C_out, C_in, kH, kW] 的 fan_in 为 C_in*kH*kW；全连接权重 [in, out] 为 in
    fn fan_in(shape: &[usize]) -> usize {
        let fan_in = match shape {
            [_, rest @ ..] if shape.len() == 4 => rest.iter().product(),
            [first, ..] => *first,
            [] => 1,
        };
        fan_in.max(1)
    }
}

// ==================== Var 结构 ====================

/// 变量句柄 - 携带图引用，支持链式调用
///
/// # 使用示例
/// ```ignore
/// let graph = Graph::new_with_seed(42);
/// let x = graph.input(&images)?;
/// let h = conv.forward(&x)?.leaky_relu(0.2)?;
/// let loss = h.flatten()?.matmul(&w)?.bce_with_logits(&labels)?;
/// loss.backward()?;
/// ```
#[derive(Clone)]
pub struct Var {
    id: NodeId,
    graph: Rc<RefCell<GraphInner>>,
}

impl std::fmt::Debug for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Var").field("id", &self.id).finish()
    }
}

impl Var {
    pub(crate) const fn new(id: NodeId, graph: Rc<RefCell<GraphInner>>) -> Self {
        Self { id, graph }
    }

    pub const fn node_id(&self) -> NodeId {
        self.id
    }

    pub(crate) const fn graph(&self) -> &Rc<RefCell<GraphInner>> {
        &self.graph
    }

    pub fn same_graph(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.graph, &other.graph)
    }

    /// 获取 Var 所属的 Graph handle
    pub fn get_graph(&self) -> Graph {
        Graph::from_rc(Rc::clone(&self.graph))
    }

    /// 对同图的另一个 Var 执行二元节点构造
    pub(crate) fn binary_op<F>(&self, other: &Self, op_name: &str, build: F) -> Result<Self, GraphError>
    where
        F: FnOnce(&mut GraphInner, NodeId, NodeId) -> Result<NodeId, GraphError>,
    {
        if !self.same_graph(other) {
            return Err(GraphError::InvalidOperation(format!(
                "不能对来自不同 Graph 的 Var 进行{op_name}"
            )));
        }
        let id = build(&mut *self.graph.borrow_mut(), self.id, other.id)?;
        Ok(Self::new(id, Rc::clone(&self.graph)))
    }

    /// 一元节点构造
    pub(crate) fn unary_op<F>(&self, build: F) -> Result<Self, GraphError>
    where
        F: FnOnce(&mut GraphInner, NodeId) -> Result<NodeId, GraphError>,
    {
        let id = build(&mut *self.graph.borrow_mut(), self.id)?;
        Ok(Self::new(id, Rc::clone(&self.graph)))
    }

    // ==================== 梯度流控制 ====================

    /// 截断梯度流（返回新的、无父节点的 Var；no_grad 模式下返回自身）
    pub fn detach(&self) -> Result<Self, GraphError> {
        self.unary_op(|g, id| g.detach_node(id))
    }

    // ==================== 反向传播 ====================

    /// 反向传播到图中所有参数，返回 loss 的标量值
    pub fn backward(&self) -> Result<f32, GraphError> {
        self.graph.borrow_mut().backward(self.id)
    }

    /// 反向传播，只把梯度写入`targets`中的参数
    pub fn backward_to(&self, targets: &HashSet<NodeId>) -> Result<f32, GraphError> {
        self.graph.borrow_mut().backward_to(self.id, targets)
    }

    // ==================== 值访问和设置 ====================

    /// 获取节点的值（克隆的 Tensor）
    pub fn value(&self) -> Result<Tensor, GraphError> {
        Ok(self.graph.borrow().get_node_value(self.id)?.clone())
    }

    pub fn shape(&self) -> Result<Vec<usize>, GraphError> {
        Ok(self.graph.borrow().get_node_value(self.id)?.shape().to_vec())
    }

    /// 设置节点的值（仅限输入/参数节点，且须同形）
    pub fn set_value(&self, value: &Tensor) -> Result<(), GraphError> {
        self.graph.borrow_mut().set_node_value(self.id, value)
    }

    /// 获取标量值（要求是单元素 Tensor）
    pub fn item(&self) -> Result<f32, GraphError> {
        self.value()?
            .get_data_number()
            .ok_or_else(|| GraphError::InvalidOperation("Tensor 不是标量".to_string()))
    }

    /// 获取节点的梯度
    pub fn grad(&self) -> Result<Option<Tensor>, GraphError> {
        Ok(self.graph.borrow().get_node_grad(self.id)?.cloned())
    }

    pub fn name(&self) -> Result<String, GraphError> {
        Ok(self.graph.borrow().get_node_name(self.id)?.to_string())
    }

    // ==================== 基础运算 ====================

    /// 加法（同形，或`other`为可按行广播的[1, m]）
    pub fn try_add(&self, other: &Self) -> Result<Self, GraphError> {
        self.binary_op(other, "加法", |g, a, b| g.new_add_node(a, b, None))
    }

    /// 乘以纯数
    pub fn scale(&self, factor: f32) -> Result<Self, GraphError> {
        self.unary_op(|g, id| g.new_scalar_multiply_node(id, factor, None))
    }

    /// 多个同图 Var 依次相加
    pub fn sum_all(vars: &[Self]) -> Result<Self, GraphError> {
        let (first, rest) = vars.split_first().ok_or_else(|| {
            GraphError::InvalidOperation("sum_all 至少需要一个 Var".to_string())
        })?;
        rest.iter().try_fold(first.clone(), |acc, var| acc.try_add(var))
    }
}
