/*
 * @Description  : Graph 句柄（用户级 API）
 */

use super::error::GraphError;
use super::inner::GraphInner;
use crate::nn::NodeId;
use crate::nn::var::{Init, Var};
use crate::tensor::Tensor;
use std::cell::RefCell;
use std::rc::Rc;

/// Graph - 计算图句柄（PyTorch 风格用户 API）
///
/// # 设计原则
/// - 是 `Rc<RefCell<GraphInner>>` 的薄封装（因此不是 `Send`，训练是单线程的）
/// - Clone 语义：多个 Graph 引用同一个 GraphInner
/// - 创建的 Var 自动持有图引用
#[derive(Clone)]
pub struct Graph {
    inner: Rc<RefCell<GraphInner>>,
}

impl Graph {
    // ==================== 创建 ====================

    pub fn new() -> Self {
        Self::from_inner(GraphInner::new())
    }

    /// 创建带种子的图（参数初始化可复现）
    pub fn new_with_seed(seed: u64) -> Self {
        Self::from_inner(GraphInner::new_with_seed(seed))
    }

    pub fn from_inner(inner: GraphInner) -> Self {
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub(crate) const fn from_rc(inner: Rc<RefCell<GraphInner>>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> std::cell::Ref<'_, GraphInner> {
        self.inner.borrow()
    }

    pub fn inner_mut(&self) -> std::cell::RefMut<'_, GraphInner> {
        self.inner.borrow_mut()
    }

    /// 将 NodeId 包装成 Var
    pub fn wrap_node_id(&self, node_id: NodeId) -> Var {
        Var::new(node_id, Rc::clone(&self.inner))
    }

    /// 两个句柄是否指向同一张图
    pub fn same_graph(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ==================== 创建变量 ====================

    /// 创建输入（常量）节点
    pub fn input(&self, data: &Tensor) -> Result<Var, GraphError> {
        let id = self.inner.borrow_mut().new_input_node(data, None)?;
        Ok(self.wrap_node_id(id))
    }

    /// 所有元素均为`value`的常量节点（如 GAN 的真/假标签）
    pub fn full(&self, value: f32, shape: &[usize]) -> Result<Var, GraphError> {
        self.input(&Tensor::full(value, shape))
    }

    pub fn zeros(&self, shape: &[usize]) -> Result<Var, GraphError> {
        self.full(0.0, shape)
    }

    pub fn ones(&self, shape: &[usize]) -> Result<Var, GraphError> {
        self.full(1.0, shape)
    }

    /// 创建参数节点（使用图的 RNG 初始化；无种子时退回 thread_rng）
    pub fn parameter(&self, shape: &[usize], init: Init, name: &str) -> Result<Var, GraphError> {
        let mut g = self.inner.borrow_mut();
        let init_data = match g.rng.as_mut() {
            Some(rng) => init.generate_with_rng(shape, rng),
            None => init.generate_with_rng(shape, &mut rand::thread_rng()),
        };
        let id = g.new_parameter_node(&init_data, name)?;
        Ok(Var::new(id, Rc::clone(&self.inner)))
    }

    // ==================== 训练控制 ====================

    /// 清零所有参数的梯度
    pub fn zero_grad(&self) {
        self.inner.borrow_mut().zero_grad();
    }

    pub fn train(&self) {
        self.inner.borrow_mut().set_train_mode();
    }

    pub fn eval(&self) {
        self.inner.borrow_mut().set_eval_mode();
    }

    pub fn is_eval(&self) -> bool {
        !self.inner.borrow().is_train_mode()
    }

    /// 在 no_grad 上下文中执行闭包：期间新建的节点不记录父子边，结束后恢复原模式
    pub fn no_grad_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Self) -> R,
    {
        let was_train = !self.is_eval();
        self.eval();
        let result = f(self);
        if was_train {
            self.train();
        }
        result
    }

    /// 释放所有中间节点，只保留参数
    pub fn release_intermediates(&self) {
        self.inner.borrow_mut().release_intermediate_results();
    }

    pub fn nodes_count(&self) -> usize {
        self.inner.borrow().nodes_count()
    }

    /// 图中所有参数（按创建顺序）
    pub fn parameters(&self) -> Vec<Var> {
        let ids = self.inner.borrow().get_trainable_nodes();
        ids.into_iter().map(|id| self.wrap_node_id(id)).collect()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
