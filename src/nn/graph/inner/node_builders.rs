/*
 * @Description  : GraphInner 节点创建（即时求值：创建即计算值）
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::nodes::raw_node::{
    Add, AvgPool2d, BceWithLogitsLoss, ChannelBiasAdd, Conv2d, Flatten, Input, L1Loss, LeakyReLU,
    MatMul, Parameter, ScalarMultiply, Tanh,
};
use crate::nn::nodes::{NodeHandle, NodeType, TraitNode};
use crate::tensor::Tensor;

impl GraphInner {
    // ========== 叶子节点 ==========

    pub fn new_input_node(&mut self, value: &Tensor, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.insert_leaf_node(Input, value, name)
    }

    /// 参数节点必须显式命名（名称用于检查点与优化器状态的对应）
    pub fn new_parameter_node(&mut self, value: &Tensor, name: &str) -> Result<NodeId, GraphError> {
        if name.is_empty() {
            return Err(GraphError::InvalidOperation(
                "参数节点必须有非空名称".to_string(),
            ));
        }
        self.insert_leaf_node(Parameter, value, Some(name))
    }

    fn insert_leaf_node<T: Into<NodeType>>(
        &mut self,
        raw_node: T,
        value: &Tensor,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let raw_node: NodeType = raw_node.into();
        let id = self.generate_valid_node_id();
        let name = self.generate_valid_new_node_name(name, raw_node.type_name(), id)?;
        self.nodes
            .insert(id, NodeHandle::new(id, &name, raw_node, value.clone()));
        Ok(id)
    }

    // ========== 运算节点 ==========

    /// 运算节点的统一创建流程：取父节点值 -> 计算本节点值 -> 插入节点；
    /// 只有在梯度开启（train 模式）时才记录父子边
    fn insert_computed_node<T: Into<NodeType>>(
        &mut self,
        raw_node: T,
        parent_ids: &[NodeId],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let raw_node: NodeType = raw_node.into();
        let value = {
            let parents = parent_ids
                .iter()
                .map(|&id| self.get_node_value(id))
                .collect::<Result<Vec<_>, _>>()?;
            raw_node.calc_value_by_parents(&parents)?
        };

        let id = self.generate_valid_node_id();
        let name = self.generate_valid_new_node_name(name, raw_node.type_name(), id)?;
        self.nodes
            .insert(id, NodeHandle::new(id, &name, raw_node, value));
        if self.is_grad_enabled() {
            self.backward_edges.insert(id, parent_ids.to_vec());
        }
        Ok(id)
    }

    pub fn new_add_node(&mut self, a: NodeId, b: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.insert_computed_node(Add, &[a, b], name)
    }

    pub fn new_scalar_multiply_node(
        &mut self,
        input: NodeId,
        factor: f32,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.insert_computed_node(ScalarMultiply::new(factor), &[input], name)
    }

    pub fn new_mat_mul_node(&mut self, a: NodeId, b: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.insert_computed_node(MatMul, &[a, b], name)
    }

    pub fn new_conv2d_node(
        &mut self,
        input: NodeId,
        kernel: NodeId,
        stride: (usize, usize),
        padding: (usize, usize),
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.insert_computed_node(Conv2d::new(stride, padding), &[input, kernel], name)
    }

    pub fn new_channel_bias_add_node(
        &mut self,
        input: NodeId,
        bias: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.insert_computed_node(ChannelBiasAdd, &[input, bias], name)
    }

    pub fn new_avg_pool2d_node(
        &mut self,
        input: NodeId,
        kernel: usize,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.insert_computed_node(AvgPool2d::new(kernel), &[input], name)
    }

    pub fn new_flatten_node(&mut self, input: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.insert_computed_node(Flatten, &[input], name)
    }

    pub fn new_leaky_relu_node(
        &mut self,
        input: NodeId,
        slope: f32,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.insert_computed_node(LeakyReLU::new(slope), &[input], name)
    }

    pub fn new_tanh_node(&mut self, input: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.insert_computed_node(Tanh, &[input], name)
    }

    // ========== 损失节点 ==========

    pub fn new_bce_with_logits_loss_node(
        &mut self,
        logits: NodeId,
        target: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.insert_computed_node(BceWithLogitsLoss, &[logits, target], name)
    }

    pub fn new_l1_loss_node(
        &mut self,
        input: NodeId,
        target: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.insert_computed_node(L1Loss, &[input, target], name)
    }
}
