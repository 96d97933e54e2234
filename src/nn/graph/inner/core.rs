/*
 * @Description  : GraphInner 基础操作
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::nodes::NodeHandle;
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;

impl GraphInner {
    // ========== 创建 ==========

    pub fn new() -> Self {
        Self::with_name("default_graph")
    }

    /// 创建一个带固定种子的计算图（确保参数初始化可重复）
    pub fn new_with_seed(seed: u64) -> Self {
        let mut graph = Self::new();
        graph.set_seed(seed);
        graph
    }

    pub fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: HashMap::new(),
            backward_edges: HashMap::new(),
            next_id: 0,
            is_eval_mode: false,
            rng: None,
        }
    }

    // ========== 基础访问器 ==========

    /// 设置/重置图的随机种子
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = Some(StdRng::seed_from_u64(seed));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    pub(in crate::nn) fn get_node(&self, id: NodeId) -> Result<&NodeHandle, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub(in crate::nn) fn get_node_mut(&mut self, id: NodeId) -> Result<&mut NodeHandle, GraphError> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// 父节点列表；no_grad 模式下创建的节点没有记录父节点
    pub fn get_node_parents(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        self.get_node(id)?;
        Ok(self.backward_edges.get(&id).cloned().unwrap_or_default())
    }

    pub fn get_node_name(&self, id: NodeId) -> Result<&str, GraphError> {
        Ok(self.get_node(id)?.name())
    }

    pub fn get_node_value(&self, id: NodeId) -> Result<&Tensor, GraphError> {
        Ok(self.get_node(id)?.value())
    }

    pub fn set_node_value(&mut self, id: NodeId, value: &Tensor) -> Result<(), GraphError> {
        self.get_node_mut(id)?.set_value(value)
    }

    pub fn get_node_grad(&self, id: NodeId) -> Result<Option<&Tensor>, GraphError> {
        let node = self.get_node(id)?;
        if node.is_input() {
            return Err(GraphError::InvalidOperation(format!(
                "输入{node}不应该有梯度"
            )));
        }
        Ok(node.grad())
    }

    /// 所有参数节点，按创建顺序排列
    pub fn get_trainable_nodes(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.is_parameter())
            .map(|(&id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    /// 按名称查找节点
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .values()
            .find(|node| node.name() == name)
            .map(NodeHandle::id)
    }

    // ========== ID/名称生成 ==========

    pub(in crate::nn::graph) fn generate_valid_node_id(&mut self) -> NodeId {
        // 先递增再返回，所以第一个节点 ID 是 1
        self.next_id += 1;
        NodeId(self.next_id)
    }

    pub(in crate::nn::graph) fn check_duplicate_node_name(&self, name: &str) -> Result<(), GraphError> {
        if self.nodes.values().any(|node| node.name() == name) {
            return Err(GraphError::DuplicateNodeName(format!(
                "节点{}在图{}中重复",
                name,
                self.name()
            )));
        }
        Ok(())
    }

    /// 用户给了名称就校验唯一性；否则生成`{类型}_{id}`形式的名称（id唯一，因而名称唯一）
    pub(in crate::nn::graph) fn generate_valid_new_node_name(
        &self,
        name: Option<&str>,
        node_type: &str,
        id: NodeId,
    ) -> Result<String, GraphError> {
        match name {
            Some(base_name) if !base_name.is_empty() => {
                self.check_duplicate_node_name(base_name)?;
                Ok(base_name.to_string())
            }
            _ => Ok(format!("{node_type}_{}", id.0)),
        }
    }

    // ========== 中间节点释放 ==========

    /// 删除所有非参数节点（及其边），使图的规模回到 O(参数个数)。
    /// 指向被删除节点的 `Var` 此后访问会得到 `NodeNotFound`。
    pub fn release_intermediate_results(&mut self) {
        self.nodes.retain(|_, node| node.is_parameter());
        self.backward_edges.clear();
    }
}
