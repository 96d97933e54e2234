/*
 * @Description  : 节点句柄：图中每个节点的统一外壳（id、名称、值、梯度 + 具体的节点类型）
 *
 * 计算图是“即时求值”的：节点在创建时即根据父节点的值算出自身的值，
 * 所以一个存活的节点总是有值；梯度只会写入参数节点。
 */

use super::raw_node::{NodeType, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone)]
pub(in crate::nn) struct NodeHandle {
    id: NodeId,
    name: String,
    raw_node: NodeType,
    value: Tensor,
    grad: Option<Tensor>,
}

impl NodeHandle {
    pub(in crate::nn) fn new<T: Into<NodeType>>(
        id: NodeId,
        name: &str,
        raw_node: T,
        value: Tensor,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            raw_node: raw_node.into(),
            value,
            grad: None,
        }
    }

    pub(in crate::nn) const fn id(&self) -> NodeId {
        self.id
    }

    pub(in crate::nn) fn name(&self) -> &str {
        &self.name
    }

    pub(in crate::nn) const fn node_type(&self) -> &NodeType {
        &self.raw_node
    }

    pub(in crate::nn) const fn is_parameter(&self) -> bool {
        matches!(self.raw_node, NodeType::Parameter(_))
    }

    pub(in crate::nn) const fn is_input(&self) -> bool {
        matches!(self.raw_node, NodeType::Input(_))
    }

    pub(in crate::nn) const fn value(&self) -> &Tensor {
        &self.value
    }

    /// 只有输入、参数节点的值可以手动设置，且新值必须与旧值同形
    pub(in crate::nn) fn set_value(&mut self, value: &Tensor) -> Result<(), GraphError> {
        if !self.is_input() && !self.is_parameter() {
            return Err(GraphError::InvalidOperation(format!(
                "{self}的值由父节点计算得到，不能手动设置"
            )));
        }
        if !self.value.is_same_shape(value) {
            return Err(GraphError::ShapeMismatch {
                expected: self.value.shape().to_vec(),
                got: value.shape().to_vec(),
                message: format!("{self}的新值形状与原值不一致"),
            });
        }
        self.value = value.clone();
        Ok(())
    }

    pub(in crate::nn) const fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    pub(in crate::nn) fn accumulate_grad(&mut self, grad: &Tensor) -> Result<(), GraphError> {
        if !self.value.is_same_shape(grad) {
            return Err(GraphError::ShapeMismatch {
                expected: self.value.shape().to_vec(),
                got: grad.shape().to_vec(),
                message: format!("{self}收到的梯度形状与值不一致"),
            });
        }
        match self.grad.as_mut() {
            Some(existing) => *existing += grad,
            None => self.grad = Some(grad.clone()),
        }
        Ok(())
    }

    pub(in crate::nn) fn clear_grad(&mut self) {
        self.grad = None;
    }

    pub(in crate::nn) fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        self.raw_node
            .calc_grad_to_parent(parent_index, parents, &self.value, upstream_grad)
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "节点[id={}, name={}, type={}]",
            self.id.0,
            self.name,
            self.raw_node.type_name()
        )
    }
}
