/*
 * @Description  : GraphInner train/eval 模式、no_grad、detach 机制
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;

impl GraphInner {
    pub const fn set_train_mode(&mut self) {
        self.is_eval_mode = false;
    }

    pub const fn set_eval_mode(&mut self) {
        self.is_eval_mode = true;
    }

    pub const fn is_train_mode(&self) -> bool {
        !self.is_eval_mode
    }

    /// 只有 train 模式下新建的节点才会记录父子边
    pub const fn is_grad_enabled(&self) -> bool {
        self.is_train_mode()
    }

    // ========== detach 机制 ==========

    /// 截断梯度流：返回一个值相同、但没有父节点的新输入节点。
    /// no_grad 模式下节点本身就没有父边，直接返回原节点。
    pub fn detach_node(&mut self, node_id: NodeId) -> Result<NodeId, GraphError> {
        if !self.is_grad_enabled() {
            self.get_node(node_id)?;
            return Ok(node_id);
        }
        let value = self.get_node_value(node_id)?.clone();
        let name = format!("{}_detached", self.get_node_name(node_id)?);
        let name = if self.find_node_by_name(&name).is_some() {
            None
        } else {
            Some(name)
        };
        self.new_input_node(&value, name.as_deref())
    }

    /// no_grad 上下文
    pub fn no_grad_scope<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let was_train = self.is_train_mode();
        self.set_eval_mode();
        let result = f(self);
        if was_train {
            self.set_train_mode();
        }
        result
    }
}
