/*
 * @Description  : GraphInner VJP 反向传播
 *
 * 与“所有节点都累积梯度”的做法不同，这里只把梯度写入目标参数节点：
 * - 中间节点的梯度只存在于一次 backward 调用的局部表中；
 * - 不能到达任何目标参数的分支直接跳过（既省计算，也保证非目标参数的梯度不被触碰）。
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::tensor::Tensor;
use std::collections::{HashMap, HashSet};

impl GraphInner {
    /// 反向传播到图中所有参数，返回损失的标量值
    pub fn backward(&mut self, loss: NodeId) -> Result<f32, GraphError> {
        let targets: HashSet<NodeId> = self.get_trainable_nodes().into_iter().collect();
        self.backward_to(loss, &targets)
    }

    /// 反向传播，只把梯度累加到`targets`中的参数节点上，返回损失的标量值
    pub fn backward_to(&mut self, loss: NodeId, targets: &HashSet<NodeId>) -> Result<f32, GraphError> {
        if !self.is_grad_enabled() {
            tracing::warn!("在 no_grad/eval 模式下调用 backward，这通常是误用");
        }

        let loss_value = self.get_node_value(loss)?;
        if loss_value.shape() != [1, 1] {
            return Err(GraphError::InvalidOperation(format!(
                "反向传播要求损失为标量 [1, 1]，但得到 {:?}",
                loss_value.shape()
            )));
        }
        let loss_scalar = loss_value.get_data_number().unwrap_or(f32::NAN);

        let relevant = self.nodes_reaching_targets(loss, targets)?;
        if !relevant.contains(&loss) {
            return Ok(loss_scalar);
        }

        let mut grads: HashMap<NodeId, Tensor> = HashMap::new();
        grads.insert(loss, Tensor::ones(&[1, 1]));

        for node_id in self.topological_sort_backward(loss, &relevant)? {
            let Some(upstream_grad) = grads.remove(&node_id) else {
                continue;
            };

            if targets.contains(&node_id) {
                self.get_node_mut(node_id)?.accumulate_grad(&upstream_grad)?;
                continue;
            }

            let parent_ids = self.get_node_parents(node_id)?;
            let node = self.get_node(node_id)?;
            let parent_values = parent_ids
                .iter()
                .map(|&id| self.get_node_value(id))
                .collect::<Result<Vec<_>, _>>()?;

            for (index, parent_id) in parent_ids.iter().enumerate() {
                if !relevant.contains(parent_id) {
                    continue;
                }
                let parent_grad = node.calc_grad_to_parent(index, &parent_values, &upstream_grad)?;
                if !parent_grad.is_same_shape(parent_values[index]) {
                    return Err(GraphError::ComputationError(format!(
                        "{node}传给第{index}个父节点的梯度形状{:?}与父节点值形状{:?}不一致",
                        parent_grad.shape(),
                        parent_values[index].shape()
                    )));
                }
                match grads.get_mut(parent_id) {
                    Some(existing) => *existing += &parent_grad,
                    None => {
                        grads.insert(*parent_id, parent_grad);
                    }
                }
            }
        }

        Ok(loss_scalar)
    }

    /// 从`loss`出发（沿反向边）能到达某个目标参数的节点集合（含目标本身）
    fn nodes_reaching_targets(
        &self,
        loss: NodeId,
        targets: &HashSet<NodeId>,
    ) -> Result<HashSet<NodeId>, GraphError> {
        fn visit(
            graph: &GraphInner,
            node_id: NodeId,
            targets: &HashSet<NodeId>,
            memo: &mut HashMap<NodeId, bool>,
        ) -> Result<bool, GraphError> {
            if let Some(&reaches) = memo.get(&node_id) {
                return Ok(reaches);
            }
            let mut reaches = targets.contains(&node_id);
            for parent_id in graph.get_node_parents(node_id)? {
                // 不能短路：每个父节点都要记入 memo
                reaches |= visit(graph, parent_id, targets, memo)?;
            }
            memo.insert(node_id, reaches);
            Ok(reaches)
        }

        let mut memo = HashMap::new();
        visit(self, loss, targets, &mut memo)?;
        Ok(memo
            .into_iter()
            .filter_map(|(id, reaches)| reaches.then_some(id))
            .collect())
    }

    /// 拓扑排序（反向）：保证每个节点在其所有（相关的）子节点之后才被处理
    fn topological_sort_backward(
        &self,
        loss: NodeId,
        relevant: &HashSet<NodeId>,
    ) -> Result<Vec<NodeId>, GraphError> {
        fn dfs(
            graph: &GraphInner,
            node_id: NodeId,
            relevant: &HashSet<NodeId>,
            visited: &mut HashSet<NodeId>,
            post_order: &mut Vec<NodeId>,
        ) -> Result<(), GraphError> {
            if !visited.insert(node_id) {
                return Ok(());
            }
            for parent_id in graph.get_node_parents(node_id)? {
                if relevant.contains(&parent_id) {
                    dfs(graph, parent_id, relevant, visited, post_order)?;
                }
            }
            post_order.push(node_id);
            Ok(())
        }

        let mut visited = HashSet::new();
        let mut post_order = Vec::new();
        dfs(self, loss, relevant, &mut visited, &mut post_order)?;
        post_order.reverse();
        Ok(post_order)
    }

    // ========== 梯度清理 ==========

    /// 清除所有参数节点的梯度
    pub fn zero_grad(&mut self) {
        for node in self.nodes.values_mut() {
            node.clear_grad();
        }
    }

    /// 只清除指定节点的梯度
    pub fn zero_grad_of(&mut self, node_ids: &[NodeId]) -> Result<(), GraphError> {
        for &id in node_ids {
            self.get_node_mut(id)?.clear_grad();
        }
        Ok(())
    }
}
