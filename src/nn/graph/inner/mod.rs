/*
 * @Description  : GraphInner 计算图的底层实现
 *
 * 各 impl 块分散在子模块中：
 * - core.rs: 基础访问、命名、中间节点释放
 * - node_builders.rs: new_*_node（即时求值）
 * - backward.rs: VJP 反向传播（可限定只写入指定参数）
 * - mode.rs: train/eval、no_grad、detach
 */

mod backward;
mod core;
mod mode;
mod node_builders;

use crate::nn::NodeId;
use crate::nn::nodes::NodeHandle;
use rand::rngs::StdRng;
use std::collections::HashMap;

/// 图的完整定义（核心实现）
///
/// 用户通常通过 `Graph` 句柄使用此结构。
pub struct GraphInner {
    pub(in crate::nn::graph) name: String,
    pub(in crate::nn::graph) nodes: HashMap<NodeId, NodeHandle>,
    /// 反向边：child_id -> parent_ids（按父节点顺序）
    pub(in crate::nn::graph) backward_edges: HashMap<NodeId, Vec<NodeId>>,
    pub(in crate::nn::graph) next_id: u64,
    pub(in crate::nn::graph) is_eval_mode: bool,
    /// 图级别的随机数生成器（用于参数初始化）
    /// None 表示使用 thread_rng（非确定性）
    pub(in crate::nn::graph) rng: Option<StdRng>,
}

impl Default for GraphInner {
    fn default() -> Self {
        Self::new()
    }
}
