/*
 * @Description  : 优化器模块，实现 PyTorch 风格的梯度优化算法与学习率调度
 */

mod adam;
mod base;
mod plateau;

pub use adam::{Adam, AdamState};
pub use base::Optimizer;
pub use plateau::{PlateauState, ReduceLrOnPlateau};
