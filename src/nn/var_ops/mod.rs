/*
 * @Description  : Var 扩展 trait 模块
 *
 * 按功能领域组织 Var 的扩展方法，用户按需 import。
 *
 * # 模块结构
 * - `activation`: 激活函数（leaky_relu, tanh）
 * - `loss`: 损失函数（bce_with_logits, l1_loss）
 * - `matrix`: 矩阵运算（matmul）
 * - `shape`: 形状变换（flatten, avg_pool2d）
 */

mod activation;
mod loss;
mod matrix;
mod shape;

pub use activation::VarActivationOps;
pub use loss::VarLossOps;
pub use matrix::VarMatrixOps;
pub use shape::VarShapeOps;
