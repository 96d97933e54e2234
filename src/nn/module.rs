/*
 * @Description  : Module trait 定义
 */

use super::Var;

/// 模块 trait
///
/// # 设计原则
/// - `forward()` **不是** trait 方法（签名各异）
/// - `new()` **不是** trait 方法（参数各异）
/// - `parameters()` 返回 `Vec<Var>`（签名一致，放入 trait）
///
/// ```ignore
/// struct Critic {
///     conv: Conv2d,
///     fc: Linear,
/// }
///
/// impl Module for Critic {
///     fn parameters(&self) -> Vec<Var> {
///         [self.conv.parameters(), self.fc.parameters()].concat()
///     }
/// }
/// ```
pub trait Module {
    /// 获取所有可训练参数
    fn parameters(&self) -> Vec<Var>;

    /// 参数张量个数
    fn num_params(&self) -> usize {
        self.parameters().len()
    }
}
