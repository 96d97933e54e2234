/*
 * @Description  : Layer 模块 - 便捷结构体，组合 Node 构建常见网络结构
 */

mod conv2d;
mod linear;

pub use conv2d::Conv2d;
pub use linear::Linear;
