//! # 常用接口模块
//!
//! 目前只包含单元测试用的断言宏（通过`#[macro_export]`导出到crate根）
