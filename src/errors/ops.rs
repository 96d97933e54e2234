use std::fmt::{self, Display};

/// 张量的二元运算符（仅用于错误信息）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    AddAssign,
    Sub,
    Mul,
    Div,
    MatMul,
    Conv2d,
    ZipMap,
}
impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operation_name = match self {
            Self::Add => "相加",
            Self::AddAssign => "自相加",
            Self::Sub => "相减",
            Self::Mul => "相乘",
            Self::Div => "相除",
            Self::MatMul => "矩阵相乘",
            Self::Conv2d => "卷积",
            Self::ZipMap => "逐元素组合",
        };
        write!(f, "{operation_name}")
    }
}
