use crate::tensor::Tensor;
use std::fmt;

impl fmt::Display for Tensor {
    /// 阶数不超过2的张量逐行打印；更高阶的张量（如图像批次）只打印统计摘要
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let shape = self.shape();
        match shape.len() {
            0 => write!(f, "{:8.4}", self.data.iter().next().copied().unwrap_or(f32::NAN))?,
            1 => write_row(f, self.data.iter().copied())?,
            2 => {
                write!(f, "[")?;
                for (i, row) in self.data.outer_iter().enumerate() {
                    if i > 0 {
                        write!(f, ",\n ")?;
                    }
                    write_row(f, row.iter().copied())?;
                }
                write!(f, "]")?;
            }
            _ => {
                let min = self.data.iter().copied().fold(f32::INFINITY, f32::min);
                let max = self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                write!(
                    f,
                    "<高阶张量：最小值{min:.4}，最大值{max:.4}，均值{:.4}>",
                    self.mean()
                )?;
            }
        }
        write!(f, "\n形状: {shape:?}")
    }
}

fn write_row(f: &mut fmt::Formatter, values: impl Iterator<Item = f32>) -> fmt::Result {
    write!(f, "[")?;
    for (i, value) in values.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{value:8.4}")?;
    }
    write!(f, "]")
}
