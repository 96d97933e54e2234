mod bce_with_logits;
mod l1_loss;

pub(in crate::nn) use bce_with_logits::BceWithLogitsLoss;
pub(in crate::nn) use l1_loss::L1Loss;

use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 损失节点的两个父节点（预测、目标）须同形且非空
fn check_loss_pair(type_name: &str, input: &Tensor, target: &Tensor) -> Result<(), GraphError> {
    if !input.is_same_shape(target) {
        return Err(GraphError::ShapeMismatch {
            expected: input.shape().to_vec(),
            got: target.shape().to_vec(),
            message: format!("{type_name}的预测与目标形状须一致"),
        });
    }
    if input.size() == 0 {
        return Err(GraphError::InvalidOperation(format!(
            "{type_name}的输入不能为空"
        )));
    }
    Ok(())
}
