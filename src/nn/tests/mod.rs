
use crate::nn::{GraphError, NodeId, Var};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;
use std::collections::HashSet;

/// 中心差分数值梯度检查：`build_loss`须从`param`的当前值重新构造出 [1, 1] 损失
pub(super) fn assert_grad_matches_numeric<F>(param: &Var, build_loss: F, tolerance: f32)
where
    F: Fn() -> Result<Var, GraphError>,
{
    let targets: HashSet<NodeId> = [param.node_id()].into_iter().collect();
    param.get_graph().zero_grad();
    build_loss().unwrap().backward_to(&targets).unwrap();
    let analytic = param.grad().unwrap().expect("参数应当有梯度").to_vec();

    let base = param.value().unwrap();
    let shape = base.shape().to_vec();
    let data = base.to_vec();
    let eps = 1e-2;
    for i in 0..data.len() {
        let mut plus = data.clone();
        plus[i] += eps;
        param.set_value(&Tensor::new(&plus, &shape)).unwrap();
        let loss_plus = build_loss().unwrap().item().unwrap();

        let mut minus = data.clone();
        minus[i] -= eps;
        param.set_value(&Tensor::new(&minus, &shape)).unwrap();
        let loss_minus = build_loss().unwrap().item().unwrap();

        let numeric = (loss_plus - loss_minus) / (2.0 * eps);
        assert_abs_diff_eq!(analytic[i], numeric, epsilon = tolerance);
    }
    param.set_value(&base).unwrap();
}
