use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, check_parents_count, invalid_parent_index};
use crate::tensor::Tensor;

/// LeakyReLU：x if x > 0 else slope * x
#[derive(Clone)]
pub(in crate::nn) struct LeakyReLU {
    slope: f32,
}

impl LeakyReLU {
    pub(in crate::nn) const fn new(slope: f32) -> Self {
        Self { slope }
    }
}

impl TraitNode for LeakyReLU {
    fn type_name(&self) -> &'static str {
        "LeakyReLU"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        check_parents_count(self.type_name(), parents, 1)?;
        let slope = self.slope;
        Ok(parents[0].map(|x| if x > 0.0 { x } else { slope * x }))
    }

    fn calc_grad_to_parent(
        &self,
        parent_index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        if parent_index != 0 {
            return Err(invalid_parent_index(self.type_name(), parent_index));
        }
        let slope = self.slope;
        Ok(parents[0].zip_map(upstream_grad, |x, g| if x > 0.0 { g } else { slope * g }))
    }
}
