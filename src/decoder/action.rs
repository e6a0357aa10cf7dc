//! Joint (car, node) action space flattened to `n_car * n_node` indices

use burn::prelude::*;

/// Index layout of the flattened action space: `index = car * n_node + node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointAction {
    pub n_car: usize,
    pub n_node: usize,
}

impl JointAction {
    pub fn new(n_car: usize, n_node: usize) -> Self {
        Self { n_car, n_node }
    }

    pub fn size(&self) -> usize {
        self.n_car * self.n_node
    }

    /// Split `[batch, 1]` joint indices into `(next_node, next_car)`, both `[batch]`.
    pub fn decode<B: Backend>(
        &self,
        index: Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1, Int>, Tensor<B, 1, Int>) {
        let index = index.squeeze::<1>(1);
        let car = index.clone().div_scalar(self.n_node as i64);
        let node = index - car.clone().mul_scalar(self.n_node as i64);
        (node, car)
    }

    /// Inverse of [`JointAction::decode`]: `[batch]` node and car to `[batch, 1]`.
    pub fn encode<B: Backend>(
        &self,
        next_node: Tensor<B, 1, Int>,
        next_car: Tensor<B, 1, Int>,
    ) -> Tensor<B, 2, Int> {
        (next_car.mul_scalar(self.n_node as i64) + next_node).unsqueeze_dim::<2>(1)
    }
}

/// Flatten `[batch, n_car, n_node]` logits and mask, forbidden entries set to `-inf`.
pub fn mask_logits<B: Backend>(logits: Tensor<B, 2>, mask: Tensor<B, 3, Bool>) -> Tensor<B, 2> {
    let [batch, n_car, n_node] = mask.dims();
    logits.mask_fill(mask.reshape([batch, n_car * n_node]), f32::NEG_INFINITY)
}
