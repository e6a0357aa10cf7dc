//! Policy interface - the external network that scores the joint action space
//!
//! The attention model lives outside this crate; the two policies here are
//! stand-ins for demos and tests.

use burn::prelude::*;

use super::env::{Observation, RoutingEnv};

pub trait Policy<B: Backend> {
    /// Unnormalised scores over the flattened (car, node) space: [batch, n_car * n_node]
    fn logits(&mut self, env: &RoutingEnv<B>, observation: &Observation<B>) -> Tensor<B, 2>;
}

/// Equal score for every action
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformPolicy;

impl<B: Backend> Policy<B> for UniformPolicy {
    fn logits(&mut self, _env: &RoutingEnv<B>, observation: &Observation<B>) -> Tensor<B, 2> {
        let [batch, n_car, n_node] = observation.mask.dims();
        Tensor::zeros([batch, n_car * n_node], &observation.context.device())
    }
}

/// Scores each (car, node) by the negative distance from the car's current node
#[derive(Debug, Clone, Copy)]
pub struct NearestPolicy {
    /// Sharpness of the preference for short hops
    pub temperature: f32,
}

impl Default for NearestPolicy {
    fn default() -> Self {
        Self { temperature: 1.0 }
    }
}

impl<B: Backend> Policy<B> for NearestPolicy {
    fn logits(&mut self, env: &RoutingEnv<B>, observation: &Observation<B>) -> Tensor<B, 2> {
        let [batch, n_car, n_node] = observation.mask.dims();
        let index = env
            .state()
            .car_cur_node
            .clone()
            .unsqueeze_dim::<3>(2)
            .repeat_dim(2, n_node);
        let hops = env.distance_table().clone().gather(1, index);
        hops.reshape([batch, n_car * n_node])
            .div_scalar(self.temperature)
            .neg()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::to_f32_vec;
    use crate::state::{Instance, InstanceData};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn env() -> RoutingEnv<TestBackend> {
        let data = InstanceData {
            depot_xy: vec![[0.0, 0.0]],
            customer_xy: vec![[2.0, 0.0], [0.0, 1.0]],
            demand: vec![1.0, 1.0],
            car_start_node: vec![0, 0],
            car_capacity: vec![3.0, 3.0],
        };
        let device = Default::default();
        let instance = Instance::from_batch(&[data], &device).unwrap();
        RoutingEnv::new(instance, Tensor::zeros([1, 3, 2], &device)).unwrap()
    }

    #[test]
    fn test_uniform_policy_shape() {
        let mut env = env();
        let observation = env.reset();
        let logits = UniformPolicy.logits(&env, &observation);
        assert_eq!(logits.dims(), [1, 6]);
        assert!(to_f32_vec(logits).unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_nearest_policy_prefers_short_hops() {
        let mut env = env();
        let observation = env.reset();
        let logits = to_f32_vec(NearestPolicy::default().logits(&env, &observation)).unwrap();
        assert_eq!(logits, vec![0.0, -2.0, -1.0, 0.0, -2.0, -1.0]);
    }
}
