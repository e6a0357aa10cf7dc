//! Routing environment - replayable, fully batched state transitions for the decoder

use burn::prelude::*;
use burn::tensor::ElementConversion;

use crate::infra::{EnvError, distance_table};
use crate::state::{DepotOwnership, Instance, RoutingState};

use super::action::JointAction;
use super::context::{first_step_context, step_context};
use super::mask::{first_step_mask, next_mask, open_pairs, update_mask};

/// What the policy sees before each decision
#[derive(Debug, Clone)]
pub struct Observation<B: Backend> {
    /// [batch, n_car, n_node], true = forbidden
    pub mask: Tensor<B, 3, Bool>,
    /// [batch, n_car, embed_dim + 1]
    pub context: Tensor<B, 3>,
}

/// Multi-depot, multi-car routing environment over a batch of instances
pub struct RoutingEnv<B: Backend> {
    instance: Instance<B>,
    /// [batch, n_node, embed_dim], owned by the policy's encoder, never mutated here
    node_embeddings: Tensor<B, 3>,
    distance_table: Tensor<B, 3>,
    ownership: DepotOwnership<B>,
    state: RoutingState<B>,
}

impl<B: Backend> RoutingEnv<B> {
    /// Build the static tables and the initial state on the instance's device.
    pub fn new(instance: Instance<B>, node_embeddings: Tensor<B, 3>) -> Result<Self, EnvError> {
        let [batch, n_node, embed_dim] = node_embeddings.dims();
        let expected = [instance.batch_size(), instance.n_node()];
        if [batch, n_node] != expected {
            return Err(EnvError::ShapeMismatch {
                what: "node_embeddings",
                expected: vec![expected[0], expected[1], embed_dim],
                found: vec![batch, n_node, embed_dim],
            });
        }

        let distance_table = distance_table(instance.node_xy());
        let ownership = DepotOwnership::new(instance.car_start_node.clone(), instance.n_depot());
        let state = RoutingState::new(&instance);

        tracing::debug!(
            "Built routing env: batch={}, depots={}, customers={}, cars={}, embed_dim={}",
            batch,
            instance.n_depot(),
            instance.n_customer(),
            instance.n_car(),
            embed_dim
        );

        Ok(Self {
            instance,
            node_embeddings,
            distance_table,
            ownership,
            state,
        })
    }

    /// Restore the initial state and return the first-step observation.
    pub fn reset(&mut self) -> Observation<B> {
        self.state = RoutingState::new(&self.instance);
        Observation {
            mask: first_step_mask(&self.state, &self.ownership),
            context: first_step_context(&self.instance, &self.node_embeddings),
        }
    }

    /// Apply one chosen `(next_node, next_car)` per instance, both `[batch]`.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn step(
        &mut self,
        next_node: Tensor<B, 1, Int>,
        next_car: Tensor<B, 1, Int>,
    ) -> Observation<B> {
        self.state.advance(next_node.clone(), next_car.clone());
        self.state.accumulate_distance(&self.distance_table);
        let mask = update_mask(
            &mut self.state,
            &self.ownership,
            &self.instance.demand,
            next_node,
            next_car,
        );

        tracing::trace!("Step {} committed", self.state.trajectory_len() - 1);

        Observation {
            mask,
            context: step_context(&self.state, &self.node_embeddings),
        }
    }

    /// Return every car home and report the per-instance tour length. [batch]
    pub fn finish(&mut self) -> Tensor<B, 1> {
        self.state.force_return_all(&self.distance_table);
        tracing::debug!(
            "Returned all cars home after {} recorded positions",
            self.state.trajectory_len()
        );
        self.state.total_distance()
    }

    /// Mask of the current state, without committing an action.
    pub fn current_mask(&self) -> Tensor<B, 3, Bool> {
        next_mask(&self.state, &self.ownership, &self.instance.demand)
    }

    /// Whether any instance still has a (car, customer) pair that can be served.
    pub fn has_pending_work(&self) -> bool {
        let n_depot = self.instance.n_depot();
        let n_node = self.instance.n_node();
        let mask_customer = self.current_mask().slice([
            0..self.batch_size(),
            0..self.n_car(),
            n_depot..n_node,
        ]);
        let open = open_pairs(mask_customer, self.batch_size())
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();
        open > 0
    }

    /// [batch]
    pub fn all_customers_visited(&self) -> Tensor<B, 1, Bool> {
        self.state.visited.clone().all_dim(1).squeeze::<1>(1)
    }

    /// [batch]
    pub fn total_distance(&self) -> Tensor<B, 1> {
        self.state.total_distance()
    }

    pub fn joint_action(&self) -> JointAction {
        JointAction::new(self.n_car(), self.instance.n_node())
    }

    pub fn state(&self) -> &RoutingState<B> {
        &self.state
    }

    pub fn instance(&self) -> &Instance<B> {
        &self.instance
    }

    pub fn ownership(&self) -> &DepotOwnership<B> {
        &self.ownership
    }

    /// [batch, n_node, n_node]
    pub fn distance_table(&self) -> &Tensor<B, 3> {
        &self.distance_table
    }

    pub fn batch_size(&self) -> usize {
        self.instance.batch_size()
    }

    pub fn n_car(&self) -> usize {
        self.instance.n_car()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{to_bool_vec, to_f32_vec, to_i64_vec};
    use crate::state::InstanceData;
    use burn::backend::NdArray;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    type TestBackend = NdArray;

    fn make_env(batch: &[InstanceData]) -> RoutingEnv<TestBackend> {
        let device = Default::default();
        let instance = Instance::from_batch(batch, &device).unwrap();
        let embeddings = Tensor::zeros([batch.len(), instance.n_node(), 4], &device);
        RoutingEnv::new(instance, embeddings).unwrap()
    }

    fn ints(values: &[i64]) -> Tensor<TestBackend, 1, Int> {
        Tensor::from_data(TensorData::new(values.to_vec(), [values.len()]), &Default::default())
    }

    fn single_car() -> InstanceData {
        InstanceData {
            depot_xy: vec![[0.0, 0.0]],
            customer_xy: vec![[1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            demand: vec![1.0, 2.0, 3.0],
            car_start_node: vec![0],
            car_capacity: vec![6.0],
        }
    }

    fn random_instance(rng: &mut StdRng) -> InstanceData {
        let point = |rng: &mut StdRng| [rng.random::<f32>(), rng.random::<f32>()];
        InstanceData {
            depot_xy: (0..2).map(|_| point(rng)).collect(),
            customer_xy: (0..6).map(|_| point(rng)).collect(),
            demand: (0..6).map(|_| rng.random_range(1..=4) as f32).collect(),
            car_start_node: vec![0, 1, 1],
            car_capacity: vec![6.0, 5.0, 7.0],
        }
    }

    /// Uniformly pick an allowed (node, car) per instance from the host copy of the mask.
    fn pick_legal(
        mask: &[bool],
        batch: usize,
        n_car: usize,
        n_node: usize,
        rng: &mut StdRng,
    ) -> (Vec<i64>, Vec<i64>) {
        let mut nodes = Vec::with_capacity(batch);
        let mut cars = Vec::with_capacity(batch);
        for b in 0..batch {
            let row = &mask[b * n_car * n_node..(b + 1) * n_car * n_node];
            let legal: Vec<usize> = (0..row.len()).filter(|&i| !row[i]).collect();
            assert!(!legal.is_empty(), "instance {} has no legal action", b);
            let choice = legal[rng.random_range(0..legal.len())];
            cars.push((choice / n_node) as i64);
            nodes.push((choice % n_node) as i64);
        }
        (nodes, cars)
    }

    #[test]
    fn test_rejects_mismatched_embeddings() {
        let device = Default::default();
        let instance = Instance::<TestBackend>::from_batch(&[single_car()], &device).unwrap();
        let embeddings = Tensor::zeros([1, 3, 4], &device);
        assert!(matches!(
            RoutingEnv::new(instance, embeddings),
            Err(EnvError::ShapeMismatch { what: "node_embeddings", .. })
        ));
    }

    #[test]
    fn test_single_car_full_tour() {
        let mut env = make_env(&[single_car()]);
        let first = env.reset();
        assert_eq!(to_bool_vec(first.mask).unwrap(), vec![true, false, false, false]);
        assert_eq!(first.context.dims(), [1, 1, 5]);

        let mut last = None;
        for node in [2, 1, 3] {
            last = Some(env.step(ints(&[node]), ints(&[0])));
        }

        // after the third customer: all customers forbidden, home depot allowed
        let mask = to_bool_vec(last.unwrap().mask).unwrap();
        assert_eq!(mask, vec![false, true, true, true]);
        assert!(!env.has_pending_work());
        assert_eq!(to_bool_vec(env.all_customers_visited()).unwrap(), vec![true]);

        let cost = to_f32_vec(env.finish()).unwrap()[0];
        assert_eq!(env.state().trajectory_len(), 5);
        assert_eq!(to_i64_vec(env.state().trajectory()).unwrap(), vec![0, 2, 1, 3, 0]);
        assert!(to_f32_vec(env.state().capacity.clone()).unwrap()[0] >= 0.0);
        // 0 -> (1,1) -> (1,0) -> (0,1) -> 0
        let expected = 2.0f32.sqrt() + 1.0 + 2.0f32.sqrt() + 1.0;
        assert!((cost - expected).abs() < 1e-5);
    }

    #[test]
    fn test_heavy_customer_split_between_cars() {
        let data = InstanceData {
            depot_xy: vec![[0.0, 0.0]],
            customer_xy: vec![[0.5, 0.5], [0.2, 0.8]],
            demand: vec![5.0, 1.0],
            car_start_node: vec![0, 0],
            car_capacity: vec![3.0, 8.0],
        };
        let mut env = make_env(&[data]);
        env.reset();
        let mask = to_bool_vec(env.current_mask()).unwrap();
        // car A forbids customer 0, car B may take it
        assert!(mask[1]);
        assert!(!mask[4]);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut env = make_env(&[single_car()]);
        env.reset();
        env.step(ints(&[1]), ints(&[0]));
        let first = env.reset();

        assert_eq!(env.state().trajectory_len(), 1);
        assert_eq!(to_f32_vec(env.state().capacity.clone()).unwrap(), vec![6.0]);
        assert_eq!(to_bool_vec(first.mask).unwrap(), vec![true, false, false, false]);
    }

    #[test]
    fn test_random_rollouts_keep_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        let batch: Vec<InstanceData> = (0..4).map(|_| random_instance(&mut rng)).collect();
        let demand: Vec<Vec<f32>> = batch.iter().map(|d| d.demand.clone()).collect();
        let mut env = make_env(&batch);
        let (n_car, n_depot, n_customer) = (3, 2, 6);
        let n_node = n_depot + n_customer;

        let first = env.reset();
        let mut mask = to_bool_vec(first.mask).unwrap();
        for b in 0..batch.len() {
            for car in 0..n_car {
                let row = (b * n_car + car) * n_node;
                assert!(mask[row..row + n_depot].iter().all(|&m| m), "first step depot open");
            }
        }

        let mut visited = vec![false; batch.len() * n_customer];
        let mut capacity = to_f32_vec(env.state().capacity.clone()).unwrap();
        let mut run = vec![0.0f32; batch.len() * n_car];

        for _ in 0..(2 * n_customer + n_car) {
            let (nodes, cars) = pick_legal(&mask, batch.len(), n_car, n_node, &mut rng);
            let observation = env.step(ints(&nodes), ints(&cars));
            mask = to_bool_vec(observation.mask).unwrap();

            let now_visited = to_bool_vec(env.state().visited.clone()).unwrap();
            let now_capacity = to_f32_vec(env.state().capacity.clone()).unwrap();
            let now_run = to_f32_vec(env.state().car_run.clone()).unwrap();

            for b in 0..batch.len() {
                // monotonic visitation, no re-visit for any car
                for c in 0..n_customer {
                    if visited[b * n_customer + c] {
                        assert!(now_visited[b * n_customer + c]);
                    }
                    if now_visited[b * n_customer + c] {
                        for car in 0..n_car {
                            assert!(mask[(b * n_car + car) * n_node + n_depot + c]);
                        }
                    }
                }
                for car in 0..n_car {
                    let i = b * n_car + car;
                    let row = i * n_node;
                    // depot exclusivity
                    for depot in 0..n_depot {
                        if depot != batch[b].car_start_node[car] {
                            assert!(mask[row + depot]);
                        }
                    }
                    // capacity conservation
                    let acted = cars[b] as usize == car && nodes[b] as usize >= n_depot;
                    let expected = if acted {
                        capacity[i] - demand[b][nodes[b] as usize - n_depot]
                    } else {
                        capacity[i]
                    };
                    assert!((now_capacity[i] - expected).abs() < 1e-5);
                    // distance monotonic
                    assert!(now_run[i] + 1e-6 >= run[i]);
                }
            }

            visited = now_visited;
            capacity = now_capacity;
            run = now_run;
        }

        // distance equals the sum of table lookups along each car's trajectory
        env.finish();
        let trajectory = to_i64_vec(env.state().trajectory()).unwrap();
        let table = to_f32_vec(env.distance_table().clone()).unwrap();
        let run = to_f32_vec(env.state().car_run.clone()).unwrap();
        let steps = env.state().trajectory_len();
        for b in 0..batch.len() {
            for car in 0..n_car {
                let path = &trajectory[(b * n_car + car) * steps..(b * n_car + car + 1) * steps];
                let expected: f32 = path
                    .windows(2)
                    .map(|w| table[(b * n_node + w[0] as usize) * n_node + w[1] as usize])
                    .sum();
                assert!((run[b * n_car + car] - expected).abs() < 1e-4);
            }
        }
    }
}
