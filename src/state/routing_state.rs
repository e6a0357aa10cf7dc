//! Mutable per-batch routing state: positions, capacity, distance, history, visited customers

use burn::prelude::*;

use super::Instance;
use crate::infra::one_hot_rows;

#[derive(Debug, Clone)]
pub struct RoutingState<B: Backend> {
    /// Home depot per car [batch, n_car]
    pub car_start_node: Tensor<B, 2, Int>,
    /// Current node per car [batch, n_car]
    pub car_cur_node: Tensor<B, 2, Int>,
    /// Node each car occupied before its last move [batch, n_car]
    pub car_prev_node: Tensor<B, 2, Int>,
    /// Remaining capacity per car [batch, n_car]; not clamped at zero
    pub capacity: Tensor<B, 2>,
    /// Distance each car has run [batch, n_car]
    pub car_run: Tensor<B, 2>,
    /// Customers served by any car [batch, n_customer]
    pub visited: Tensor<B, 2, Bool>,
    /// Cars that moved in the last transition [batch, n_car]
    acting: Tensor<B, 2, Bool>,
    /// Joint positions, one [batch, n_car] entry per recorded step
    pi: Vec<Tensor<B, 2, Int>>,
}

impl<B: Backend> RoutingState<B> {
    pub fn new(instance: &Instance<B>) -> Self {
        let device = instance.device();
        let [batch, n_car] = instance.car_start_node.dims();
        let start = instance.car_start_node.clone();

        Self {
            car_cur_node: start.clone(),
            car_prev_node: start.clone(),
            capacity: instance.car_capacity.clone(),
            car_run: Tensor::zeros([batch, n_car], &device),
            visited: Tensor::<B, 2, Int>::zeros([batch, instance.n_customer()], &device)
                .equal_elem(1),
            acting: Tensor::<B, 2, Int>::zeros([batch, n_car], &device).equal_elem(1),
            pi: vec![start.clone()],
            car_start_node: start,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.car_cur_node.dims()[0]
    }

    pub fn n_car(&self) -> usize {
        self.car_cur_node.dims()[1]
    }

    /// Move `next_car` to `next_node` in every instance; other cars stay put.
    ///
    /// `next_node`, `next_car`: [batch]
    pub fn advance(&mut self, next_node: Tensor<B, 1, Int>, next_car: Tensor<B, 1, Int>) {
        let n_car = self.n_car();
        let acting = one_hot_rows(next_car, n_car);
        let destination = next_node.unsqueeze_dim::<2>(1).repeat_dim(1, n_car);

        self.car_prev_node = self
            .car_prev_node
            .clone()
            .mask_where(acting.clone(), self.car_cur_node.clone());
        self.car_cur_node = self
            .car_cur_node
            .clone()
            .mask_where(acting.clone(), destination);
        self.acting = acting;
        self.pi.push(self.car_cur_node.clone());
    }

    /// Add `dist[prev][cur]` to the run of every car that moved in the last transition.
    ///
    /// `distance_table`: [batch, n_node, n_node]
    pub fn accumulate_distance(&mut self, distance_table: &Tensor<B, 3>) {
        let [_, n_node, _] = distance_table.dims();

        let from_prev = distance_table.clone().gather(
            1,
            self.car_prev_node
                .clone()
                .unsqueeze_dim::<3>(2)
                .repeat_dim(2, n_node),
        );
        let step = from_prev
            .gather(2, self.car_cur_node.clone().unsqueeze_dim::<3>(2))
            .squeeze::<2>(2);

        self.car_run = self.car_run.clone() + step * self.acting.clone().float();
    }

    /// Send every car home at once and record the final joint position.
    pub fn force_return_all(&mut self, distance_table: &Tensor<B, 3>) {
        self.car_prev_node = self.car_cur_node.clone();
        self.car_cur_node = self.car_start_node.clone();
        self.acting = self.car_cur_node.clone().equal(self.car_cur_node.clone());
        self.accumulate_distance(distance_table);
        self.pi.push(self.car_cur_node.clone());
    }

    /// [batch, n_car, steps]
    pub fn trajectory(&self) -> Tensor<B, 3, Int> {
        Tensor::stack(self.pi.clone(), 2)
    }

    /// Number of recorded joint positions, including the start.
    pub fn trajectory_len(&self) -> usize {
        self.pi.len()
    }

    /// [batch, n_car]
    pub fn at_home(&self) -> Tensor<B, 2, Bool> {
        self.car_cur_node.clone().equal(self.car_start_node.clone())
    }

    /// [batch]
    pub fn total_distance(&self) -> Tensor<B, 1> {
        self.car_run.clone().sum_dim(1).squeeze::<1>(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{distance_table, to_f32_vec, to_i64_vec};
    use crate::state::InstanceData;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn instance() -> Instance<TestBackend> {
        let data = InstanceData {
            depot_xy: vec![[0.0, 0.0]],
            customer_xy: vec![[3.0, 4.0], [3.0, 0.0]],
            demand: vec![1.0, 1.0],
            car_start_node: vec![0, 0],
            car_capacity: vec![5.0, 5.0],
        };
        Instance::from_batch(&[data], &Default::default()).unwrap()
    }

    fn ints(values: [i64; 1]) -> Tensor<TestBackend, 1, Int> {
        Tensor::from_ints(values, &Default::default())
    }

    #[test]
    fn test_advance_moves_only_acting_car() {
        let mut state = RoutingState::new(&instance());
        state.advance(ints([1]), ints([1]));

        assert_eq!(to_i64_vec(state.car_cur_node.clone()).unwrap(), vec![0, 1]);
        assert_eq!(to_i64_vec(state.car_prev_node.clone()).unwrap(), vec![0, 0]);
        assert_eq!(state.trajectory_len(), 2);
        assert_eq!(
            to_i64_vec(state.trajectory()).unwrap(),
            vec![0, 0, 0, 1]
        );
    }

    #[test]
    fn test_accumulate_distance_for_acting_car_only() {
        let instance = instance();
        let table = distance_table(instance.node_xy());
        let mut state = RoutingState::new(&instance);

        state.advance(ints([1]), ints([0]));
        state.accumulate_distance(&table);
        state.advance(ints([2]), ints([1]));
        state.accumulate_distance(&table);

        // car 0: depot -> (3,4) = 5; car 1: depot -> (3,0) = 3
        let run = to_f32_vec(state.car_run.clone()).unwrap();
        assert!((run[0] - 5.0).abs() < 1e-5);
        assert!((run[1] - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_force_return_all() {
        let instance = instance();
        let table = distance_table(instance.node_xy());
        let mut state = RoutingState::new(&instance);

        state.advance(ints([1]), ints([0]));
        state.accumulate_distance(&table);
        state.advance(ints([2]), ints([1]));
        state.accumulate_distance(&table);
        state.force_return_all(&table);

        assert_eq!(to_i64_vec(state.car_cur_node.clone()).unwrap(), vec![0, 0]);
        assert_eq!(state.trajectory_len(), 4);
        let total = to_f32_vec(state.total_distance()).unwrap()[0];
        assert!((total - 16.0).abs() < 1e-4);
    }
}
