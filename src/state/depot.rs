use burn::prelude::*;

/// Fixed per-car depot indicators, built once from the home depots.
#[derive(Debug, Clone)]
pub struct DepotOwnership<B: Backend> {
    /// [batch, n_car, n_depot], true only at the car's home depot slot
    pub own: Tensor<B, 3, Bool>,
    /// [batch, n_car, n_depot], every depot the car may never select
    pub other: Tensor<B, 3, Bool>,
}

impl<B: Backend> DepotOwnership<B> {
    /// `car_start_node`: [batch, n_car] global node indices; depots occupy `0..n_depot`.
    pub fn new(car_start_node: Tensor<B, 2, Int>, n_depot: usize) -> Self {
        let [batch, n_car] = car_start_node.dims();
        let device = car_start_node.device();

        let slots = Tensor::<B, 1, Int>::arange(0..n_depot as i64, &device)
            .reshape([1, 1, n_depot])
            .repeat_dim(0, batch)
            .repeat_dim(1, n_car);
        let homes = car_start_node.unsqueeze_dim::<3>(2).repeat_dim(2, n_depot);

        let own = slots.equal(homes);
        let other = own.clone().bool_not();
        Self { own, other }
    }

    pub fn n_depot(&self) -> usize {
        self.own.dims()[2]
    }

    /// Every depot slot, for every car: the depot part of the first-step mask.
    pub fn all_depots(&self) -> Tensor<B, 3, Bool> {
        self.own.clone().bool_or(self.other.clone())
    }
}
