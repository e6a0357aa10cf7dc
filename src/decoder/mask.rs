//! Action masking - legality of every (car, node) pair for the next decision
//!
//! Masks are `[batch, n_car, n_node]` with depots first; `true` means forbidden.
//! Every update is a whole-batch tensor operation, no per-instance branching.

use burn::prelude::*;

use crate::infra::one_hot_rows;
use crate::state::{DepotOwnership, RoutingState};

/// Mask before any move: every depot is forbidden, customers are open unless already visited.
pub fn first_step_mask<B: Backend>(
    state: &RoutingState<B>,
    ownership: &DepotOwnership<B>,
) -> Tensor<B, 3, Bool> {
    let n_car = state.n_car();
    let mask_customer = state.visited.clone().unsqueeze_dim::<3>(1).repeat_dim(1, n_car);
    Tensor::cat(vec![ownership.all_depots(), mask_customer], 2)
}

/// Commit the visited/capacity consequences of the action just taken and derive the next mask.
///
/// Must run after the state has been advanced to `next_node` for `next_car`.
/// `demand`: [batch, n_customer]; `next_node`, `next_car`: [batch].
pub fn update_mask<B: Backend>(
    state: &mut RoutingState<B>,
    ownership: &DepotOwnership<B>,
    demand: &Tensor<B, 2>,
    next_node: Tensor<B, 1, Int>,
    next_car: Tensor<B, 1, Int>,
) -> Tensor<B, 3, Bool> {
    let [_, n_customer] = demand.dims();
    let n_depot = ownership.n_depot();
    let n_car = state.n_car();

    let is_next_customer = next_node.clone().greater_equal_elem(n_depot as i64);
    let customer_idx = (next_node - n_depot as i64).clamp(0, n_customer as i64 - 1);

    // Shared across cars; repeated marking of a customer is harmless
    let newly_visited = one_hot_rows(customer_idx.clone(), n_customer).bool_and(
        is_next_customer
            .clone()
            .unsqueeze_dim::<2>(1)
            .repeat_dim(1, n_customer),
    );
    state.visited = state.visited.clone().bool_or(newly_visited);

    // Only the acting car pays, and only when it went to a customer
    let selected_demand = demand
        .clone()
        .gather(1, customer_idx.unsqueeze_dim::<2>(1))
        .repeat_dim(1, n_car);
    let served = one_hot_rows(next_car, n_car).float()
        * is_next_customer.float().unsqueeze_dim::<2>(1).repeat_dim(1, n_car)
        * selected_demand;
    state.capacity = state.capacity.clone() - served;

    next_mask(state, ownership, demand)
}

/// Mask for the current state, without committing any action.
pub fn next_mask<B: Backend>(
    state: &RoutingState<B>,
    ownership: &DepotOwnership<B>,
    demand: &Tensor<B, 2>,
) -> Tensor<B, 3, Bool> {
    let [batch, n_customer] = demand.dims();
    let n_depot = ownership.n_depot();
    let n_car = state.n_car();

    let capacity_over_customer = demand
        .clone()
        .unsqueeze_dim::<3>(1)
        .repeat_dim(1, n_car)
        .greater(state.capacity.clone().unsqueeze_dim::<3>(2).repeat_dim(2, n_customer));
    let mask_customer = capacity_over_customer.bool_or(
        state
            .visited
            .clone()
            .unsqueeze_dim::<3>(1)
            .repeat_dim(1, n_car),
    );

    let work_remaining = open_pairs(mask_customer.clone(), batch)
        .unsqueeze_dim::<2>(1)
        .repeat_dim(1, n_car);
    let home_depot_pending = state.at_home().bool_and(work_remaining);

    let mask_depot = ownership
        .own
        .clone()
        .bool_and(home_depot_pending.unsqueeze_dim::<3>(2).repeat_dim(2, n_depot))
        .bool_or(ownership.other.clone());

    Tensor::cat(vec![mask_depot, mask_customer], 2)
}

/// Per instance: is any (car, customer) pair still selectable. [batch]
pub fn open_pairs<B: Backend>(
    mask_customer: Tensor<B, 3, Bool>,
    batch: usize,
) -> Tensor<B, 1, Bool> {
    mask_customer
        .bool_not()
        .reshape([batch as i32, -1])
        .any_dim(1)
        .squeeze::<1>(1)
}
