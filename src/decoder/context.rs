//! Step context - per-car decision input handed to the policy network

use burn::prelude::*;

use crate::state::{Instance, RoutingState};

/// Embedding of each car's current node with its remaining capacity appended.
///
/// `node_embeddings`: [batch, n_node, embed_dim] -> [batch, n_car, embed_dim + 1]
pub fn step_context<B: Backend>(
    state: &RoutingState<B>,
    node_embeddings: &Tensor<B, 3>,
) -> Tensor<B, 3> {
    project(state.car_cur_node.clone(), state.capacity.clone(), node_embeddings)
}

/// Same shape as [`step_context`], read at each car's home depot with its initial capacity.
pub fn first_step_context<B: Backend>(
    instance: &Instance<B>,
    node_embeddings: &Tensor<B, 3>,
) -> Tensor<B, 3> {
    project(
        instance.car_start_node.clone(),
        instance.car_capacity.clone(),
        node_embeddings,
    )
}

fn project<B: Backend>(
    nodes: Tensor<B, 2, Int>,
    capacity: Tensor<B, 2>,
    node_embeddings: &Tensor<B, 3>,
) -> Tensor<B, 3> {
    let [_, _, embed_dim] = node_embeddings.dims();
    let index = nodes.unsqueeze_dim::<3>(2).repeat_dim(2, embed_dim);
    let embeddings = node_embeddings.clone().gather(1, index);
    Tensor::cat(vec![embeddings, capacity.unsqueeze_dim::<3>(2)], 2)
}
