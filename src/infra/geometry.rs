use burn::prelude::*;

/// Builds the all-pairs Euclidean distance table for every instance in the batch.
///
/// `xy`: `[batch, n_node, 2]` -> `[batch, n_node, n_node]`, entry `(i, j) = ||xy_i - xy_j||`.
pub fn distance_table<B: Backend>(xy: Tensor<B, 3>) -> Tensor<B, 3> {
    let [_, n_node, _] = xy.dims();

    // rows[b, i, j] = xy[b, j], cols[b, i, j] = xy[b, i]
    let rows = xy.clone().unsqueeze_dim::<4>(1).repeat_dim(1, n_node);
    let cols = xy.unsqueeze_dim::<4>(2).repeat_dim(2, n_node);

    (rows - cols)
        .powf_scalar(2.0)
        .sum_dim(3)
        .squeeze::<3>(3)
        .sqrt()
}
