//! Host read-back helpers for burn tensors

use burn::prelude::*;

use super::EnvError;

pub fn to_f32_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>, EnvError> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|err| EnvError::TensorData(format!("{:?}", err)))
}

pub fn to_i64_vec<B: Backend, const D: usize>(
    tensor: Tensor<B, D, Int>,
) -> Result<Vec<i64>, EnvError> {
    tensor
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|err| EnvError::TensorData(format!("{:?}", err)))
}

/// Bool tensors go through their integer view so the backend's bool element type does not matter.
pub fn to_bool_vec<B: Backend, const D: usize>(
    tensor: Tensor<B, D, Bool>,
) -> Result<Vec<bool>, EnvError> {
    Ok(to_i64_vec(tensor.int())?.into_iter().map(|v| v != 0).collect())
}

/// Builds a `[rows, cols]` selector that is true at `column[row]` in each row.
pub fn one_hot_rows<B: Backend>(column: Tensor<B, 1, Int>, cols: usize) -> Tensor<B, 2, Bool> {
    let [rows] = column.dims();
    let device = column.device();
    let arange = Tensor::<B, 1, Int>::arange(0..cols as i64, &device)
        .unsqueeze_dim::<2>(0)
        .repeat_dim(0, rows);
    arange.equal(column.unsqueeze_dim::<2>(1).repeat_dim(1, cols))
}
