mod error;
mod geometry;
mod tensor;

pub use error::EnvError;
pub use geometry::distance_table;
pub use tensor::{one_hot_rows, to_bool_vec, to_f32_vec, to_i64_vec};
