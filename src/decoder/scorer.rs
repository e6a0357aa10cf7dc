//! Trajectory scoring - total log-likelihood of the actions actually taken

use burn::prelude::*;

use crate::infra::EnvError;

/// Sum the log-probability of each chosen action over all decoding steps.
///
/// `log_p`: [batch, steps, n_actions], `chosen`: [batch, steps, 1] -> [batch]
pub fn log_likelihood<B: Backend>(
    log_p: Tensor<B, 3>,
    chosen: Tensor<B, 3, Int>,
) -> Result<Tensor<B, 1>, EnvError> {
    let [batch, steps, _] = log_p.dims();
    if chosen.dims() != [batch, steps, 1] {
        return Err(EnvError::ShapeMismatch {
            what: "chosen action indices",
            expected: vec![batch, steps, 1],
            found: chosen.dims().to_vec(),
        });
    }

    Ok(log_p.gather(2, chosen).squeeze::<2>(2).sum_dim(1).squeeze::<1>(1))
}

/// Step-wise accumulator used while decoding, so the full `[batch, steps, n_actions]`
/// history never has to be kept.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryScorer<B: Backend> {
    selected: Vec<Tensor<B, 2>>,
}

impl<B: Backend> TrajectoryScorer<B> {
    pub fn new() -> Self {
        Self {
            selected: Vec::new(),
        }
    }

    /// `log_p`: [batch, n_actions], `chosen`: [batch, 1]
    pub fn record(&mut self, log_p: Tensor<B, 2>, chosen: Tensor<B, 2, Int>) {
        self.selected.push(log_p.gather(1, chosen));
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// [batch]; `None` when nothing was recorded.
    pub fn total(&self) -> Option<Tensor<B, 1>> {
        if self.selected.is_empty() {
            return None;
        }
        Some(
            Tensor::cat(self.selected.clone(), 1)
                .sum_dim(1)
                .squeeze::<1>(1),
        )
    }
}
