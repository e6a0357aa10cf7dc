//! Action selectors - turn `[batch, n_actions]` scores into `[batch, k]` chosen indices
//!
//! - [`TopKSelector`] -> greedy; the k best scores, ties to the lower index
//! - [`CategoricalSelector`] -> sampling; k draws without replacement, weights `exp(score)`

use burn::prelude::*;

use crate::infra::{EnvError, to_f32_vec};

/// Stateless action selection strategy
pub trait ActionSelector<B: Backend> {
    fn select(&self, scores: Tensor<B, 2>) -> Result<Tensor<B, 2, Int>, EnvError>;
}

/// How actions are picked during a rollout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeType {
    Greedy,
    Sampling,
}

impl DecodeType {
    pub fn selector<B: Backend>(&self, k: usize) -> Box<dyn ActionSelector<B>> {
        match self {
            DecodeType::Greedy => Box::new(TopKSelector::new(k)),
            DecodeType::Sampling => Box::new(CategoricalSelector::new(k)),
        }
    }
}

impl std::str::FromStr for DecodeType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "greedy" => Ok(DecodeType::Greedy),
            "sampling" => Ok(DecodeType::Sampling),
            other => Err(format!("unknown decode type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TopKSelector {
    pub k: usize,
}

impl TopKSelector {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl<B: Backend> ActionSelector<B> for TopKSelector {
    fn select(&self, scores: Tensor<B, 2>) -> Result<Tensor<B, 2, Int>, EnvError> {
        stable_top_k(scores, self.k)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CategoricalSelector {
    pub k: usize,
}

impl CategoricalSelector {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl<B: Backend> ActionSelector<B> for CategoricalSelector {
    /// Gumbel-top-k: perturbing log-weights with Gumbel noise and keeping the k largest
    /// is a draw of k distinct indices proportional to `exp(score)`.
    fn select(&self, scores: Tensor<B, 2>) -> Result<Tensor<B, 2, Int>, EnvError> {
        let uniform = Tensor::<B, 2>::random(
            scores.shape(),
            burn::tensor::Distribution::Uniform(0.0, 1.0),
            &scores.device(),
        )
        .clamp(1e-10, 1.0 - 1e-7);
        let gumbel = -(-uniform.log()).log();
        stable_top_k(scores + gumbel, self.k)
    }
}

/// Indices of the k largest entries per row, in descending order; equal scores keep index order.
fn stable_top_k<B: Backend>(
    scores: Tensor<B, 2>,
    k: usize,
) -> Result<Tensor<B, 2, Int>, EnvError> {
    let [batch, n_actions] = scores.dims();
    let device = scores.device();
    let k = k.min(n_actions);
    let values = to_f32_vec(scores)?;

    let mut chosen = Vec::with_capacity(batch * k);
    for row in values.chunks(n_actions) {
        let mut order: Vec<usize> = (0..n_actions).collect();
        // sort_by is stable, so ties stay in ascending index order
        order.sort_by(|&a, &b| row[b].total_cmp(&row[a]));
        chosen.extend(order.into_iter().take(k).map(|i| i as i64));
    }

    Ok(Tensor::from_data(TensorData::new(chosen, [batch, k]), &device))
}
