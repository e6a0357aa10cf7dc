//! Rollout driver - runs one decoding episode over the whole batch

use burn::prelude::*;
use burn::tensor::activation::log_softmax;

use crate::infra::EnvError;

use super::action::mask_logits;
use super::env::RoutingEnv;
use super::policy::Policy;
use super::scorer::TrajectoryScorer;
use super::selector::DecodeType;

/// Rollout configuration
#[derive(Debug, Clone)]
pub struct RolloutConfig {
    /// Step limit; `None` means `2 * n_customer + n_car`
    pub max_steps: Option<usize>,
    /// Greedy or sampled action selection
    pub decode: DecodeType,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            max_steps: None,
            decode: DecodeType::Greedy,
        }
    }
}

/// Result of one episode
#[derive(Debug, Clone)]
pub struct RolloutOutput<B: Backend> {
    /// Total distance per instance [batch]
    pub cost: Tensor<B, 1>,
    /// Sum of the chosen actions' log-probabilities [batch]
    pub log_likelihood: Tensor<B, 1>,
    /// Joint car positions [batch, n_car, steps]
    pub trajectory: Tensor<B, 3, Int>,
    /// Decisions taken before the forced return
    pub steps: usize,
}

pub struct Rollout {
    config: RolloutConfig,
}

impl Rollout {
    pub fn new(config: RolloutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RolloutConfig {
        &self.config
    }

    /// Decode until no instance has serviceable work left, then send every car home.
    pub fn run<B: Backend, P: Policy<B>>(
        &self,
        env: &mut RoutingEnv<B>,
        policy: &mut P,
    ) -> Result<RolloutOutput<B>, EnvError> {
        let selector = self.config.decode.selector::<B>(1);
        let layout = env.joint_action();
        let max_steps = self
            .config
            .max_steps
            .unwrap_or(2 * env.instance().n_customer() + env.n_car());

        let mut scorer = TrajectoryScorer::new();
        let mut observation = env.reset();
        let mut steps = 0;

        while steps < max_steps && env.has_pending_work() {
            let logits = policy.logits(env, &observation);
            let log_p = log_softmax(mask_logits(logits, observation.mask.clone()), 1);
            let chosen = selector.select(log_p.clone())?;
            scorer.record(log_p, chosen.clone());

            let (next_node, next_car) = layout.decode(chosen);
            observation = env.step(next_node, next_car);
            steps += 1;
        }

        if steps == max_steps && env.has_pending_work() {
            tracing::warn!("Rollout hit the step limit ({}) with work remaining", max_steps);
        }

        let cost = env.finish();
        let log_likelihood = scorer
            .total()
            .unwrap_or_else(|| Tensor::zeros([env.batch_size()], &cost.device()));

        Ok(RolloutOutput {
            cost,
            log_likelihood,
            trajectory: env.state().trajectory(),
            steps,
        })
    }
}
