//! Rollout metrics - running statistics over decoded tours

use std::collections::VecDeque;
use std::time::Instant;

use burn::prelude::*;

use crate::infra::{EnvError, to_f32_vec};

use super::rollout::RolloutOutput;

/// Mean of the most recent `window` samples
#[derive(Debug, Clone)]
pub struct MovingAverage {
    recent: VecDeque<f32>,
    window: usize,
    total: f32,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(window),
            window: window.max(1),
            total: 0.0,
        }
    }

    pub fn push(&mut self, sample: f32) {
        if self.recent.len() == self.window {
            self.total -= self.recent.pop_front().unwrap_or_default();
        }
        self.recent.push_back(sample);
        self.total += sample;
    }

    /// Zero until the first sample arrives.
    pub fn average(&self) -> f32 {
        match self.recent.len() {
            0 => 0.0,
            n => self.total / n as f32,
        }
    }
}

/// Statistics over every instance of every recorded rollout
#[derive(Debug)]
pub struct RolloutMetrics {
    /// Per-instance tour length
    pub cost: MovingAverage,
    /// Per-instance log-likelihood
    pub log_likelihood: MovingAverage,
    /// Decisions per rollout
    pub steps: MovingAverage,
    /// Shortest tour seen
    pub best_cost: Option<f32>,
    /// Number of rollouts recorded
    pub num_rollouts: usize,
    /// Number of instances recorded
    pub num_instances: usize,
    start_time: Instant,
}

impl RolloutMetrics {
    pub fn new(window_size: usize) -> Self {
        Self {
            cost: MovingAverage::new(window_size),
            log_likelihood: MovingAverage::new(window_size),
            steps: MovingAverage::new(window_size),
            best_cost: None,
            num_rollouts: 0,
            num_instances: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one batch rollout
    pub fn record<B: Backend>(&mut self, output: &RolloutOutput<B>) -> Result<(), EnvError> {
        let costs = to_f32_vec(output.cost.clone())?;
        let log_likelihoods = to_f32_vec(output.log_likelihood.clone())?;

        for (&cost, &ll) in costs.iter().zip(log_likelihoods.iter()) {
            self.cost.push(cost);
            self.log_likelihood.push(ll);
            self.best_cost = Some(self.best_cost.map_or(cost, |best| best.min(cost)));
        }
        self.steps.push(output.steps as f32);
        self.num_rollouts += 1;
        self.num_instances += costs.len();
        Ok(())
    }

    /// Instances decoded per second
    pub fn instances_per_second(&self) -> f64 {
        let duration = self.start_time.elapsed().as_secs_f64();
        if duration > 0.0 {
            self.num_instances as f64 / duration
        } else {
            0.0
        }
    }

    /// Print summary
    pub fn print_summary(&self) {
        tracing::info!("=== Rollout Summary ===");
        tracing::info!(
            "Rollouts: {} ({} instances, {:.1}/s)",
            self.num_rollouts,
            self.num_instances,
            self.instances_per_second()
        );
        tracing::info!("Avg Cost: {:.4}", self.cost.average());
        if let Some(best) = self.best_cost {
            tracing::info!("Best Cost: {:.4}", best);
        }
        tracing::info!("Avg Log-Likelihood: {:.4}", self.log_likelihood.average());
        tracing::info!("Avg Steps: {:.1}", self.steps.average());
    }
}

impl Default for RolloutMetrics {
    fn default() -> Self {
        Self::new(100)
    }
}
