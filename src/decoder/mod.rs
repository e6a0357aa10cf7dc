//! Decoder-side routing environment for attention-based MDVRP policies
//!
//! The environment tracks where every car is, what it can still carry and which
//! customers are served, and tells the policy which (car, node) actions are legal.
//! All instances and cars advance in lockstep as whole-batch tensor operations.
//!
//! # Architecture
//!
//! ```text
//! Instance + node embeddings
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  RoutingEnv::new()                                          │
//! │  - distance table, depot ownership, initial RoutingState    │
//! └─────────────────────────────────────────────────────────────┘
//!     │  reset() -> first-step mask + context
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Policy (external) -> logits [batch, n_car * n_node]        │
//! │  mask_logits + log_softmax -> ActionSelector -> (node, car) │
//! └─────────────────────────────────────────────────────────────┘
//!     │  step(node, car)
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  advance -> accumulate_distance -> update_mask -> context   │
//! └─────────────────────────────────────────────────────────────┘
//!     │  finish()
//!     ▼
//!  cost [batch] + TrajectoryScorer log-likelihood [batch]
//! ```

pub mod action;
pub mod context;
pub mod env;
pub mod mask;
pub mod metrics;
pub mod policy;
pub mod rollout;
pub mod scorer;
pub mod selector;

pub use action::{JointAction, mask_logits};
pub use context::{first_step_context, step_context};
pub use env::{Observation, RoutingEnv};
pub use mask::{first_step_mask, next_mask, update_mask};
pub use metrics::{MovingAverage, RolloutMetrics};
pub use policy::{NearestPolicy, Policy, UniformPolicy};
pub use rollout::{Rollout, RolloutConfig, RolloutOutput};
pub use scorer::{TrajectoryScorer, log_likelihood};
pub use selector::{ActionSelector, CategoricalSelector, DecodeType, TopKSelector};
