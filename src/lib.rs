pub mod decoder;
pub mod infra;
pub mod state;

// Re-export commonly used types for convenience
pub use decoder::{
    DecodeType, Observation, Policy, Rollout, RolloutConfig, RolloutOutput, RoutingEnv,
};
pub use infra::EnvError;
pub use state::{Instance, InstanceData, RoutingState};
