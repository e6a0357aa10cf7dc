mod depot;
mod instance;
mod routing_state;

pub use depot::DepotOwnership;
pub use instance::{Instance, InstanceData, load_instances};
pub use routing_state::RoutingState;
