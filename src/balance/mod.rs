//! Load-balancing simulator: scenarios, greedy transfers, outcome metrics.

mod engine;
mod scenario;
mod types;

pub use engine::LoadBalancer;
pub use scenario::Scenario;
pub use types::{BalancingAction, BalancingMetrics, BalancingResult, RegionStatus};
