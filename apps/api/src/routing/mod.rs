// Model routing ("committee"): a fixed backend catalog and a static scorer
// that picks one backend per request.

pub mod backends;
pub mod committee;

pub use backends::{catalog_with_availability, ModelBackend};
pub use committee::{ModelRouter, RoutingDecision, TaskContext};
