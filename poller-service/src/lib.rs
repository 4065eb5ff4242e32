pub mod config;
pub mod coordinator;
pub mod metrics_server;
pub mod normalize;
pub mod observability;
pub mod reconcile;
pub mod store;

pub use coordinator::{Coordinator, CycleError, CycleOutcome};
pub use reconcile::{merge, MergePlan, SeriesTails};
