//! Dialect-aware database capability service.
//!
//! Named capabilities (statistics, indexes, constraints, sample data, …) are
//! turned into dialect-specific SQL, executed against registered
//! connections and returned as one text report.

pub mod aggregator;
pub mod builder;
pub mod capability;
pub mod dialect;
pub mod dispatcher;
pub mod executor;
pub mod handlers;
pub mod pool_manager;
pub mod registry;
pub mod render;
pub mod routes;
pub mod state;

pub use capability::{Capability, CapabilityRequest};
pub use dialect::Dialect;
pub use dispatcher::CapabilityDispatcher;
pub use executor::Executor;
pub use state::AppState;
