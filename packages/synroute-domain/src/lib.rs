pub mod identity;
pub mod metrics;
pub mod plan;
pub mod route;
pub mod tree;

mod error;

pub use error::{MetricsError, PlanError};
