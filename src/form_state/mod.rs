//! FormState Module
//!
//! Holds the six registration fields entered by the faculty operator.
//!
//! - `types`: field names, field set with phase-1 validation, validation errors
//! - `store`: `FormStateStore` with setters, snapshots and the partial
//!   reset applied between students

pub mod store;
pub mod types;

pub use store::FormStateStore;
pub use types::*;
