//! Stock middleware for controller routes.

pub mod logging;

pub use logging::{RequestId, logging};
