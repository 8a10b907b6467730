//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod search;
pub mod telemetry;
