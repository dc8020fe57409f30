//! estatedesk Core - shared infrastructure
//!
//! Error types, configuration and logging used by every estatedesk crate

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
pub use logging::*;

// Re-export commonly used external types
pub use tracing;
