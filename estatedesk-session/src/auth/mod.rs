//! Authorization Module
//!
//! Session model, the injected session context and the permission queries
//! evaluated against it.

pub mod context;
pub mod identity;
pub mod permissions;

pub use context::SessionContext;
pub use identity::{Permission, RecordId, Role, User};
pub use permissions::SessionPermissionStore;
