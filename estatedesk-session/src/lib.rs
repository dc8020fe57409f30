//! estatedesk Session - client-side authorization for the admin dashboard
//!
//! The login flow persists the authenticated user (with roles and their
//! permissions) into a key-value store. Every authorization check re-reads
//! that snapshot, so answers always track whatever is currently persisted.
//!
//! ## Architecture
//!
//! - **storage**: the persisted key-value store (file, memory)
//! - **auth**: session model, injected [`SessionContext`] and the
//!   read-only [`SessionPermissionStore`]
//! - **session**: login/logout lifecycle writing the snapshot
//!
//! Every query on [`SessionPermissionStore`] fails closed: a missing,
//! corrupt or unreachable session yields no roles and no permissions.

pub mod auth;
pub mod session;
pub mod storage;

pub use auth::{Permission, RecordId, Role, SessionContext, SessionPermissionStore, User};
pub use session::SessionManager;
pub use storage::{FileStore, KeyValueStore, MemoryStore};

pub use estatedesk_core::{EstateError, EstateResult};
