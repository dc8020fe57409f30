//! Session lifecycle
//!
//! Writes the user snapshot after login and removes it at logout.

pub mod manager;

pub use manager::SessionManager;
