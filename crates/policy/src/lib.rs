//! `artmarket-policy` — role-based access-control policy for the
//! marketplace (pure evaluation, no HTTP, no storage).
//!
//! The [`PolicyConfig`] table is the single source of policy truth; the
//! [`PermissionEngine`] answers memoized queries for a current role, and
//! [`Predicate`] trees compose atomic checks for guards.

pub mod config;
pub mod engine;
pub mod permission;
pub mod predicate;
pub mod role;

pub use config::{PageRule, PolicyConfig, RoleConfig, RoleTheme};
pub use engine::PermissionEngine;
pub use permission::Permission;
pub use predicate::Predicate;
pub use role::{Role, RoleParseError};
