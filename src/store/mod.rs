//! SQLite-backed persistence for users and their daily logs.

pub mod identity;
pub mod repository;

pub use identity::{require_user, resolve_user};
pub use repository::{LogEntry, Repo, Store, User};
