//! Command routing for the accountability coach.

pub mod command;
pub mod handlers;

pub use command::Command;
pub use handlers::dispatch;
