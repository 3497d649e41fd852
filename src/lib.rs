//! Tinycoach library root.

pub mod cli;
pub mod coach;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod telegram;
pub mod web;

pub use cli::Commands;
pub use coach::{dispatch, Command};
pub use config::{load_settings, Settings};
pub use error::{Error, Result};
pub use store::{LogEntry, Store, User};
pub use telegram::run_polling_daemon;
pub use web::run_server;
