//! cookie-inspector - inspect and edit the cookies of the page in the active tab
//!
//! The crate is the synchronization and normalization layer between a browser
//! cookie store and a user-editable cookie list: normalizing records, writing and
//! removing cookies, bulk delete/import with success/failure tallies, JSON
//! export/import, and pushing live cookie changes to the popup.

pub mod bulk;
pub mod cli;
pub mod codec;
pub mod config;
pub mod cookie;
pub mod error;
pub mod exit_code;
pub mod gateway;
pub mod host;
pub mod logging;
pub mod message;
pub mod notifier;
pub mod output;
pub mod session;
pub mod transfer;
pub mod utils;

pub use error::{CookieError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
