//! CLI module
//!
//! Command-line interface of the tap.
//!
//! # Commands
//!
//! - `check` - Test connection to the API
//! - `discover` - Print the Singer catalog
//! - `read` - Extract data from streams as Singer messages on stdout
//! - `streams` - List stream names (lightweight)

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
