//! CLI command implementations
//!
//! Thin adapters over the library:
//! - index: Index a codebase
//! - status: Show index statistics
//! - search / recent / deps: Query the index
//! - export / import: Sync the index through JSON lines
//! - repos / projects: Manage repositories and projects

mod commands;
mod db_utils;

pub use commands::*;
pub use db_utils::*;
