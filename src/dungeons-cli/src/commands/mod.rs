//! Command handlers for dungeons CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod items;
pub mod save;
