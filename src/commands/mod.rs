//! CLI command handling
//!
//! Argument parsing and the handlers behind each subcommand.

pub mod parser;
pub mod pidfile;
pub mod run;

pub use parser::*;
