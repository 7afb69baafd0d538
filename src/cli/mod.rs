//! The `docchat` command line: argument definitions, one handler per
//! subcommand, and terminal output helpers.

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::Cli;
pub use commands::Commands;
