//! # nbr-cli: Command-Line Calculator
//!
//! The `nbr` binary loads a saved project, sizes it with the embedded (or a
//! configured) set of reference tables and prints the result.
//!
//! - [`cli`] - Argument definitions
//! - [`config`] - `~/.nbr5410/config.toml` handling
//! - [`sample`] - Sample project written by `nbr new`

pub mod cli;
pub mod config;
pub mod sample;

pub use cli::{Cli, Commands, OutputFormat, TablesCommands};
pub use config::CalculatorConfig;
