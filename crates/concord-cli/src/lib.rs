//! Concord CLI library.
//!
//! Command-line front end for the reconciliation engine: load a product
//! (or a batch), run it through two configured inference providers, print
//! the merged record and its verification score.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, CliFormat, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
