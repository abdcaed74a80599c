//! Parsewright CLI library.
//!
//! Wires configuration, the generative service, the sandbox and the stores
//! into the commands of the `parsewright` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod provider;

pub use cli::{Cli, CliFormat, Command};
pub use config::{Config, ConfigError};
pub use error::{CliError, Result};
pub use output::Formatter;
pub use provider::Provider;
