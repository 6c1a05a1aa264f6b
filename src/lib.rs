//! clixaw - natural language to shell commands.
//!
//! A query typed on the command line is sent to a translation API, which
//! answers with a single shell command. The command is printed, or with
//! `--execute` handed to the user's shell. Commands that look destructive
//! need an explicit "yes" first, unless `--no-confirm` is given.
//!
//! # Architecture
//!
//! One run is a straight pipeline:
//!
//! - [`config`] - Merges flags, environment, config file and defaults
//! - [`translator`] - Sends the query and returns the command
//! - [`danger`] - Flags commands matching destructive patterns
//! - [`confirm`] - Yes/no prompt for flagged commands
//! - [`executor`] - Runs the command through the shell
//! - [`controller`] - Drives the steps above and picks the exit code
//!
//! Supporting modules:
//!
//! - [`http_client`] - HTTP transport abstraction
//! - [`response_cache`] - Cache of earlier translations on disk
//! - [`history`] - Log of translations and executions, with replay
//! - [`clipboard`] - `--copy` support
//! - [`providers`] - Clock and environment traits for dependency injection
//! - [`error`] - Error types and exit codes
//! - [`cli`] - Command-line definition
//!
//! # Example
//!
//! ```ignore
//! use clixaw::config::{CliOverrides, EffectiveConfig};
//! use clixaw::controller::Controller;
//! use clixaw::providers::ProcessEnv;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), clixaw::error::XawError> {
//!     let config = EffectiveConfig::load(&CliOverrides::default(), &ProcessEnv)?;
//!     let mut controller = Controller::system(config, &ProcessEnv)?;
//!
//!     // Prints the translated command
//!     controller.run("show me big files").await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod clipboard;
pub mod config;
pub mod confirm;
pub mod controller;
pub mod danger;
pub mod error;
pub mod executor;
pub mod history;
pub mod http_client;
pub mod providers;
pub mod response_cache;
pub mod translator;
