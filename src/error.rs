//! Error taxonomy and the process exit-code table.
//!
//! Every failure the pipeline can hit surfaces as one of these types and
//! terminates the process with a distinct code. A shell command that exits
//! non-zero is not an error here; its code is passed through unchanged.

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes used by `xaw` itself.
pub mod exit_code {
    /// Printed or executed, and the executed command succeeded.
    pub const SUCCESS: i32 = 0;
    /// A history or cache subcommand failed.
    pub const FAILURE: i32 = 1;
    /// Bad command-line usage (matches clap's own usage code).
    pub const USAGE: i32 = 2;
    /// The user declined a dangerous command.
    pub const USER_CANCELLED: i32 = 10;
    /// The translation service could not produce a command (EX_UNAVAILABLE).
    pub const TRANSLATION: i32 = 69;
    /// The configuration could not be resolved (EX_CONFIG).
    pub const CONFIG: i32 = 78;
    /// The shell itself could not be launched.
    pub const LAUNCH: i32 = 126;
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request timeout must be greater than zero seconds")]
    InvalidTimeout,
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("could not connect to API: {0}")]
    Network(String),

    #[error("API request timed out after {0} seconds")]
    Timeout(u64),

    #[error("API returned error {status}{}", body.as_deref().map(|b| format!(": {b}")).unwrap_or_default())]
    Http { status: u16, body: Option<String> },

    #[error("API returned empty response")]
    EmptyResponse,
}

impl TranslateError {
    /// A hint to show under the error message, if there is a useful one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Network(_) => Some("Check your internet connection and API URL."),
            Self::Timeout(_) => Some("The service may be unreachable. Please try again."),
            Self::Http { .. } => None,
            Self::EmptyResponse => Some("The service had no translation for this query."),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("could not launch shell '{shell}': {source}")]
    Launch {
        shell: String,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error for one `xaw` invocation.
#[derive(Debug, Error)]
pub enum XawError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("cancelled by user")]
    UserCancelled,

    #[error("query cannot be empty")]
    EmptyQuery,

    #[error("{0}")]
    History(String),

    #[error("could not write output: {0}")]
    Io(#[from] std::io::Error),
}

impl XawError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => exit_code::CONFIG,
            Self::Translate(_) => exit_code::TRANSLATION,
            Self::Execution(_) => exit_code::LAUNCH,
            Self::UserCancelled => exit_code::USER_CANCELLED,
            Self::EmptyQuery => exit_code::USAGE,
            Self::History(_) | Self::Io(_) => exit_code::FAILURE,
        }
    }
}
