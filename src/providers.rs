//! Shared provider traits for dependency injection.
//!
//! The resolver, history, and cache read the clock and the process
//! environment through these traits so tests can pin both.

use std::collections::HashMap;

/// Trait for providing timestamps.
///
/// # Example
///
/// ```
/// use clixaw::providers::{TimeProvider, SystemTimeProvider};
///
/// let provider = SystemTimeProvider;
/// let timestamp = provider.now();
/// assert!(timestamp > 0);
/// ```
pub trait TimeProvider: Send + Sync {
    /// Returns the current Unix timestamp in seconds.
    fn now(&self) -> u64;
}

/// Default time provider using system time.
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Trait for reading environment variables.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use clixaw::providers::EnvProvider;
///
/// let mut env = HashMap::new();
/// env.insert("XAW_MODEL".to_string(), "gpt-4".to_string());
/// assert_eq!(env.var("XAW_MODEL").as_deref(), Some("gpt-4"));
/// assert_eq!(env.var("XAW_PROVIDER"), None);
/// ```
pub trait EnvProvider {
    /// Returns the value of `key`, or `None` if it is unset or not unicode.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
pub struct ProcessEnv;

impl EnvProvider for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvProvider for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}
