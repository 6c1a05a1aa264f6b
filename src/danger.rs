//! Heuristic detection of destructive shell commands.
//!
//! Matching is case-insensitive substring containment against an ordered
//! rule list. This flags commands for confirmation; it does not make running
//! them safe, and a command that passes may still be destructive.

use tracing::debug;

/// Built-in rules, in match order. All lowercase.
pub const DEFAULT_PATTERNS: &[&str] = &[
    // recursive / forced delete
    "rm -rf",
    "rm -fr",
    "rm -r",
    "rm -f",
    "rmrf",
    "--no-preserve-root",
    // filesystems and raw devices
    "mkfs",
    "format",
    "dd if=",
    "of=/dev/",
    "> /dev/sd",
    "> /dev/nvme",
    // fork bomb
    ":(){",
    // clobbering the root tree
    "chmod -r 777 /",
    "chown -r",
    "mv / ",
    "> /etc/",
    // power state
    "shutdown",
    "reboot",
    "halt",
    "poweroff",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DangerVerdict {
    pub dangerous: bool,
    /// The first rule that matched, if any.
    pub matched_pattern: Option<String>,
}

impl DangerVerdict {
    fn safe() -> Self {
        Self {
            dangerous: false,
            matched_pattern: None,
        }
    }
}

/// Ordered set of danger patterns.
///
/// # Example
///
/// ```
/// use clixaw::danger::DangerClassifier;
///
/// let classifier = DangerClassifier::default();
/// assert!(classifier.classify("sudo RM -RF /tmp/build").dangerous);
/// assert!(!classifier.classify("ls -la").dangerous);
/// ```
#[derive(Debug, Clone)]
pub struct DangerClassifier {
    patterns: Vec<String>,
}

impl Default for DangerClassifier {
    fn default() -> Self {
        Self::with_patterns(DEFAULT_PATTERNS.iter().copied())
    }
}

impl DangerClassifier {
    /// A classifier using exactly the given patterns, in order.
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().to_lowercase())
            .filter(|p| !p.trim().is_empty())
            .collect();
        Self { patterns }
    }

    /// The built-in rules followed by `extra`.
    pub fn with_extra_patterns<S: AsRef<str>>(extra: &[S]) -> Self {
        Self::with_patterns(
            DEFAULT_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .chain(extra.iter().map(|p| p.as_ref().to_string())),
        )
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Inspects `command` statically. Never executes or expands anything.
    pub fn classify(&self, command: &str) -> DangerVerdict {
        let lowered = command.to_lowercase();

        match self.patterns.iter().find(|p| lowered.contains(p.as_str())) {
            Some(pattern) => {
                debug!("Command matched danger pattern '{}'", pattern);
                DangerVerdict {
                    dangerous: true,
                    matched_pattern: Some(pattern.clone()),
                }
            }
            None => DangerVerdict::safe(),
        }
    }
}
