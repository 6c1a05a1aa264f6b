//! Runs a translated command through the user's shell.
//!
//! The whole command string goes to the shell as one invocation, so pipes,
//! globs and substitutions behave as they would when typed. The child's exit
//! code is returned unchanged; only a failure to start the shell is an error.

use crate::error::ExecutionError;
use crate::providers::EnvProvider;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use tracing::{debug, info};

/// Exit code reported for a child that ended without one.
const UNKNOWN_EXIT: i32 = 1;

/// The shell program and the flag that makes it read a command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    pub program: PathBuf,
    pub command_flag: &'static str,
}

impl Shell {
    /// `$SHELL` when it resolves on this system, otherwise `sh`.
    #[cfg(unix)]
    pub fn detect(env: &impl EnvProvider) -> Self {
        let program = env
            .var("SHELL")
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| which::which(s.trim()).ok())
            .unwrap_or_else(|| PathBuf::from("sh"));
        Self {
            program,
            command_flag: "-c",
        }
    }

    #[cfg(windows)]
    pub fn detect(env: &impl EnvProvider) -> Self {
        let program = env
            .var("ComSpec")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("cmd"));
        Self {
            program,
            command_flag: "/C",
        }
    }
}

// =============================================================================
// Traits for Dependency Injection
// =============================================================================

/// Trait for handing a command string to a shell.
///
/// This abstraction enables testing without spawning real processes.
pub trait ShellRunner: Send + Sync {
    /// Runs `command` with inherited stdio and waits for it to finish.
    fn run(&self, shell: &Shell, command: &str) -> io::Result<ExitStatus>;
}

/// Default runner using `std::process::Command`.
pub struct SystemShellRunner;

impl ShellRunner for SystemShellRunner {
    fn run(&self, shell: &Shell, command: &str) -> io::Result<ExitStatus> {
        Command::new(&shell.program)
            .arg(shell.command_flag)
            .arg(command)
            .status()
    }
}

// =============================================================================
// Executor Implementation
// =============================================================================

/// Executes translated commands.
///
/// # Example
///
/// ```ignore
/// let executor = Executor::new(Shell::detect(&ProcessEnv), SystemShellRunner);
/// let code = executor.execute("ls -la | head")?;
/// ```
pub struct Executor<R: ShellRunner> {
    shell: Shell,
    runner: R,
}

impl Executor<SystemShellRunner> {
    pub fn system(env: &impl EnvProvider) -> Self {
        Self::new(Shell::detect(env), SystemShellRunner)
    }
}

impl<R: ShellRunner> Executor<R> {
    pub fn new(shell: Shell, runner: R) -> Self {
        Self { shell, runner }
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Runs `command` and returns the exit code it finished with.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Launch`] if the shell could not be started.
    /// A command that starts and exits non-zero is not an error.
    pub fn execute(&self, command: &str) -> Result<i32, ExecutionError> {
        info!("Executing via {}: {}", self.shell.program.display(), command);

        let status = self
            .runner
            .run(&self.shell, command)
            .map_err(|source| ExecutionError::Launch {
                shell: self.shell.program.display().to_string(),
                source,
            })?;

        let code = exit_code_of(status);
        debug!("Command finished with exit code {}", code);
        Ok(code)
    }
}

/// Maps a child status to a process exit code, using the shell convention
/// `128 + signal` for children killed by a signal.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    UNKNOWN_EXIT
}
