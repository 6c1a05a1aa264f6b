//! User interface for confirming dangerous commands.
//!
//! The prompt is the only point where a run blocks on the user. It has no
//! timeout.

use crate::danger::DangerVerdict;
use anyhow::Result;
use std::io::{self, BufRead, Write};
use tracing::info;

/// The user's answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Proceed,
    Declined,
}

/// Asks the user whether a flagged command should run.
///
/// Only `y` or `yes` (any case) proceeds. Anything else, including an empty
/// line or end of input, declines.
///
/// # Example
///
/// ```no_run
/// use clixaw::confirm::ConfirmPrompt;
/// use clixaw::danger::DangerClassifier;
///
/// let verdict = DangerClassifier::default().classify("rm -rf build");
/// let answer = ConfirmPrompt::new().confirm("rm -rf build", &verdict)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct ConfirmPrompt;

impl ConfirmPrompt {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    // Core methods with I/O injection (testable)
    // =========================================================================

    /// Shows the warning and reads one answer from `input`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the prompt or reading the answer fails.
    pub fn confirm_with_io<R: BufRead, W: Write>(
        &self,
        command: &str,
        verdict: &DangerVerdict,
        input: &mut R,
        output: &mut W,
    ) -> Result<Confirmation> {
        writeln!(output, "⚠️  Warning: This command may be dangerous!")?;
        writeln!(output, "Command: {}", command)?;
        if let Some(pattern) = &verdict.matched_pattern {
            writeln!(output, "Matched: {}", pattern)?;
        }
        write!(output, "Do you want to proceed? [y/N]: ")?;
        output.flush()?;

        let mut line = String::new();
        let read = input.read_line(&mut line)?;
        if read == 0 {
            writeln!(output)?;
        }

        let answer = match line.trim().to_lowercase().as_str() {
            "y" | "yes" => Confirmation::Proceed,
            _ => Confirmation::Declined,
        };
        info!("User answered {:?} for flagged command", answer);

        if answer == Confirmation::Declined {
            writeln!(output, "Aborted.")?;
        }
        Ok(answer)
    }

    /// Asks a plain yes/no question, used by the destructive maintenance
    /// subcommands.
    pub fn ask_with_io<R: BufRead, W: Write>(
        &self,
        question: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<Confirmation> {
        write!(output, "{} [y/N]: ", question)?;
        output.flush()?;

        let mut line = String::new();
        input.read_line(&mut line)?;
        Ok(match line.trim().to_lowercase().as_str() {
            "y" | "yes" => Confirmation::Proceed,
            _ => Confirmation::Declined,
        })
    }

    // =========================================================================
    // Convenience methods using standard I/O
    // =========================================================================

    /// Prompts on stderr and reads from stdin, so stdout stays clean.
    pub fn confirm(&self, command: &str, verdict: &DangerVerdict) -> Result<Confirmation> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stderr();
        self.confirm_with_io(command, verdict, &mut input, &mut output)
    }

    pub fn ask(&self, question: &str) -> Result<Confirmation> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stderr();
        self.ask_with_io(question, &mut input, &mut output)
    }
}
