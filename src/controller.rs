//! End-to-end orchestration of one `xaw` run.
//!
//! Translate (or hit the cache), classify, optionally confirm, then print or
//! execute. Each step runs to completion before the next; the confirmation
//! prompt is the only place a run waits on the user.

use crate::clipboard::{Clipboard, SystemClipboard};
use crate::config::{EffectiveConfig, config_dir};
use crate::confirm::{Confirmation, ConfirmPrompt};
use crate::danger::DangerClassifier;
use crate::error::{XawError, exit_code};
use crate::executor::{Executor, ShellRunner, SystemShellRunner};
use crate::history::History;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::providers::EnvProvider;
use crate::response_cache::ResponseCache;
use crate::translator::{TranslatedCommand, Translator};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

pub struct Controller<C: HttpClient, R: ShellRunner> {
    config: EffectiveConfig,
    translator: Translator<C>,
    classifier: DangerClassifier,
    prompt: ConfirmPrompt,
    executor: Executor<R>,
    cache: Option<ResponseCache>,
    history: Option<History>,
    clipboard: Option<Box<dyn Clipboard>>,
}

impl Controller<ReqwestHttpClient, SystemShellRunner> {
    /// Wires the production dependencies: reqwest, the user's shell, and the
    /// history and cache files in the config directory.
    pub fn system(config: EffectiveConfig, env: &impl EnvProvider) -> Result<Self, XawError> {
        let translator = Translator::from_config(&config)?;
        let executor = Executor::system(env);
        let mut controller = Self::new(config, translator, executor)
            .with_clipboard(Box::new(SystemClipboard));

        match config_dir(env) {
            Some(dir) => {
                controller.history = Some(History::new(&dir));
                controller.cache = Some(ResponseCache::open(&dir, controller.config.cache.clone()));
            }
            None => warn!("Could not determine config directory, history and cache are disabled"),
        }
        Ok(controller)
    }
}

impl<C: HttpClient, R: ShellRunner> Controller<C, R> {
    pub fn new(config: EffectiveConfig, translator: Translator<C>, executor: Executor<R>) -> Self {
        let classifier = DangerClassifier::with_extra_patterns(&config.extra_danger_patterns);
        Self {
            config,
            translator,
            classifier,
            prompt: ConfirmPrompt::new(),
            executor,
            cache: None,
            history: None,
            clipboard: None,
        }
    }

    pub fn with_history(mut self, history: History) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    /// Runs a query against stdin/stdout/stderr and returns the exit code.
    pub async fn run(&mut self, query: &str) -> Result<i32, XawError> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        self.run_with_io(query, &mut input, &mut io::stdout(), &mut io::stderr())
            .await
    }

    /// Runs a query with injected I/O (for testing).
    ///
    /// The translated command is the only thing written to `stdout`; notices,
    /// warnings and the prompt go to `stderr`.
    pub async fn run_with_io<I: BufRead, O: Write, E: Write>(
        &mut self,
        query: &str,
        input: &mut I,
        stdout: &mut O,
        stderr: &mut E,
    ) -> Result<i32, XawError> {
        if query.trim().is_empty() {
            return Err(XawError::EmptyQuery);
        }

        let command = self.translate(query).await?;

        // Copying can block on Linux until the selection is taken, so the
        // command is printed first.
        if !self.config.execute {
            writeln!(stdout, "{}", command)?;
            stdout.flush()?;
            self.copy_if_requested(command.as_str(), stderr);
            self.record(query, command.as_str(), false, None);
            return Ok(exit_code::SUCCESS);
        }

        self.copy_if_requested(command.as_str(), stderr);
        self.execute_checked(query, command.as_str(), input, stderr)
    }

    /// Replays history entry `index` (0 = most recent).
    pub fn repeat_with_io<I: BufRead, O: Write, E: Write>(
        &mut self,
        index: usize,
        input: &mut I,
        stdout: &mut O,
        stderr: &mut E,
    ) -> Result<i32, XawError> {
        let entry = self
            .history
            .as_ref()
            .and_then(|history| history.entry(index))
            .ok_or_else(|| XawError::History(format!("No history entry found at index {}", index)))?;

        if entry.command.trim().is_empty() {
            return Err(XawError::History("History entry has no command".to_string()));
        }

        writeln!(stderr, "Repeating: {}", entry.query)?;

        if !self.config.execute {
            writeln!(stdout, "{}", entry.command)?;
            return Ok(exit_code::SUCCESS);
        }

        writeln!(stderr, "Command: {}", entry.command)?;
        let label = format!("[repeat] {}", entry.query);
        self.execute_checked(&label, &entry.command, input, stderr)
    }

    pub fn repeat(&mut self, index: usize) -> Result<i32, XawError> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        self.repeat_with_io(index, &mut input, &mut io::stdout(), &mut io::stderr())
    }

    async fn translate(&mut self, query: &str) -> Result<TranslatedCommand, XawError> {
        if self.config.use_cache {
            if let Some(cached) = self.cache.as_mut().and_then(|c| c.get(query, &self.config)) {
                return Ok(TranslatedCommand::new(cached));
            }
        }

        let command = self.translator.translate(query, &self.config).await?;

        if self.config.use_cache {
            if let Some(cache) = self.cache.as_mut() {
                if let Err(e) = cache.put(query, command.as_str(), &self.config) {
                    warn!("Failed to write cache: {}", e);
                }
            }
        }
        Ok(command)
    }

    /// Classifies, confirms when flagged, and executes.
    fn execute_checked<I: BufRead, E: Write>(
        &mut self,
        label: &str,
        command: &str,
        input: &mut I,
        stderr: &mut E,
    ) -> Result<i32, XawError> {
        let verdict = self.classifier.classify(command);

        if verdict.dangerous && !self.config.skip_confirm {
            let answer = self
                .prompt
                .confirm_with_io(command, &verdict, input, stderr)
                .unwrap_or_else(|e| {
                    warn!("Confirmation prompt failed, treating as declined: {}", e);
                    Confirmation::Declined
                });

            if answer == Confirmation::Declined {
                self.record(label, command, true, Some(exit_code::USER_CANCELLED));
                return Err(XawError::UserCancelled);
            }
        } else if verdict.dangerous {
            info!("Skipping confirmation for flagged command");
        }

        let code = self.executor.execute(command)?;
        self.record(label, command, true, Some(code));
        Ok(code)
    }

    fn copy_if_requested<E: Write>(&mut self, command: &str, stderr: &mut E) {
        if !self.config.copy {
            return;
        }
        let Some(clipboard) = self.clipboard.as_mut() else {
            return;
        };

        let message = match clipboard.copy(command) {
            Ok(()) => "✓ Command copied to clipboard".to_string(),
            Err(e) => format!("Warning: Could not copy to clipboard: {}", e),
        };
        let _ = writeln!(stderr, "{}", message);
    }

    fn record(&self, query: &str, command: &str, executed: bool, exit_code: Option<i32>) {
        if let Some(history) = &self.history {
            if let Err(e) = history.record(query, command, executed, exit_code) {
                warn!("Failed to write history: {}", e);
            }
        }
    }
}
