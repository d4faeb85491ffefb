//! Operator console: messages, line prompts and the re-ask loop.
//!
//! The pipeline never touches stdin/stdout itself. It talks to a [`Console`],
//! which is either the real terminal or a [`ScriptedConsole`] fed with
//! canned answers.

use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal};

use console::Term;
use tracing::debug;

use crate::error::{ConfigurationError, ValidationError};

/// Line-oriented operator I/O.
pub trait Console {
    /// Shows one line of output to the operator.
    fn say(&mut self, line: &str);

    /// Shows `prompt` and reads one line of input.
    ///
    /// Returns `Ok(None)` when input is exhausted. The trailing newline is
    /// stripped.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the console cannot be read.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Like [`Console::read_line`], without echoing the answer where possible.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the console cannot be read.
    fn read_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.read_line(prompt)
    }
}

/// Console bound to the process terminal (stdin for input).
#[derive(Debug)]
pub struct TerminalConsole {
    term: Term,
}

impl TerminalConsole {
    /// Creates a console writing to stdout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Creates a console writing to stderr, for prompts that must not mix
    /// with regular output.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TerminalConsole {
    fn say(&mut self, line: &str) {
        if let Err(error) = self.term.write_line(line) {
            debug!(error = %error, "console write failed");
        }
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.term.write_str(prompt)?;
        self.term.flush()?;
        read_stdin_line()
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if !io::stdin().is_terminal() {
            return self.read_line(prompt);
        }
        self.term.write_str(prompt)?;
        self.term.flush()?;
        self.term.read_secure_line().map(Some)
    }
}

/// Reads one line from stdin, `None` on end of input.
fn read_stdin_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Console that answers prompts from a fixed script and records everything.
///
/// Used for non-interactive runs and in tests.
#[derive(Debug, Default, Clone)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedConsole {
    /// Creates a console that will answer prompts with `answers`, in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// Every line shown so far, prompts included (prompt followed by answer).
    #[must_use]
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Returns true when any transcript line contains `needle`.
    #[must_use]
    pub fn saw(&self, needle: &str) -> bool {
        self.transcript.iter().any(|line| line.contains(needle))
    }

    /// Number of prompts still unanswered.
    #[must_use]
    pub fn remaining_answers(&self) -> usize {
        self.answers.len()
    }
}

impl Console for ScriptedConsole {
    fn say(&mut self, line: &str) {
        self.transcript.push(line.to_string());
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let answer = self.answers.pop_front();
        self.transcript
            .push(format!("{prompt}{}", answer.as_deref().unwrap_or_default()));
        Ok(answer)
    }
}

/// Asks `prompt` until `validate` accepts the answer.
///
/// Rejected answers are reported to the operator and the question is asked
/// again; a [`ValidationError`] never escapes this loop.
///
/// # Errors
///
/// Returns [`ConfigurationError::PromptClosed`] when input runs out before a
/// valid answer arrives, or [`ConfigurationError::Console`] when reading fails.
pub fn ask_until_valid<T, F>(
    console: &mut dyn Console,
    prompt: &str,
    validate: F,
) -> Result<T, ConfigurationError>
where
    F: Fn(&str) -> Result<T, ValidationError>,
{
    loop {
        let answer = console
            .read_line(prompt)
            .map_err(|source| ConfigurationError::Console { source })?
            .ok_or_else(|| ConfigurationError::prompt_closed(prompt.trim()))?;

        match validate(answer.trim()) {
            Ok(value) => return Ok(value),
            Err(error) => {
                debug!(answer = %answer, error = %error, "rejected operator input");
                console.say(&format!("  ERROR: {error}. Try again."));
            }
        }
    }
}
