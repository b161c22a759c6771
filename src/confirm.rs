//! Interactive yes/no prompts.
//!
//! One line is read per question. Only a token from the configured
//! affirmative set counts as yes; anything else, including an empty line or
//! end of input, is no. There is no re-prompt.

use std::io::{BufRead, Write};

use crate::error::{Result, SetupError};

/// Accepted affirmative answers, compared case-insensitively after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffirmativeSet(Vec<String>);

impl AffirmativeSet {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    pub fn accepts(&self, answer: &str) -> bool {
        let answer = answer.trim().to_lowercase();
        !answer.is_empty() && self.0.iter().any(|t| *t == answer)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First token, used in prompt hints like `(s/n)`
    pub fn primary(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("y")
    }
}

impl Default for AffirmativeSet {
    fn default() -> Self {
        Self::new(["s"])
    }
}

/// Asks yes/no questions.
pub trait Prompter {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Prompts on a writer and reads answers from a line reader.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
    accepted: AffirmativeSet,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W, accepted: AffirmativeSet) -> Self {
        Self {
            input,
            output,
            accepted,
        }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        log::info!("{}", question);
        write!(self.output, "{} ({}/n): ", question, self.accepted.primary())
            .and_then(|_| self.output.flush())
            .map_err(|e| SetupError::prompt(format!("cannot write prompt: {}", e)))?;

        // raw bytes: an answer in a non-UTF-8 locale is still just "not yes"
        let mut line = Vec::new();
        let read = self
            .input
            .read_until(b'\n', &mut line)
            .map_err(|e| SetupError::prompt(format!("cannot read answer: {}", e)))?;
        if read == 0 {
            log::debug!("End of input at prompt, treating as no");
            return Ok(false);
        }
        Ok(self.accepted.accepts(&String::from_utf8_lossy(&line)))
    }
}

/// Answers every question with a fixed value (`--yes`, non-interactive tests).
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Prompter for FixedAnswer {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        log::info!("{} -> {}", question, if self.0 { "yes" } else { "no" });
        Ok(self.0)
    }
}

/// The two questions asked before any mutating step.
pub const CONFIRM_RUN: &str = "Are you sure you want to run this installer?";
pub const CONFIRM_PROTECTED: &str =
    "This installer is protected and may not be copied or modified. Continue?";

/// Outcome of the confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accepted,
    Cancelled,
}

/// Run both confirmation prompts in order; the first refusal cancels.
pub fn confirmation_gate(prompter: &mut dyn Prompter) -> Result<Confirmation> {
    for question in [CONFIRM_RUN, CONFIRM_PROTECTED] {
        if !prompter.confirm(question)? {
            log::info!("Operation cancelled");
            return Ok(Confirmation::Cancelled);
        }
    }
    Ok(Confirmation::Accepted)
}
