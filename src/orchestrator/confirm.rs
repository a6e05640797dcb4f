// ABOUTME: Interactive confirmation seam.
// ABOUTME: Reads one line from stdin in production; tests script the answers.

use async_trait::async_trait;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::Result;

/// Literal the operator must type to confirm cleanup.
pub const CLEANUP_CONFIRMATION: &str = "DELETE";

/// Asks the operator a question and returns their answer.
#[async_trait]
pub trait Confirm: Send + Sync {
    /// One line of input without its line terminator. `None` at end of input.
    async fn ask(&self, prompt: &str) -> Result<Option<String>>;
}

/// Prompts on stdout and reads from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn ask(&self, prompt: &str) -> Result<Option<String>> {
        print!("{prompt} ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_ending(&line).to_string()))
    }
}

/// Only the line terminator is removed; surrounding spaces are part of the answer.
pub fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Exact match against the cleanup literal.
pub fn confirms_cleanup(answer: Option<&str>) -> bool {
    answer == Some(CLEANUP_CONFIRMATION)
}

/// `y`/`yes` in any case.
pub fn confirms_yes(answer: Option<&str>) -> bool {
    matches!(answer.map(str::to_ascii_lowercase).as_deref(), Some("y" | "yes"))
}
