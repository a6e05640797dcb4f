// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Colored status lines, section headers, and a spinner while external tools run.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::{Duration, Instant};

/// Handles operator-facing output. Every line is mirrored to the log via tracing.
pub struct Output {
    interactive: bool,
    start_time: Option<Instant>,
}

impl Output {
    /// Spinners are shown only on a terminal and never in verbose mode, where
    /// child output streams to the same terminal.
    pub fn new(verbose: bool) -> Self {
        Self {
            interactive: !verbose && std::io::stderr().is_terminal(),
            start_time: None,
        }
    }

    /// Output that never draws a spinner.
    pub fn plain() -> Self {
        Self {
            interactive: false,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Section banner.
    pub fn header(&self, title: &str) {
        tracing::info!("=== {title} ===");
        println!();
        println!("{}", format!("=== {title} ===").bold().cyan());
    }

    pub fn progress(&self, message: &str) {
        tracing::info!("{message}");
        println!("{} {message}", "→".blue());
    }

    pub fn success(&self, message: &str) {
        tracing::info!("{message}");
        println!("{} {message}", "✓".green());
    }

    /// Final success line, with timing when a timer is running.
    pub fn done(&self, message: &str) {
        let elapsed = self.elapsed_secs();
        tracing::info!("{message} ({elapsed:.1}s)");
        if elapsed > 0.0 {
            println!("{} {message} ({:.1}s)", "✓".green().bold(), elapsed);
        } else {
            println!("{} {message}", "✓".green().bold());
        }
    }

    /// Warnings are already logged by [`crate::diagnostics::Diagnostics`].
    pub fn warning(&self, message: &str) {
        eprintln!("{} {message}", "⚠".yellow());
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{message}");
        eprintln!("{} {message}", "✗ Error:".red().bold());
    }

    /// Plain text, e.g. a rendered report.
    pub fn text(&self, message: &str) {
        println!("{message}");
    }

    /// Start a liveness indicator. Call [`Spinner::finish`] when the work ends.
    pub fn spinner(&self, message: &str) -> Spinner {
        let bar = if self.interactive {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Spinner { bar }
    }
}

/// Cosmetic liveness indicator around a blocking external call.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}
