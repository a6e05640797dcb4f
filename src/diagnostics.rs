// ABOUTME: Diagnostics accumulator for non-fatal warnings during a run.
// ABOUTME: Collects warnings that shouldn't fail a run but should be shown to the operator.

/// Collects non-fatal warnings during orchestration.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during a run.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Management endpoint did not answer a ping.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Unreachable,
            message: message.into(),
        }
    }

    /// Validation finished with a status other than SUCCESS.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Degraded,
            message: message.into(),
        }
    }

    /// Validation report missing or unreadable.
    pub fn report(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Report,
            message: message.into(),
        }
    }

    /// Best-effort post-deployment configuration failed.
    pub fn post_config(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::PostConfig,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    Unreachable,
    Degraded,
    Report,
    PostConfig,
}
