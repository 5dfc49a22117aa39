// ABOUTME: Diagnostics accumulator for non-fatal warnings while building a plan file.
// ABOUTME: Collects warnings that shouldn't fail the plan but should be shown to users.

/// Collects non-fatal warnings during plan file processing.
#[derive(Debug, Default)]
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

/// A non-fatal warning collected while building a plan.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A group is listed more than once in one concurrent set.
    pub fn duplicate_group(group: &str, concurrent_set: usize) -> Self {
        Self {
            kind: WarningKind::DuplicateGroup,
            message: format!(
                "server group `{group}` is listed more than once in concurrent set {concurrent_set}; \
                 the last entry wins and moves to the end of the set"
            ),
        }
    }

    /// Both failure limits were given for one group.
    pub fn both_failure_limits(group: &str) -> Self {
        Self {
            kind: WarningKind::BothFailureLimits,
            message: format!(
                "server group `{group}` sets both max_failures and max_failure_percentage; \
                 the percentage takes precedence"
            ),
        }
    }
}

/// Categories of warnings that can occur while building a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A server group appears twice in one concurrent set.
    DuplicateGroup,
    /// Both `max_failures` and `max_failure_percentage` are set.
    BothFailureLimits,
}
