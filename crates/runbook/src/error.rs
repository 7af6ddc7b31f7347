//! Failure taxonomy for provisioning runs
//!
//! Every failure is fatal. A step tags each failure site with the
//! [`FailureKind`] that best describes it, and the executor wraps the first
//! one it sees into [`Error::Aborted`] together with the step's position.

use std::fmt;

/// Result type alias for runbook operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of provisioning failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Not running with the required rights.
    Privilege,
    /// Account, package, file or directory mutation failed.
    Provision,
    /// Runtime environment creation or dependency install failed.
    Build,
    /// Proxy configuration failed syntactic validation.
    ConfigValidation,
    /// Service enable/start/restart failed.
    Activation,
}

impl FailureKind {
    /// Get a user-friendly description of this failure kind.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Privilege => "privilege error",
            Self::Provision => "provision error",
            Self::Build => "build error",
            Self::ConfigValidation => "configuration validation error",
            Self::Activation => "activation error",
        }
    }

    /// Get actionable advice for resolving this failure kind.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Privilege => "Re-run as root (e.g. with sudo)",
            Self::Provision => "Fix the host condition reported above and re-run",
            Self::Build => "Check network access to the package index and the dependency manifest",
            Self::ConfigValidation => {
                "Fix the proxy site definition; the running proxy was left untouched"
            }
            Self::Activation => "Inspect the unit with `systemctl status` and `journalctl -u`",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A failure raised inside a single step.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {source:#}")]
pub struct StepError {
    /// Category of the failure.
    pub kind: FailureKind,
    /// Underlying cause.
    #[source]
    pub source: anyhow::Error,
}

impl StepError {
    pub fn new(kind: FailureKind, source: impl Into<anyhow::Error>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    /// Build a failure from a plain message.
    pub fn msg(kind: FailureKind, message: impl fmt::Display) -> Self {
        Self {
            kind,
            source: anyhow::anyhow!("{message}"),
        }
    }
}

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A step failed; nothing after it ran.
    #[error("step {number}/{total} '{step}' failed: {source}", number = .index + 1)]
    Aborted {
        /// Zero-based index of the failing step.
        index: usize,
        /// Number of steps in the run.
        total: usize,
        /// Identifier of the failing step.
        step: String,
        /// The step's failure.
        #[source]
        source: StepError,
    },
}

impl Error {
    /// Category of the failure that ended the run.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Aborted { source, .. } => source.kind,
        }
    }

    /// Zero-based index of the step that failed.
    #[must_use]
    pub fn step_index(&self) -> usize {
        match self {
            Self::Aborted { index, .. } => *index,
        }
    }
}

/// Tag an `anyhow::Result` with the [`FailureKind`] of its failure site.
pub trait FailAs<T> {
    /// Convert the error side into a [`StepError`] of the given kind.
    fn fail_as(self, kind: FailureKind) -> std::result::Result<T, StepError>;
}

impl<T> FailAs<T> for anyhow::Result<T> {
    fn fail_as(self, kind: FailureKind) -> std::result::Result<T, StepError> {
        self.map_err(|source| StepError { kind, source })
    }
}
