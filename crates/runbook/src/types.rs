//! Core types for step execution

use std::process::Output;

/// Identity a step's commands run under
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Privilege {
    /// The administrative identity the run was started with
    Root,
    /// Dropped to an unprivileged account for the duration of the step
    Account { name: String },
}

impl Default for Privilege {
    fn default() -> Self {
        Self::Root
    }
}

/// Result of applying a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// Host already satisfied the step
    NoChange,
    /// Something was created
    Created,
    /// Something existing was overwritten or reconfigured
    Modified,
}

impl ApplyResult {
    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }

    /// Combine two results from sub-operations of the same step
    ///
    /// `Created` wins over `Modified`, which wins over `NoChange`.
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Created, _) | (_, Self::Created) => Self::Created,
            (Self::Modified, _) | (_, Self::Modified) => Self::Modified,
            _ => Self::NoChange,
        }
    }
}

/// Transient record of how far a run got
///
/// Never persisted. Only used to decide whether to continue or abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    /// Number of steps that completed successfully
    pub completed: usize,
    /// Number of steps in the run
    pub total: usize,
}

impl RunState {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
        }
    }

    /// Zero-based index of the step that runs next
    pub fn next_index(&self) -> Option<usize> {
        (self.completed < self.total).then_some(self.completed)
    }

    /// Record that the next step finished
    pub fn advance(&mut self) {
        if self.completed < self.total {
            self.completed += 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub created: usize,
    pub modified: usize,
    pub no_change: usize,
}

impl RunSummary {
    /// Total number of steps that changed the host
    pub fn total_changes(&self) -> usize {
        self.created + self.modified
    }

    /// Total number of steps processed
    pub fn total(&self) -> usize {
        self.created + self.modified + self.no_change
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
        }
    }
}

/// Output from a host command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

impl CommandOutput {
    /// A successful run with no output
    pub fn ok() -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            success: true,
            code: Some(0),
        }
    }

    /// A failed run with the given exit code and stderr
    pub fn failed(code: i32, stderr: &str) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
            success: false,
            code: Some(code),
        }
    }

    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}
