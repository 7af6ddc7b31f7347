//! Apply context and provider traits
//!
//! These traits keep the runbook crate free of any particular process
//! spawning, privilege-dropping or progress-display implementation.

use crate::types::{ApplyResult, CommandOutput, Privilege};
use anyhow::{Result, bail};

/// The host being provisioned
///
/// Implementations run external commands to completion and report the
/// identity of the current process. Tests substitute a recording fake.
pub trait Host: Send + Sync {
    /// Run a command to completion, blocking until it exits
    fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Effective user id of the running process
    fn effective_uid(&self) -> u32;

    /// Run a command as another (unprivileged) account
    fn run_as(&self, account: &str, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        let mut full: Vec<&str> = vec!["-u", account, "--", cmd];
        full.extend_from_slice(args);
        self.run("runuser", &full)
    }

    /// Run a command and return just success/failure
    fn run_status(&self, cmd: &str, args: &[&str]) -> Result<bool> {
        Ok(self.run(cmd, args)?.success)
    }
}

/// Progress callback for a run
pub trait ProgressCallback: Send {
    /// Called once before the first step
    fn on_run_start(&mut self, total: usize);

    /// Called when a step starts
    fn on_step_start(&mut self, index: usize, total: usize, id: &str, description: &str);

    /// Called when a step succeeds
    fn on_step_complete(&mut self, index: usize, id: &str, result: &ApplyResult);

    /// Called when a step fails; no further callbacks follow
    fn on_step_failed(&mut self, index: usize, id: &str, error: &str);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_run_start(&mut self, _total: usize) {}
    fn on_step_start(&mut self, _index: usize, _total: usize, _id: &str, _description: &str) {}
    fn on_step_complete(&mut self, _index: usize, _id: &str, _result: &ApplyResult) {}
    fn on_step_failed(&mut self, _index: usize, _id: &str, _error: &str) {}
}

/// Context passed to step apply operations
pub struct ApplyContext<'a> {
    /// Host the step mutates
    pub host: &'a dyn Host,
    /// Identity the step's commands run under
    pub privilege: Privilege,
}

impl<'a> ApplyContext<'a> {
    /// Create a new apply context running as root
    pub fn new(host: &'a dyn Host) -> Self {
        Self {
            host,
            privilege: Privilege::Root,
        }
    }

    /// Same context, dropped to the given identity
    pub fn with_privilege(mut self, privilege: Privilege) -> Self {
        self.privilege = privilege;
        self
    }

    /// Same host, back at the administrative identity
    ///
    /// For the odd command a dropped step cannot run as its account.
    pub fn as_root(&self) -> ApplyContext<'a> {
        ApplyContext {
            host: self.host,
            privilege: Privilege::Root,
        }
    }

    /// Run a command under this context's identity
    pub fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        match &self.privilege {
            Privilege::Root => self.host.run(cmd, args),
            Privilege::Account { name } => self.host.run_as(name, cmd, args),
        }
    }

    /// Run a command and fail unless it exits successfully
    ///
    /// The error names the command line and carries its stderr.
    pub fn run_checked(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = self.run(cmd, args)?;
        if !output.success {
            let status = output
                .code
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            let stderr = output.stderr_str();
            let stderr = stderr.trim();
            if stderr.is_empty() {
                bail!("`{}` exited with status {}", command_line(cmd, args), status);
            }
            bail!(
                "`{}` exited with status {}: {}",
                command_line(cmd, args),
                status,
                stderr
            );
        }
        Ok(output)
    }
}

/// Render a command and its arguments for diagnostics
pub fn command_line(cmd: &str, args: &[&str]) -> String {
    if args.is_empty() {
        cmd.to_string()
    } else {
        format!("{} {}", cmd, args.join(" "))
    }
}
