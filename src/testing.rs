//! Recording fake host for step and pipeline tests

use runbook::{CommandOutput, Host, command_line};
use std::sync::Mutex;

/// Records every command line and fails the ones it was told to
pub struct FakeHost {
    euid: u32,
    calls: Mutex<Vec<String>>,
    failures: Vec<(String, i32, String)>,
    /// Commands with this prefix exit 1 silently (used for `id -u`)
    absent: Vec<String>,
}

impl FakeHost {
    /// A host where every command succeeds and we are root
    pub fn root() -> Self {
        Self {
            euid: 0,
            calls: Mutex::new(Vec::new()),
            failures: Vec::new(),
            absent: Vec::new(),
        }
    }

    /// A host where we are an ordinary user
    pub fn unprivileged(uid: u32) -> Self {
        Self {
            euid: uid,
            ..Self::root()
        }
    }

    /// Commands whose line starts with `prefix` fail with `code` and `stderr`
    pub fn failing(mut self, prefix: &str, code: i32, stderr: &str) -> Self {
        self.failures
            .push((prefix.to_string(), code, stderr.to_string()));
        self
    }

    /// Commands whose line starts with `prefix` exit 1 with no output
    pub fn missing(mut self, prefix: &str) -> Self {
        self.absent.push(prefix.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Whether any recorded command line starts with `prefix`
    pub fn ran(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }
}

impl Host for FakeHost {
    fn run(&self, cmd: &str, args: &[&str]) -> anyhow::Result<CommandOutput> {
        let line = command_line(cmd, args);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }

        if let Some((_, code, stderr)) = self.failures.iter().find(|(p, _, _)| line.starts_with(p)) {
            return Ok(CommandOutput::failed(*code, stderr));
        }
        if self.absent.iter().any(|p| line.starts_with(p)) {
            return Ok(CommandOutput::failed(1, ""));
        }
        Ok(CommandOutput::ok())
    }

    fn effective_uid(&self) -> u32 {
        self.euid
    }
}
