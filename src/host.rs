//! The real host: runs commands with std::process and asks libc who we are
//!
//! Commands always run to completion on the calling thread. Output is
//! captured rather than inherited so a failing command's stderr can be
//! carried into the diagnostic, and is echoed to the log at trace level.

use anyhow::{Context, Result};
use runbook::{CommandOutput, Host, command_line};
use std::process::{Command, Stdio};

/// Host implementation backed by the local machine
#[derive(Debug, Default)]
pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        Self
    }
}

impl Host for SystemHost {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        let line = command_line(cmd, args);
        log::debug!("$ {}", line);

        let output = Command::new(cmd)
            .args(args)
            // Keep apt and friends from prompting on a terminal we don't own
            .env("DEBIAN_FRONTEND", "noninteractive")
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute: {}", line))?;

        let output = CommandOutput::from(output);
        log_stream("stdout", &output.stdout);
        log_stream("stderr", &output.stderr);
        log::debug!(
            "{} -> {}",
            cmd,
            output.code.map_or_else(|| "signal".to_string(), |c| c.to_string())
        );

        Ok(output)
    }

    #[allow(unsafe_code)]
    fn effective_uid(&self) -> u32 {
        // SAFETY: geteuid has no preconditions and cannot fail
        unsafe { libc::geteuid() }
    }
}

fn log_stream(name: &str, bytes: &[u8]) {
    if bytes.is_empty() || !log::log_enabled!(log::Level::Trace) {
        return;
    }
    for line in String::from_utf8_lossy(bytes).lines() {
        log::trace!("  [{}] {}", name, line);
    }
}
