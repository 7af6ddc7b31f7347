//! Package installer - apt packages the stack depends on

use anyhow::Context;
use runbook::{ApplyContext, ApplyResult, FailAs, FailureKind, Step, StepError};

/// Refreshes the package index, then installs a fixed package list.
///
/// Always runs both commands; `apt-get install` is itself idempotent, so a
/// re-run on a provisioned host reinstalls nothing and succeeds.
#[derive(Debug, Clone)]
pub struct PackageInstaller {
    pub packages: Vec<String>,
}

impl PackageInstaller {
    pub fn new(packages: Vec<String>) -> Self {
        Self { packages }
    }

    fn refresh_index(&self, ctx: &ApplyContext) -> anyhow::Result<()> {
        ctx.run_checked("apt-get", &["update"])
            .context("Failed to refresh package index")?;
        Ok(())
    }

    fn install(&self, ctx: &ApplyContext) -> anyhow::Result<()> {
        let mut args = vec!["install", "-y"];
        args.extend(self.packages.iter().map(String::as_str));
        ctx.run_checked("apt-get", &args)
            .with_context(|| format!("Failed to install {}", self.packages.join(", ")))?;
        Ok(())
    }
}

impl Step for PackageInstaller {
    fn id(&self) -> &'static str {
        "packages"
    }

    fn description(&self) -> String {
        format!("Install system packages ({})", self.packages.join(", "))
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult, StepError> {
        if self.packages.is_empty() {
            return Ok(ApplyResult::NoChange);
        }

        self.refresh_index(ctx).fail_as(FailureKind::Provision)?;
        self.install(ctx).fail_as(FailureKind::Provision)?;
        Ok(ApplyResult::Modified)
    }
}
