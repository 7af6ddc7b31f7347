//! Identity provisioner - the unprivileged account the services run as

use anyhow::Context;
use runbook::{ApplyContext, ApplyResult, FailAs, FailureKind, Step, StepError};

use crate::config::AccountConfig;

/// Ensures the service account exists. Existing accounts are left alone.
#[derive(Debug, Clone)]
pub struct IdentityProvisioner {
    pub account: AccountConfig,
}

impl IdentityProvisioner {
    pub fn new(account: AccountConfig) -> Self {
        Self { account }
    }

    /// Check if the account exists
    fn exists(&self, ctx: &ApplyContext) -> anyhow::Result<bool> {
        ctx.host
            .run_status("id", &["-u", &self.account.name])
            .context("Failed to look up account")
    }

    fn create(&self, ctx: &ApplyContext) -> anyhow::Result<()> {
        let home = self.account.home.to_string_lossy();
        let shell = self.account.shell.to_string_lossy();
        ctx.run_checked(
            "useradd",
            &[
                "--create-home",
                "--home-dir",
                &home,
                "--shell",
                &shell,
                &self.account.name,
            ],
        )
        .with_context(|| format!("Failed to create account '{}'", self.account.name))?;
        Ok(())
    }
}

impl Step for IdentityProvisioner {
    fn id(&self) -> &'static str {
        "service-account"
    }

    fn description(&self) -> String {
        format!("Ensure service account '{}' exists", self.account.name)
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult, StepError> {
        if self.exists(ctx).fail_as(FailureKind::Provision)? {
            log::info!("Account '{}' already exists", self.account.name);
            return Ok(ApplyResult::NoChange);
        }

        self.create(ctx).fail_as(FailureKind::Provision)?;
        log::info!("Created account '{}'", self.account.name);
        Ok(ApplyResult::Created)
    }
}
