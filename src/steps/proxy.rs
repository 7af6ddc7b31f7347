//! Reverse proxy configurer - installs and exclusively enables the site

use anyhow::{Context, Result, bail};
use runbook::{ApplyContext, ApplyResult, FailAs, FailureKind, Step, StepError};
use std::fs;
use std::path::{Path, PathBuf};

use crate::blob::Blob;
use crate::config::ProxyConfig;

/// Installs the site definition, makes it the only enabled site and runs
/// the proxy's own configuration check.
///
/// A failed check aborts the run before anything restarts the proxy.
#[derive(Debug, Clone)]
pub struct ReverseProxyConfigurer {
    pub source_dir: PathBuf,
    pub proxy: ProxyConfig,
}

impl ReverseProxyConfigurer {
    pub fn new(source_dir: impl Into<PathBuf>, proxy: ProxyConfig) -> Self {
        Self {
            source_dir: source_dir.into(),
            proxy,
        }
    }

    /// Path of the enabled-site link
    pub fn enabled_link(&self) -> PathBuf {
        self.proxy.sites_enabled.join(&self.proxy.site.name)
    }

    fn install_site(&self) -> Result<Blob> {
        let blob = Blob::load(&self.proxy.site, &self.source_dir, &self.proxy.sites_available)?;
        blob.install()?;
        Ok(blob)
    }

    fn enable(&self, available: &Path) -> Result<()> {
        let link = self.enabled_link();
        fs::create_dir_all(&self.proxy.sites_enabled).with_context(|| {
            format!("Failed to create {}", self.proxy.sites_enabled.display())
        })?;
        remove_entry(&link)?;
        std::os::unix::fs::symlink(available, &link).with_context(|| {
            format!(
                "Failed to create symlink: {} -> {}",
                link.display(),
                available.display()
            )
        })?;
        Ok(())
    }

    fn disable_default(&self) -> Result<bool> {
        let default = &self.proxy.default_site;
        if *default == self.enabled_link() {
            return Ok(false);
        }
        let present = default.is_symlink() || default.exists();
        remove_entry(default)?;
        Ok(present)
    }

    fn validate(&self, ctx: &ApplyContext) -> Result<()> {
        let Some((cmd, rest)) = self.proxy.validate_command.split_first() else {
            bail!("No proxy validation command configured");
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        ctx.run_checked(cmd, &args)
            .context("Proxy configuration check failed")?;
        Ok(())
    }
}

/// Remove a file or link if present; a dangling link counts as present
fn remove_entry(path: &Path) -> Result<()> {
    if path.is_symlink() || path.is_file() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

impl Step for ReverseProxyConfigurer {
    fn id(&self) -> &'static str {
        "reverse-proxy"
    }

    fn description(&self) -> String {
        format!("Enable proxy site '{}' and validate", self.proxy.site.name)
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult, StepError> {
        let site = self.install_site().fail_as(FailureKind::Provision)?;
        self.enable(&site.destination)
            .fail_as(FailureKind::Provision)?;
        if self.disable_default().fail_as(FailureKind::Provision)? {
            log::info!("Disabled default site {}", self.proxy.default_site.display());
        }

        self.validate(ctx).fail_as(FailureKind::ConfigValidation)?;
        Ok(ApplyResult::Modified)
    }
}
