//! Runtime environment builder - the Python virtualenv the services run in

use anyhow::{Context, Result, bail};
use runbook::{ApplyContext, ApplyResult, FailAs, FailureKind, Privilege, Step, StepError};
use std::path::{Path, PathBuf};

/// Builds the virtualenv as the service account and installs the dependency
/// manifest into it, then the Playwright browsers the scraper launches.
#[derive(Debug, Clone)]
pub struct RuntimeEnvironmentBuilder {
    /// Account the build runs as
    pub owner: String,
    pub python: String,
    pub venv: PathBuf,
    pub manifest: PathBuf,
    pub browsers: Vec<String>,
    /// Account home; Playwright keeps its browser cache there
    pub home: PathBuf,
}

impl RuntimeEnvironmentBuilder {
    pub fn new(owner: &str, python: &str, venv: impl Into<PathBuf>, manifest: impl Into<PathBuf>) -> Self {
        Self {
            owner: owner.to_string(),
            python: python.to_string(),
            venv: venv.into(),
            manifest: manifest.into(),
            browsers: Vec::new(),
            home: PathBuf::new(),
        }
    }

    /// Also fetch these Playwright browsers into `home`'s cache
    pub fn with_browsers(mut self, home: impl Into<PathBuf>, browsers: Vec<String>) -> Self {
        self.home = home.into();
        self.browsers = browsers;
        self
    }

    /// The interpreter inside the virtualenv
    pub fn interpreter(&self) -> PathBuf {
        self.venv.join("bin").join("python")
    }

    fn pip(&self) -> PathBuf {
        self.venv.join("bin").join("pip")
    }

    fn playwright(&self) -> PathBuf {
        self.venv.join("bin").join("playwright")
    }

    /// A venv whose ensurepip failed has an interpreter but no pip
    fn venv_is_usable(&self) -> bool {
        self.interpreter().exists() && self.pip().exists()
    }

    fn create_venv(&self, ctx: &ApplyContext) -> Result<()> {
        let venv = self.venv.to_string_lossy();
        ctx.run_checked(&self.python, &["-m", "venv", &venv])
            .with_context(|| format!("Failed to create virtualenv at {venv}"))?;
        Ok(())
    }

    fn install_manifest(&self, ctx: &ApplyContext) -> Result<()> {
        let pip = self.pip();
        let manifest = self.manifest.to_string_lossy();
        ctx.run_checked(
            &pip.to_string_lossy(),
            &["install", "--no-cache-dir", "-r", &manifest],
        )
        .with_context(|| format!("Failed to install dependencies from {manifest}"))?;
        Ok(())
    }

    fn install_browsers(&self, ctx: &ApplyContext) -> Result<()> {
        let playwright = self.playwright();
        let playwright = playwright.to_string_lossy();
        let browsers: Vec<&str> = self.browsers.iter().map(String::as_str).collect();

        // System libraries come from apt, so this part needs root
        let mut deps = vec!["install-deps"];
        deps.extend(&browsers);
        ctx.as_root()
            .run_checked(&playwright, &deps)
            .context("Failed to install browser system dependencies")?;

        // runuser keeps the caller's HOME; the cache must land in the account's
        let home = format!("HOME={}", self.home.display());
        let mut install = vec![home.as_str(), &*playwright, "install"];
        install.extend(&browsers);
        ctx.run_checked("env", &install)
            .with_context(|| format!("Failed to install browsers ({})", self.browsers.join(", ")))?;
        Ok(())
    }
}

fn require_manifest(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("Dependency manifest not found: {}", path.display());
    }
    Ok(())
}

impl Step for RuntimeEnvironmentBuilder {
    fn id(&self) -> &'static str {
        "runtime"
    }

    fn description(&self) -> String {
        format!("Build virtualenv at {} as '{}'", self.venv.display(), self.owner)
    }

    fn privilege(&self) -> Privilege {
        Privilege::Account {
            name: self.owner.clone(),
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult, StepError> {
        require_manifest(&self.manifest).fail_as(FailureKind::Build)?;

        let mut result = ApplyResult::Modified;
        if self.venv_is_usable() {
            log::info!("Virtualenv already present at {}", self.venv.display());
        } else {
            self.create_venv(ctx).fail_as(FailureKind::Build)?;
            result = ApplyResult::Created;
        }

        self.install_manifest(ctx).fail_as(FailureKind::Build)?;
        if !self.browsers.is_empty() {
            self.install_browsers(ctx).fail_as(FailureKind::Build)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, RuntimeEnvironmentBuilder) {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("requirements.txt");
        fs::write(&manifest, "streamlit\nplaywright\n").unwrap();
        let step = RuntimeEnvironmentBuilder::new("svc", "python3", temp.path().join("venv"), manifest);
        (temp, step)
    }

    fn apply_dropped(step: &RuntimeEnvironmentBuilder, host: &FakeHost) -> Result<ApplyResult, StepError> {
        let mut ctx = ApplyContext::new(host).with_privilege(step.privilege());
        step.apply(&mut ctx)
    }

    #[test]
    fn test_fresh_build_runs_as_service_account() {
        let (temp, step) = setup();
        let host = FakeHost::root();

        assert_eq!(apply_dropped(&step, &host).unwrap(), ApplyResult::Created);

        let venv = temp.path().join("venv");
        let manifest = temp.path().join("requirements.txt");
        assert_eq!(
            host.calls(),
            vec![
                format!("runuser -u svc -- python3 -m venv {}", venv.display()),
                format!(
                    "runuser -u svc -- {}/bin/pip install --no-cache-dir -r {}",
                    venv.display(),
                    manifest.display()
                ),
            ]
        );
    }

    #[test]
    fn test_existing_venv_skips_creation() {
        let (_temp, step) = setup();
        fs::create_dir_all(step.venv.join("bin")).unwrap();
        fs::write(step.interpreter(), "").unwrap();
        fs::write(step.pip(), "").unwrap();
        let host = FakeHost::root();

        assert_eq!(apply_dropped(&step, &host).unwrap(), ApplyResult::Modified);
        assert!(!host.ran("runuser -u svc -- python3 -m venv"));
        assert!(host.calls()[0].contains("pip install --no-cache-dir"));
    }

    #[test]
    fn test_venv_without_pip_is_rebuilt() {
        let (_temp, step) = setup();
        fs::create_dir_all(step.venv.join("bin")).unwrap();
        fs::write(step.interpreter(), "").unwrap();
        let host = FakeHost::root();

        assert_eq!(apply_dropped(&step, &host).unwrap(), ApplyResult::Created);
        let calls = host.calls();
        assert_eq!(
            calls[0],
            format!("runuser -u svc -- python3 -m venv {}", step.venv.display())
        );
        assert!(calls[1].contains("pip install --no-cache-dir"));
    }

    #[test]
    fn test_browsers_installed_after_dependencies() {
        let (_temp, step) = setup();
        let step = step.with_browsers("/home/svc", vec!["chromium".to_string()]);
        let host = FakeHost::root();

        apply_dropped(&step, &host).unwrap();

        let playwright = step.playwright().display().to_string();
        let calls = host.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls[1].contains("pip install --no-cache-dir"));
        assert_eq!(calls[2], format!("{playwright} install-deps chromium"));
        assert_eq!(
            calls[3],
            format!("runuser -u svc -- env HOME=/home/svc {playwright} install chromium")
        );
    }

    #[test]
    fn test_failed_browser_download_is_a_build_error() {
        let (_temp, step) = setup();
        let step = step.with_browsers("/home/svc", vec!["chromium".to_string()]);
        let host = FakeHost::root().failing(
            "runuser -u svc -- env",
            1,
            "Error: Download failed: server returned code 403",
        );

        let err = apply_dropped(&step, &host).unwrap_err();
        assert_eq!(err.kind, FailureKind::Build);
        assert!(err.to_string().contains("Failed to install browsers (chromium)"));
    }

    #[test]
    fn test_missing_manifest_is_a_build_error() {
        let temp = TempDir::new().unwrap();
        let step = RuntimeEnvironmentBuilder::new(
            "svc",
            "python3",
            temp.path().join("venv"),
            temp.path().join("requirements.txt"),
        );
        let host = FakeHost::root();

        let err = apply_dropped(&step, &host).unwrap_err();
        assert_eq!(err.kind, FailureKind::Build);
        assert!(err.to_string().contains("Dependency manifest not found"));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_failed_venv_creation_stops_the_build() {
        let (_temp, step) = setup();
        let host = FakeHost::root().failing(
            "runuser -u svc -- python3",
            1,
            "The virtual environment was not created successfully because ensurepip is not available",
        );

        let err = apply_dropped(&step, &host).unwrap_err();
        assert_eq!(err.kind, FailureKind::Build);
        assert!(err.to_string().contains("Failed to create virtualenv"));
        assert_eq!(host.calls().len(), 1);
    }

    #[test]
    fn test_failed_dependency_install() {
        let (_temp, step) = setup();
        let pip = format!("runuser -u svc -- {}", step.pip().display());
        let host = FakeHost::root().failing(
            &pip,
            1,
            "ERROR: No matching distribution found for streamlit",
        );

        let err = apply_dropped(&step, &host).unwrap_err();
        assert_eq!(err.kind, FailureKind::Build);
        assert!(err.to_string().contains("No matching distribution"));
    }
}
