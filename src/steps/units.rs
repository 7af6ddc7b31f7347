//! Service unit installer

use anyhow::Context;
use runbook::{ApplyContext, ApplyResult, FailAs, FailureKind, Step, StepError};
use std::path::PathBuf;

use crate::blob::Blob;
use crate::config::ArtifactSpec;

/// Copies the bundled unit files verbatim into the unit directory,
/// overwriting units of the same name.
#[derive(Debug, Clone)]
pub struct ServiceUnitInstaller {
    pub source_dir: PathBuf,
    pub unit_dir: PathBuf,
    pub units: Vec<ArtifactSpec>,
}

impl ServiceUnitInstaller {
    pub fn new(source_dir: impl Into<PathBuf>, unit_dir: impl Into<PathBuf>, units: Vec<ArtifactSpec>) -> Self {
        Self {
            source_dir: source_dir.into(),
            unit_dir: unit_dir.into(),
            units,
        }
    }

    /// Load every unit up front so a missing one fails before any is written
    fn load(&self) -> anyhow::Result<Vec<Blob>> {
        self.units
            .iter()
            .map(|spec| Blob::load(spec, &self.source_dir, &self.unit_dir).map_err(Into::into))
            .collect()
    }
}

impl Step for ServiceUnitInstaller {
    fn id(&self) -> &'static str {
        "service-units"
    }

    fn description(&self) -> String {
        let names: Vec<&str> = self.units.iter().map(|u| u.name.as_str()).collect();
        format!("Install unit files ({})", names.join(", "))
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult, StepError> {
        let blobs = self.load().fail_as(FailureKind::Provision)?;

        let mut result = ApplyResult::NoChange;
        for blob in &blobs {
            let change = if blob.is_current() {
                ApplyResult::NoChange
            } else if blob.destination.exists() {
                ApplyResult::Modified
            } else {
                ApplyResult::Created
            };

            blob.install()
                .context("Failed to install unit file")
                .fail_as(FailureKind::Provision)?;
            log::info!("Installed {}", blob.destination.display());
            result = result.merge(change);
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

    fn setup() -> (TempDir, ServiceUnitInstaller) {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("checkout");
        fs::create_dir_all(source.join("deploy")).unwrap();
        fs::write(source.join("deploy/scraper.service"), "[Service]\nExecStart=scrape\n").unwrap();
        fs::write(source.join("deploy/dashboard.service"), "[Service]\nExecStart=dash\n").unwrap();

        let step = ServiceUnitInstaller::new(
            &source,
            temp.path().join("systemd"),
            vec![
                ArtifactSpec::new("scraper.service", "deploy/scraper.service"),
                ArtifactSpec::new("dashboard.service", "deploy/dashboard.service"),
            ],
        );
        (temp, step)
    }

    #[test]
    fn test_installs_units_verbatim_without_commands() {
        let (_temp, step) = setup();
        let host = FakeHost::root();
        let mut ctx = ApplyContext::new(&host);

        assert_eq!(step.apply(&mut ctx).unwrap(), ApplyResult::Created);
        assert_eq!(
            fs::read_to_string(step.unit_dir.join("scraper.service")).unwrap(),
            "[Service]\nExecStart=scrape\n"
        );
        assert!(step.unit_dir.join("dashboard.service").is_file());
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_overwrites_previous_units() {
        let (_temp, step) = setup();
        fs::create_dir_all(&step.unit_dir).unwrap();
        fs::write(step.unit_dir.join("scraper.service"), "[Service]\nExecStart=old\n").unwrap();

        let host = FakeHost::root();
        let mut ctx = ApplyContext::new(&host);
        step.apply(&mut ctx).unwrap();

        assert_eq!(
            fs::read_to_string(step.unit_dir.join("scraper.service")).unwrap(),
            "[Service]\nExecStart=scrape\n"
        );
        // Second pass writes identical bytes again
        assert_eq!(step.apply(&mut ctx).unwrap(), ApplyResult::NoChange);
    }

    #[test]
    fn test_missing_unit_writes_nothing() {
        let (temp, step) = setup();
        fs::remove_file(temp.path().join("checkout/deploy/dashboard.service")).unwrap();

        let host = FakeHost::root();
        let mut ctx = ApplyContext::new(&host);
        let err = step.apply(&mut ctx).unwrap_err();

        assert_eq!(err.kind, FailureKind::Provision);
        assert!(err.to_string().contains("'dashboard.service' not found"));
        assert!(!step.unit_dir.join("scraper.service").exists());
    }
}
