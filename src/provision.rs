//! The provisioning runbook: eight steps in a fixed order

use runbook::{Host, ProgressCallback, RunSummary, Runbook};

use crate::config::ProvisionConfig;
use crate::steps::{
    ActivationController, ArtifactMaterializer, IdentityProvisioner, PackageInstaller,
    PrivilegeGuard, ReverseProxyConfigurer, RuntimeEnvironmentBuilder, ServiceUnitInstaller,
};

/// Build the runbook for `config`
///
/// The order is load-bearing: the account must exist before files are
/// handed to it, the tree must be in place before the virtualenv is built
/// from its manifest, and the proxy is validated before anything restarts.
pub fn build_runbook(config: &ProvisionConfig) -> Runbook {
    let account = &config.account.name;

    Runbook::new()
        .then(PrivilegeGuard)
        .then(IdentityProvisioner::new(config.account.clone()))
        .then(PackageInstaller::new(config.packages.clone()))
        .then(
            ArtifactMaterializer::new(&config.source_dir, &config.install_dir, account)
                .skipping(config.runtime.venv_dir.to_string_lossy()),
        )
        .then(
            RuntimeEnvironmentBuilder::new(
                account,
                &config.runtime.python,
                config.venv_path(),
                config.manifest_path(),
            )
            .with_browsers(&config.account.home, config.runtime.browsers.clone()),
        )
        .then(ServiceUnitInstaller::new(
            &config.source_dir,
            &config.unit_dir,
            config.units.clone(),
        ))
        .then(ReverseProxyConfigurer::new(
            &config.source_dir,
            config.proxy.clone(),
        ))
        .then(ActivationController::new(
            config.unit_names(),
            &config.proxy.unit,
        ))
}

/// Provision `host` according to `config`
pub fn run<P: ProgressCallback>(
    config: &ProvisionConfig,
    host: &dyn Host,
    progress: &mut P,
) -> runbook::Result<RunSummary> {
    let runbook = build_runbook(config);
    log::info!(
        "Provisioning {} from {}",
        config.install_dir.display(),
        config.source_dir.display()
    );
    runbook::execute(&runbook, host, progress)
}
