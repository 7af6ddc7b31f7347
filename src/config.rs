//! Compiled-in provisioning parameters
//!
//! Everything a run needs is a constant here. There is no config file and
//! no environment override; the only input taken from the invocation is the
//! source tree, which is the current working directory.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Service account the application runs as
pub const ACCOUNT_NAME: &str = "defi-oi";
/// Home directory of the service account
pub const ACCOUNT_HOME: &str = "/home/defi-oi";
/// Login shell of the service account
pub const ACCOUNT_SHELL: &str = "/bin/bash";

/// Where the application tree is installed
pub const INSTALL_DIR: &str = "/opt/defi-oi-monitor";

/// System packages the stack needs
pub const PACKAGES: &[&str] = &["python3", "python3-venv", "python3-pip", "nginx"];

/// Interpreter used to create the virtual environment
pub const PYTHON: &str = "python3";
/// Virtual environment directory, relative to the install directory
pub const VENV_DIR: &str = "venv";
/// Dependency manifest, relative to the install directory
pub const MANIFEST: &str = "requirements.txt";
/// Playwright browsers the scraper drives
pub const BROWSERS: &[&str] = &["chromium"];

/// systemd unit directory
pub const UNIT_DIR: &str = "/etc/systemd/system";
/// Unit files bundled with the source tree: (unit name, path in source tree)
pub const UNITS: &[(&str, &str)] = &[
    ("defi-oi-scraper.service", "deploy/defi-oi-scraper.service"),
    ("defi-oi-dashboard.service", "deploy/defi-oi-dashboard.service"),
];

/// nginx site bundled with the source tree: (site name, path in source tree)
pub const PROXY_SITE: (&str, &str) = ("defi-oi-monitor", "deploy/nginx/defi-oi-monitor");
pub const SITES_AVAILABLE: &str = "/etc/nginx/sites-available";
pub const SITES_ENABLED: &str = "/etc/nginx/sites-enabled";
/// The distribution's default site link, removed so ours is the only one
pub const DEFAULT_SITE: &str = "/etc/nginx/sites-enabled/default";
/// Command that validates the full merged proxy configuration
pub const PROXY_VALIDATE: &[&str] = &["nginx", "-t"];
pub const PROXY_UNIT: &str = "nginx";

/// Every parameter of a provisioning run
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionConfig {
    /// Source tree copied into the install directory
    pub source_dir: PathBuf,
    pub install_dir: PathBuf,
    pub unit_dir: PathBuf,
    pub packages: Vec<String>,
    pub account: AccountConfig,
    pub runtime: RuntimeConfig,
    pub units: Vec<ArtifactSpec>,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountConfig {
    pub name: String,
    pub home: PathBuf,
    pub shell: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeConfig {
    pub python: String,
    /// Relative to the install directory
    pub venv_dir: PathBuf,
    /// Relative to the install directory
    pub manifest: PathBuf,
    /// Playwright browsers fetched after the manifest is installed
    pub browsers: Vec<String>,
}

/// An opaque file shipped in the source tree
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSpec {
    /// Name it is installed under
    pub name: String,
    /// Location relative to the source tree
    pub source: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProxyConfig {
    pub sites_available: PathBuf,
    pub sites_enabled: PathBuf,
    pub default_site: PathBuf,
    pub validate_command: Vec<String>,
    pub unit: String,
    pub site: ArtifactSpec,
}

impl ProvisionConfig {
    /// The compiled-in configuration, reading the application from `source_dir`
    pub fn builtin(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            install_dir: PathBuf::from(INSTALL_DIR),
            unit_dir: PathBuf::from(UNIT_DIR),
            account: AccountConfig {
                name: ACCOUNT_NAME.to_string(),
                home: PathBuf::from(ACCOUNT_HOME),
                shell: PathBuf::from(ACCOUNT_SHELL),
            },
            packages: PACKAGES.iter().map(ToString::to_string).collect(),
            runtime: RuntimeConfig {
                python: PYTHON.to_string(),
                venv_dir: PathBuf::from(VENV_DIR),
                manifest: PathBuf::from(MANIFEST),
                browsers: BROWSERS.iter().map(ToString::to_string).collect(),
            },
            units: UNITS
                .iter()
                .map(|(name, source)| ArtifactSpec::new(name, source))
                .collect(),
            proxy: ProxyConfig {
                sites_available: PathBuf::from(SITES_AVAILABLE),
                sites_enabled: PathBuf::from(SITES_ENABLED),
                default_site: PathBuf::from(DEFAULT_SITE),
                validate_command: PROXY_VALIDATE.iter().map(ToString::to_string).collect(),
                unit: PROXY_UNIT.to_string(),
                site: ArtifactSpec::new(PROXY_SITE.0, PROXY_SITE.1),
            },
        }
    }

    /// The compiled-in configuration for the current working directory
    pub fn from_current_dir() -> Result<Self> {
        let cwd = std::env::current_dir().context("Could not determine current directory")?;
        Ok(Self::builtin(cwd))
    }

    /// Names of the application units, in install order
    pub fn unit_names(&self) -> Vec<String> {
        self.units.iter().map(|u| u.name.clone()).collect()
    }

    /// Absolute path of the virtual environment
    pub fn venv_path(&self) -> PathBuf {
        self.install_dir.join(&self.runtime.venv_dir)
    }

    /// Absolute path of the dependency manifest inside the install directory
    pub fn manifest_path(&self) -> PathBuf {
        self.install_dir.join(&self.runtime.manifest)
    }

    /// Render as TOML for `hoist config`
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

impl ArtifactSpec {
    pub fn new(name: &str, source: impl AsRef<Path>) -> Self {
        Self {
            name: name.to_string(),
            source: source.as_ref().to_path_buf(),
        }
    }
}
