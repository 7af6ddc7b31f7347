//! Activation controller - hands the installed units to systemd

use anyhow::{Context, Result};
use runbook::{ApplyContext, ApplyResult, FailAs, FailureKind, Step, StepError};
use std::fmt;

/// How far activation got. Phases only move forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActivationPhase {
    #[default]
    NotStarted,
    IndexReloaded,
    UnitsEnabled,
    AppStarted,
    ProxyRestarted,
}

impl ActivationPhase {
    /// The phase after this one; `ProxyRestarted` is terminal
    pub fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::IndexReloaded),
            Self::IndexReloaded => Some(Self::UnitsEnabled),
            Self::UnitsEnabled => Some(Self::AppStarted),
            Self::AppStarted => Some(Self::ProxyRestarted),
            Self::ProxyRestarted => None,
        }
    }

    /// Move one phase forward
    pub fn advance(&mut self) {
        if let Some(next) = self.next() {
            *self = next;
        }
    }
}

impl fmt::Display for ActivationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::IndexReloaded => "unit index reloaded",
            Self::UnitsEnabled => "units enabled",
            Self::AppStarted => "application started",
            Self::ProxyRestarted => "proxy restarted",
        };
        f.write_str(name)
    }
}

/// Reloads the unit index, enables everything for boot, starts the
/// application units and restarts the proxy.
#[derive(Debug, Clone)]
pub struct ActivationController {
    pub units: Vec<String>,
    pub proxy_unit: String,
}

impl ActivationController {
    pub fn new(units: Vec<String>, proxy_unit: &str) -> Self {
        Self {
            units,
            proxy_unit: proxy_unit.to_string(),
        }
    }

    /// The systemctl invocation that moves `phase` to the next one
    fn command_for(&self, phase: ActivationPhase) -> Option<Vec<&str>> {
        let units = self.units.iter().map(String::as_str);
        match phase {
            ActivationPhase::NotStarted => Some(vec!["daemon-reload"]),
            ActivationPhase::IndexReloaded => Some(
                std::iter::once("enable")
                    .chain(units)
                    .chain(std::iter::once(self.proxy_unit.as_str()))
                    .collect(),
            ),
            ActivationPhase::UnitsEnabled => Some(std::iter::once("start").chain(units).collect()),
            ActivationPhase::AppStarted => Some(vec!["restart", self.proxy_unit.as_str()]),
            ActivationPhase::ProxyRestarted => None,
        }
    }

    /// Run every remaining transition, returning the phase reached
    pub fn activate(&self, ctx: &ApplyContext) -> Result<ActivationPhase> {
        let mut phase = ActivationPhase::NotStarted;
        while let Some(args) = self.command_for(phase) {
            ctx.run_checked("systemctl", &args)
                .with_context(|| format!("Activation stopped at phase '{phase}'"))?;
            phase.advance();
            log::info!("Activation: {phase}");
        }
        Ok(phase)
    }
}

impl Step for ActivationController {
    fn id(&self) -> &'static str {
        "activation"
    }

    fn description(&self) -> String {
        format!(
            "Enable and start {} and restart {}",
            self.units.join(", "),
            self.proxy_unit
        )
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult, StepError> {
        self.activate(ctx).fail_as(FailureKind::Activation)?;
        Ok(ApplyResult::Modified)
    }
}
