//! Step trait for ordered host mutation
//!
//! A Step is one stage of a provisioning run. Steps run strictly in the
//! order they were added; each one's postconditions are the next one's
//! preconditions.

use crate::context::ApplyContext;
use crate::error::StepError;
use crate::types::{ApplyResult, Privilege};
use std::fmt;

/// Core trait for provisioning steps
///
/// # Example
///
/// ```ignore
/// use runbook::{ApplyContext, ApplyResult, FailAs, FailureKind, Step, StepError};
///
/// #[derive(Debug)]
/// struct DaemonReload;
///
/// impl Step for DaemonReload {
///     fn id(&self) -> &'static str {
///         "daemon-reload"
///     }
///
///     fn description(&self) -> String {
///         "Reload systemd unit files".to_string()
///     }
///
///     fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult, StepError> {
///         ctx.run_checked("systemctl", &["daemon-reload"])
///             .fail_as(FailureKind::Activation)?;
///         Ok(ApplyResult::Modified)
///     }
/// }
/// ```
pub trait Step: Send + Sync + fmt::Debug {
    /// Stable identifier, used in diagnostics and `hoist steps`
    fn id(&self) -> &'static str;

    /// Human-readable description of what this step does
    fn description(&self) -> String;

    /// Identity the step's commands run under
    ///
    /// The executor builds the step's [`ApplyContext`] with this privilege.
    /// A step returning [`Privilege::Account`] only runs a command as root
    /// by asking for it explicitly with [`ApplyContext::as_root`].
    fn privilege(&self) -> Privilege {
        Privilege::Root
    }

    /// Mutate the host until the step's postconditions hold
    ///
    /// Any error aborts the whole run. Earlier steps' effects are left in
    /// place.
    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult, StepError>;
}

/// A boxed step for type-erased storage
pub type BoxedStep = Box<dyn Step>;
