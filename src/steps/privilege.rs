//! Privilege guard - refuse to touch the host unless we are root

use runbook::{ApplyContext, ApplyResult, FailureKind, Step, StepError};

/// Effective UID of the administrative account
pub const ROOT_UID: u32 = 0;

/// Verifies the run has administrative rights. Always the first step.
#[derive(Debug, Clone, Default)]
pub struct PrivilegeGuard;

impl Step for PrivilegeGuard {
    fn id(&self) -> &'static str {
        "privilege-guard"
    }

    fn description(&self) -> String {
        "Verify the run has root privileges".to_string()
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult, StepError> {
        let euid = ctx.host.effective_uid();
        if euid != ROOT_UID {
            return Err(StepError::msg(
                FailureKind::Privilege,
                format!("must run as root (effective uid is {euid})"),
            ));
        }
        Ok(ApplyResult::NoChange)
    }
}
