//! # Runbook
//!
//! Ordered, fail-fast execution of host mutation steps.
//!
//! A provisioning run is a fixed sequence of steps. Each step must fully
//! succeed before the next begins, and the first failure ends the run with
//! no compensating rollback. Re-running converges because individual steps
//! are safe to repeat.
//!
//! ## Core Concepts
//!
//! - **Step**: One named stage of a run (create an account, install packages)
//! - **Runbook**: Steps in the order they must run
//! - **Host**: Where commands run; swapped for a fake in tests
//! - **FailureKind**: Why a run stopped (privilege, provision, build,
//!   configuration validation, activation)
//!
//! ## Example
//!
//! ```ignore
//! use runbook::{execute_simple, Runbook};
//!
//! let runbook = Runbook::new()
//!     .then(PrivilegeGuard)
//!     .then(PackageInstaller::new(packages));
//!
//! match execute_simple(&runbook, &host) {
//!     Ok(summary) => println!("{} steps changed the host", summary.total_changes()),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

pub mod context;
pub mod error;
pub mod executor;
pub mod planner;
pub mod step;
pub mod types;

// Re-export main types at crate root
pub use context::{ApplyContext, Host, NoProgress, ProgressCallback, command_line};
pub use error::{Error, FailAs, FailureKind, Result, StepError};
pub use executor::{execute, execute_simple};
pub use planner::Runbook;
pub use step::{BoxedStep, Step};
pub use types::{ApplyResult, CommandOutput, Privilege, RunState, RunSummary};
