//! Execution engine - applies steps in order and stops at the first failure

use crate::context::{ApplyContext, Host, NoProgress, ProgressCallback};
use crate::error::{Error, Result, StepError};
use crate::planner::Runbook;
use crate::step::Step;
use crate::types::{ApplyResult, RunState, RunSummary};

/// Execute a runbook against a host
///
/// Steps run one at a time on the calling thread. The first failing step
/// ends the run with [`Error::Aborted`]; steps after it are never applied
/// and nothing already applied is undone.
pub fn execute<P: ProgressCallback>(
    runbook: &Runbook,
    host: &dyn Host,
    progress: &mut P,
) -> Result<RunSummary> {
    let total = runbook.len();
    let mut state = RunState::new(total);
    let mut summary = RunSummary::default();

    progress.on_run_start(total);

    while let Some(index) = state.next_index() {
        let step = &runbook.steps[index];
        progress.on_step_start(index, total, step.id(), &step.description());

        match apply_step(step.as_ref(), host) {
            Ok(result) => {
                progress.on_step_complete(index, step.id(), &result);
                summary.add_result(&result);
                state.advance();
            }
            Err(source) => {
                progress.on_step_failed(index, step.id(), &source.to_string());
                return Err(Error::Aborted {
                    index,
                    total,
                    step: step.id().to_string(),
                    source,
                });
            }
        }
    }

    Ok(summary)
}

/// Apply a single step under the identity it asks for
fn apply_step(
    step: &dyn Step,
    host: &dyn Host,
) -> std::result::Result<ApplyResult, StepError> {
    let mut ctx = ApplyContext::new(host).with_privilege(step.privilege());
    step.apply(&mut ctx)
}

/// Simple execution without callbacks
pub fn execute_simple(runbook: &Runbook, host: &dyn Host) -> Result<RunSummary> {
    execute(runbook, host, &mut NoProgress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailAs, FailureKind};
    use crate::types::CommandOutput;
    use std::sync::Mutex;

    struct CountingHost {
        calls: Mutex<Vec<String>>,
    }

    impl CountingHost {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Host for CountingHost {
        fn run(&self, cmd: &str, args: &[&str]) -> anyhow::Result<CommandOutput> {
            self.calls
                .lock()
                .unwrap()
                .push(crate::context::command_line(cmd, args));
            if cmd == "false" {
                Ok(CommandOutput::failed(1, ""))
            } else {
                Ok(CommandOutput::ok())
            }
        }

        fn effective_uid(&self) -> u32 {
            0
        }
    }

    #[derive(Debug)]
    struct CommandStep {
        id: &'static str,
        cmd: &'static str,
    }

    impl Step for CommandStep {
        fn id(&self) -> &'static str {
            self.id
        }

        fn description(&self) -> String {
            format!("Run {}", self.cmd)
        }

        fn apply(&self, ctx: &mut ApplyContext) -> std::result::Result<ApplyResult, StepError> {
            ctx.run_checked(self.cmd, &[])
                .fail_as(FailureKind::Provision)?;
            Ok(ApplyResult::Modified)
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Vec<String>,
    }

    impl ProgressCallback for RecordingProgress {
        fn on_run_start(&mut self, total: usize) {
            self.events.push(format!("run {total}"));
        }

        fn on_step_start(&mut self, index: usize, _total: usize, id: &str, _description: &str) {
            self.events.push(format!("start {index} {id}"));
        }

        fn on_step_complete(&mut self, index: usize, id: &str, _result: &ApplyResult) {
            self.events.push(format!("done {index} {id}"));
        }

        fn on_step_failed(&mut self, index: usize, id: &str, _error: &str) {
            self.events.push(format!("failed {index} {id}"));
        }
    }

    #[test]
    fn test_execute_empty_runbook() {
        let host = CountingHost::new();
        let summary = execute_simple(&Runbook::new(), &host).unwrap();
        assert_eq!(summary.total(), 0);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_execute_runs_in_order() {
        let mut runbook = Runbook::new();
        runbook.add(Box::new(CommandStep { id: "one", cmd: "first" }));
        runbook.add(Box::new(CommandStep { id: "two", cmd: "second" }));

        let host = CountingHost::new();
        let summary = execute_simple(&runbook, &host).unwrap();

        assert_eq!(summary.modified, 2);
        assert_eq!(host.calls(), vec!["first", "second"]);
    }

    #[test]
    fn test_execute_stops_at_first_failure() {
        let mut runbook = Runbook::new();
        runbook.add(Box::new(CommandStep { id: "one", cmd: "first" }));
        runbook.add(Box::new(CommandStep { id: "broken", cmd: "false" }));
        runbook.add(Box::new(CommandStep { id: "three", cmd: "third" }));

        let host = CountingHost::new();
        let mut progress = RecordingProgress::default();
        let err = execute(&runbook, &host, &mut progress).unwrap_err();

        assert_eq!(err.step_index(), 1);
        assert_eq!(err.kind(), FailureKind::Provision);
        assert_eq!(host.calls(), vec!["first", "false"]);
        assert_eq!(
            progress.events,
            vec!["run 3", "start 0 one", "done 0 one", "start 1 broken", "failed 1 broken"]
        );
    }
}
