//! Waiting on and reaping the processes of a pipeline.

use crate::command::{ProcessHandle, StageStatus};
use crate::error::ExecError;
use crate::executor::{ExecutionResult, StageResult};

/// One stage of a launched pipeline: either a live process or a final status.
pub(crate) enum StageSlot {
    Running {
        command: String,
        handle: Box<dyn ProcessHandle>,
    },
    Done(StageResult),
}

impl StageSlot {
    pub(crate) fn running(command: String, handle: Box<dyn ProcessHandle>) -> Self {
        StageSlot::Running { command, handle }
    }

    /// A stage that never got a process, e.g. because its program is missing.
    pub(crate) fn finished(command: String, status: StageStatus) -> Self {
        StageSlot::Done(StageResult { command, status })
    }

    pub(crate) fn wait(self) -> Result<StageResult, ExecError> {
        match self {
            StageSlot::Running {
                command,
                mut handle,
            } => match handle.wait() {
                Ok(status) => Ok(StageResult { command, status }),
                Err(source) => Err(ExecError::Wait { command, source }),
            },
            StageSlot::Done(result) => Ok(result),
        }
    }

    /// Moves a running stage to `Done` if its process has exited. Returns whether the
    /// stage is done.
    fn poll(&mut self) -> Result<bool, ExecError> {
        let StageSlot::Running { command, handle } = self else {
            return Ok(true);
        };
        match handle.try_wait() {
            Ok(Some(status)) => {
                let command = std::mem::take(command);
                *self = StageSlot::Done(StageResult { command, status });
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(source) => Err(ExecError::Wait {
                command: command.clone(),
                source,
            }),
        }
    }

    fn pid(&self) -> Option<u32> {
        match self {
            StageSlot::Running { handle, .. } => Some(handle.id()),
            StageSlot::Done(_) => None,
        }
    }

    fn result(&self) -> Option<&StageResult> {
        match self {
            StageSlot::Done(result) => Some(result),
            StageSlot::Running { .. } => None,
        }
    }
}

/// The stages of a pipeline that was started without waiting.
pub struct BackgroundJob {
    slots: Vec<StageSlot>,
}

impl BackgroundJob {
    pub(crate) fn new(slots: Vec<StageSlot>) -> Self {
        Self { slots }
    }

    /// Process ids of the stages still running.
    pub fn pids(&self) -> Vec<u32> {
        self.slots.iter().filter_map(StageSlot::pid).collect()
    }

    /// Collects the status of any stage that has exited, without blocking.
    ///
    /// Returns the full result once every stage is done.
    pub fn poll(&mut self) -> Result<Option<ExecutionResult>, ExecError> {
        let mut all_done = true;
        for slot in &mut self.slots {
            all_done &= slot.poll()?;
        }
        if !all_done {
            return Ok(None);
        }
        let stages = self.slots.iter().filter_map(StageSlot::result).cloned().collect();
        Ok(Some(ExecutionResult { stages }))
    }

    /// Blocks until every stage has exited, in spawn order.
    ///
    /// A failure to collect one stage does not stop the others from being waited
    /// for; the first such failure is returned at the end.
    pub fn wait(self) -> Result<ExecutionResult, ExecError> {
        let mut stages = Vec::with_capacity(self.slots.len());
        let mut first_error = None;
        for slot in self.slots {
            match slot.wait() {
                Ok(result) => stages.push(result),
                Err(e) => {
                    tracing::warn!(error = %e, "lost track of stage");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(ExecutionResult { stages }),
        }
    }
}

/// A background pipeline whose stages have all exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    /// The command line that started the pipeline.
    pub line: String,
    pub result: ExecutionResult,
}

/// A background pipeline whose statuses could not be collected. Its processes are
/// no longer tracked.
#[derive(Debug)]
pub struct FailedJob {
    pub line: String,
    pub error: ExecError,
}

/// Everything one reaping pass took off the tracked list, in start order.
#[derive(Debug, Default)]
pub struct Reaped {
    pub completed: Vec<Completed>,
    pub failed: Vec<FailedJob>,
}

impl Reaped {
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.failed.is_empty()
    }

    /// Number of pipelines no longer tracked after the pass.
    pub fn len(&self) -> usize {
        self.completed.len() + self.failed.len()
    }

    fn record(&mut self, line: String, outcome: Result<ExecutionResult, ExecError>) {
        match outcome {
            Ok(result) => self.completed.push(Completed { line, result }),
            Err(error) => {
                tracing::debug!(line = %line, error = %error, "lost background job");
                self.failed.push(FailedJob { line, error });
            }
        }
    }
}

struct TrackedJob {
    line: String,
    job: BackgroundJob,
}

/// Supervises background pipelines.
///
/// The executor forgets a background pipeline as soon as it is started. Whoever
/// started it hands it to a reaper and calls [`Reaper::reap`] periodically;
/// processes that exit in the meantime stay zombies until then.
#[derive(Default)]
pub struct Reaper {
    jobs: Vec<TrackedJob>,
}

impl Reaper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, line: impl Into<String>, job: BackgroundJob) {
        let line = line.into();
        tracing::debug!(line = %line, pids = ?job.pids(), "tracking background job");
        self.jobs.push(TrackedJob { line, job });
    }

    /// Number of background pipelines not reaped yet.
    pub fn running(&self) -> usize {
        self.jobs.len()
    }

    /// Non-blocking pass over every tracked pipeline. Returns those that finished
    /// and those whose status could not be collected.
    pub fn reap(&mut self) -> Reaped {
        let mut reaped = Reaped::default();
        let mut pending = Vec::with_capacity(self.jobs.len());
        for mut tracked in self.jobs.drain(..) {
            match tracked.job.poll() {
                Ok(None) => pending.push(tracked),
                Ok(Some(result)) => reaped.record(tracked.line, Ok(result)),
                Err(e) => reaped.record(tracked.line, Err(e)),
            }
        }
        self.jobs = pending;
        reaped
    }

    /// Blocks until every tracked pipeline has finished.
    pub fn wait_all(&mut self) -> Reaped {
        let mut reaped = Reaped::default();
        for tracked in self.jobs.drain(..) {
            reaped.record(tracked.line, tracked.job.wait());
        }
        reaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{Execution, Executor};
    use crate::parser::parse_line;
    use crate::testing::FakeSpawner;

    fn start<S: crate::Spawner>(executor: &Executor<S>, line: &str) -> BackgroundJob {
        let pipeline = parse_line(line, 1024).unwrap().unwrap();
        match executor.execute(&pipeline).unwrap() {
            Execution::Background(job) => job,
            Execution::Foreground(_) => panic!("expected a background job"),
        }
    }

    #[test]
    fn test_reap_reports_jobs_once_they_finish() {
        let executor = Executor::new(FakeSpawner::default().polls_until_exit(2));
        let mut reaper = Reaper::new();
        reaper.track("sleep 1 &", start(&executor, "sleep 1 &"));
        assert_eq!(reaper.running(), 1);

        // Each reap pass advances the fake clock by one poll.
        assert!(reaper.reap().is_empty());
        assert!(reaper.reap().is_empty());
        let done = reaper.reap();
        assert_eq!(done.len(), 1);
        assert_eq!(done.completed[0].line, "sleep 1 &");
        assert_eq!(done.completed[0].result.codes(), vec![0]);
        assert_eq!(reaper.running(), 0);
        assert!(reaper.reap().is_empty());
    }

    #[test]
    fn test_job_finishes_when_its_slowest_stage_does() {
        let spawner = FakeSpawner::default()
            .polls_until_exit(0)
            .slow("sort", 2)
            .exit_code("sort", 4);
        let executor = Executor::new(spawner);
        let mut job = start(&executor, "cat | sort | uniq &");
        assert_eq!(job.pids().len(), 3);

        assert_eq!(job.poll().unwrap(), None);
        assert_eq!(job.pids().len(), 1);
        assert_eq!(job.poll().unwrap(), None);
        let result = job.poll().unwrap().unwrap();
        assert_eq!(result.codes(), vec![0, 4, 0]);
    }

    #[test]
    fn test_completed_jobs_keep_start_order() {
        let spawner = FakeSpawner::default().polls_until_exit(0).slow("slow", 5);
        let executor = Executor::new(spawner);
        let mut reaper = Reaper::new();
        reaper.track("slow &", start(&executor, "slow &"));
        reaper.track("a &", start(&executor, "a &"));
        reaper.track("b &", start(&executor, "b &"));

        let lines: Vec<String> = reaper.reap().completed.into_iter().map(|c| c.line).collect();
        assert_eq!(lines, vec!["a &", "b &"]);
        assert_eq!(reaper.running(), 1);

        let rest = reaper.wait_all();
        assert_eq!(rest.completed.len(), 1);
        assert_eq!(rest.completed[0].line, "slow &");
        assert!(rest.failed.is_empty());
        assert_eq!(reaper.running(), 0);
    }

    #[test]
    fn test_missing_program_in_background_is_reported_by_reaper() {
        let executor = Executor::new(FakeSpawner::default().missing("ghost"));
        let mut reaper = Reaper::new();
        reaper.track("ghost &", start(&executor, "ghost &"));
        let done = reaper.reap();
        assert_eq!(done.completed[0].result.stages[0].status, StageStatus::CommandNotFound);
    }

    #[test]
    fn test_reap_returns_jobs_whose_status_cannot_be_collected() {
        let executor = Executor::new(FakeSpawner::default().polls_until_exit(3).broken("zombie"));
        let mut reaper = Reaper::new();
        reaper.track("zombie &", start(&executor, "zombie &"));
        reaper.track("sleep 1 &", start(&executor, "sleep 1 &"));

        let done = reaper.reap();
        assert!(done.completed.is_empty());
        assert_eq!(done.failed.len(), 1);
        assert_eq!(done.failed[0].line, "zombie &");
        assert!(matches!(
            &done.failed[0].error,
            ExecError::Wait { command, .. } if command == "zombie"
        ));
        assert_eq!(reaper.running(), 1);
    }

    #[test]
    fn test_wait_all_returns_jobs_whose_status_cannot_be_collected() {
        let executor = Executor::new(FakeSpawner::default().broken("zombie"));
        let mut reaper = Reaper::new();
        reaper.track("zombie &", start(&executor, "zombie &"));
        reaper.track("true &", start(&executor, "true &"));

        let done = reaper.wait_all();
        assert_eq!(done.len(), 2);
        assert_eq!(done.failed[0].line, "zombie &");
        assert_eq!(done.completed[0].line, "true &");
        assert_eq!(reaper.running(), 0);
    }
}
