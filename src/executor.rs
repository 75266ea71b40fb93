//! Realizes a [`Pipeline`] as a chain of processes.
//!
//! Stage `i` reads from the pipe of edge `(i-1, i)` and writes into the pipe of
//! edge `(i, i+1)`, except where a boundary redirection replaces one of the two.
//! Every pipe end is an owned value. Ends given to a stage are moved into the spawn
//! call and closed as soon as it returns; the only end the executor keeps across
//! iterations is the read side waiting for the next stage. This is what lets each
//! reader see EOF once its writer exits.

use crate::command::{Spawner, StageStatus};
use crate::error::ExecError;
use crate::external::SystemSpawner;
use crate::jobs::{BackgroundJob, StageSlot};
use crate::parser::{Pipeline, Stage};
use std::fs::{File, OpenOptions};
use std::io::{self, PipeReader, PipeWriter};
use std::path::Path;
use std::process::Stdio;

/// Outcome of one stage, in spawn order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    /// `argv[0]` of the stage.
    pub command: String,
    pub status: StageStatus,
}

/// Statuses of every stage of a finished pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    pub stages: Vec<StageResult>,
}

impl ExecutionResult {
    /// Status of the final stage, which is the status of the pipeline as a whole.
    pub fn last_status(&self) -> Option<StageStatus> {
        self.stages.last().map(|s| s.status)
    }

    pub fn codes(&self) -> Vec<i32> {
        self.stages.iter().map(|s| s.status.code()).collect()
    }
}

/// What [`Executor::execute`] hands back.
pub enum Execution {
    /// Every stage has been waited for.
    Foreground(ExecutionResult),
    /// Stages were started and left running. Reaping them is the caller's job, see
    /// [`crate::Reaper`]; a job dropped without being waited for leaves zombies.
    Background(BackgroundJob),
}

/// Stateless pipeline orchestrator. The same executor can run any number of
/// pipelines; nothing carries over from one to the next.
#[derive(Debug, Default, Clone)]
pub struct Executor<S = SystemSpawner> {
    spawner: S,
}

impl<S: Spawner> Executor<S> {
    pub fn new(spawner: S) -> Self {
        Self { spawner }
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Starts every stage of `pipeline`, then either waits for all of them in spawn
    /// order or, for a background pipeline, returns right away.
    ///
    /// Per-stage failures (missing program, unopenable redirection file) end up in
    /// the stage's status. An error is returned only when the executor itself
    /// cannot proceed, in which case the stages already started have been waited
    /// for.
    #[tracing::instrument(level = "debug", skip(self, pipeline), fields(stages = pipeline.stages.len(), background = pipeline.background))]
    pub fn execute(&self, pipeline: &Pipeline) -> Result<Execution, ExecError> {
        let job = BackgroundJob::new(self.launch(pipeline)?);
        if pipeline.background {
            tracing::debug!(pids = ?job.pids(), "left pipeline running in background");
            Ok(Execution::Background(job))
        } else {
            job.wait().map(Execution::Foreground)
        }
    }

    fn launch(&self, pipeline: &Pipeline) -> Result<Vec<StageSlot>, ExecError> {
        let last = pipeline.stages.len().saturating_sub(1);
        let mut slots = Vec::with_capacity(pipeline.stages.len());
        let mut upstream: Option<PipeReader> = None;

        for (i, stage) in pipeline.stages.iter().enumerate() {
            let inbound = upstream.take();
            let outbound = if i < last {
                match io::pipe() {
                    Ok((reader, writer)) => {
                        upstream = Some(reader);
                        Some(writer)
                    }
                    Err(e) => {
                        // Release the read end first so the previous stage
                        // cannot block on a full pipe while we wait for it.
                        drop(inbound);
                        for slot in slots {
                            if let Err(wait_err) = StageSlot::wait(slot) {
                                tracing::warn!(error = %wait_err, "abandoning stage");
                            }
                        }
                        return Err(ExecError::Pipe(e));
                    }
                }
            } else {
                None
            };
            slots.push(self.launch_stage(stage, inbound, outbound));
        }
        Ok(slots)
    }

    fn launch_stage(
        &self,
        stage: &Stage,
        inbound: Option<PipeReader>,
        outbound: Option<PipeWriter>,
    ) -> StageSlot {
        let command = stage.command().unwrap_or_default().to_string();

        let stdin = match &stage.input_file {
            Some(path) => match File::open(path) {
                Ok(file) => Stdio::from(file),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "cannot open input file");
                    return StageSlot::finished(command, StageStatus::CannotOpenInputFile);
                }
            },
            None => inbound.map_or_else(Stdio::inherit, Stdio::from),
        };

        let stdout = match &stage.output_file {
            Some(path) => match open_output(path) {
                Ok(file) => Stdio::from(file),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "cannot open output file");
                    return StageSlot::finished(command, StageStatus::CannotOpenOutputFile);
                }
            },
            None => outbound.map_or_else(Stdio::inherit, Stdio::from),
        };

        match self.spawner.spawn(stage, stdin, stdout) {
            Ok(handle) => {
                tracing::debug!(command = %command, pid = handle.id(), "spawned stage");
                StageSlot::running(command, handle)
            }
            Err(e) => {
                tracing::debug!(command = %command, error = %e, "cannot spawn stage");
                StageSlot::finished(command, StageStatus::CommandNotFound)
            }
        }
    }
}

/// Opens a `>` target: created if missing, truncated, owner read/write only.
fn open_output(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}
