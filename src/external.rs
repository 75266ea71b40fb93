use crate::command::{ProcessHandle, Spawner, StageStatus};
use crate::parser::Stage;
use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};

/// Spawns stages as real OS processes, resolving `argv[0]` through `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl Spawner for SystemSpawner {
    fn spawn(&self, stage: &Stage, stdin: Stdio, stdout: Stdio) -> io::Result<Box<dyn ProcessHandle>> {
        let Some(program) = stage.command() else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
        };
        // The Command owns both streams and drops them on return, closing this
        // process's copies of the descriptors.
        let child = Command::new(program)
            .args(stage.args())
            .stdin(stdin)
            .stdout(stdout)
            .spawn()?;
        Ok(Box::new(child))
    }
}

impl ProcessHandle for Child {
    fn id(&self) -> u32 {
        Child::id(self)
    }

    fn wait(&mut self) -> io::Result<StageStatus> {
        Child::wait(self).map(stage_status)
    }

    fn try_wait(&mut self) -> io::Result<Option<StageStatus>> {
        Child::try_wait(self).map(|status| status.map(stage_status))
    }
}

fn stage_status(exit_status: ExitStatus) -> StageStatus {
    match exit_status.code() {
        Some(code) => StageStatus::Exited(code),
        None => terminated_by_signal(exit_status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> StageStatus {
    use std::os::unix::process::ExitStatusExt;
    match exit_status.signal() {
        Some(signal) => StageStatus::Signaled(signal),
        None => StageStatus::Exited(-1),
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> StageStatus {
    StageStatus::Exited(-1)
}
