use crate::env::Environment;
use crate::parser::Stage;
use anyhow::Result;
use std::io::{self, Write};
use std::process::Stdio;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Status reported for a stage whose program could not be found or executed.
///
/// A program may legitimately exit with 127 as well; [`StageStatus::CommandNotFound`]
/// is what tells the two apart, this value is only what gets displayed.
pub const COMMAND_NOT_FOUND_STATUS: ExitCode = 127;

/// Status reported for a stage that never ran because its redirection file could
/// not be opened.
pub const REDIRECTION_FAILED_STATUS: ExitCode = 1;

/// Outcome of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// The process ran and exited with this code.
    Exited(ExitCode),
    /// The process was terminated by this signal.
    Signaled(i32),
    /// The program could not be spawned. The process never existed.
    CommandNotFound,
    /// The `<` file could not be opened; the stage was not started.
    CannotOpenInputFile,
    /// The `>` file could not be opened; the stage was not started.
    CannotOpenOutputFile,
}

impl StageStatus {
    /// Numeric status, following the sentinel conventions above. Signals map to
    /// `128 + signal` like POSIX shells report them.
    pub fn code(self) -> ExitCode {
        match self {
            StageStatus::Exited(code) => code,
            StageStatus::Signaled(signal) => 128 + signal,
            StageStatus::CommandNotFound => COMMAND_NOT_FOUND_STATUS,
            StageStatus::CannotOpenInputFile | StageStatus::CannotOpenOutputFile => {
                REDIRECTION_FAILED_STATUS
            }
        }
    }

    pub fn success(self) -> bool {
        self == StageStatus::Exited(0)
    }
}

/// A running stage process.
pub trait ProcessHandle {
    /// OS process id, for logging.
    fn id(&self) -> u32;

    /// Blocks until the process exits.
    fn wait(&mut self) -> io::Result<StageStatus>;

    /// Collects the status if the process has exited, without blocking.
    fn try_wait(&mut self) -> io::Result<Option<StageStatus>>;
}

/// Capability to start one stage with already resolved standard streams.
///
/// The orchestrator owns pipe and file wiring; a spawner only turns a stage and two
/// [`Stdio`] handles into a process. The handles must be released once `spawn`
/// returns, whether it succeeded or not, so that readers downstream see EOF.
pub trait Spawner {
    /// Starts `stage.argv`. An error means the program could not be started at all.
    fn spawn(&self, stage: &Stage, stdin: Stdio, stdout: Stdio) -> io::Result<Box<dyn ProcessHandle>>;
}

/// Object-safe trait for any builtin the shell runs in its own process.
pub trait ExecutableCommand {
    /// Executes the command.
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}
