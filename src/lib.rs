//! A small interactive shell: pipes, boundary redirection and background jobs.
//!
//! A command line goes through four steps, each in its own module:
//! [`tokenize`] splits it around the meta-characters `| < > &`, [`validate`] rejects
//! misplaced operators, [`build_pipeline`] partitions the tokens into [`Stage`]s, and
//! [`Executor`] runs the stages as processes connected by pipes. Foreground
//! pipelines are waited for; background ones are handed to a [`Reaper`].
//!
//! [`Interpreter`] ties the steps together with the `cd`, `pwd` and `exit` builtins,
//! a [`StatusReporter`] and a `rustyline` prompt.
//!
//! Exit-status convention: a stage whose program cannot be started reports
//! [`StageStatus::CommandNotFound`], displayed as [`COMMAND_NOT_FOUND_STATUS`] (127).
//! A stage whose redirection file cannot be opened never starts and reports
//! [`REDIRECTION_FAILED_STATUS`] (1). Signals are displayed as `128 + signal`.

mod builtin;
pub mod command;
mod config;
pub mod env;
mod error;
mod executor;
mod external;
mod interpreter;
pub mod io_adapters;
mod jobs;
mod lexer;
mod parser;
mod reporter;
#[cfg(test)]
mod testing;
mod validator;

pub use command::{
    COMMAND_NOT_FOUND_STATUS, ExitCode, ProcessHandle, REDIRECTION_FAILED_STATUS, Spawner,
    StageStatus,
};
pub use config::{DEFAULT_PROMPT, ShellConfig};
pub use error::{BuiltinError, ExecError, SyntaxError};
pub use executor::{Execution, ExecutionResult, Executor, StageResult};
pub use external::SystemSpawner;
pub use interpreter::{Interpreter, LineOutcome};
pub use jobs::{BackgroundJob, Completed, FailedJob, Reaped, Reaper};
pub use lexer::{DEFAULT_MAX_LINE_LENGTH, Token, TokenKind, tokenize};
pub use parser::{Pipeline, Stage, build_pipeline, parse_line};
pub use reporter::StatusReporter;
pub use validator::validate;
