use std::io;
use thiserror::Error;

/// Syntactic misuse of a command line, detected before any process is spawned.
///
/// The `Display` texts are the messages printed after `Error: ` by the reporter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    /// A meta-character sits where no operator is allowed (line start, next to
    /// another operator, or a pipe with nothing after it).
    #[error("invalid command line")]
    InvalidCommandLine,
    /// `<` is the last token of the line.
    #[error("no input file")]
    NoInputFileSpecified,
    /// `>` is the last token of the line.
    #[error("no output file")]
    NoOutputFileSpecified,
    /// `<` applied to a stage other than the first one.
    #[error("mislocated input redirection")]
    MisplacedInputRedirection,
    /// `>` applied to a stage other than the last one.
    #[error("mislocated output redirection")]
    MisplacedOutputRedirection,
    /// `&` anywhere but at the end of a non-trivial line.
    #[error("mislocated background sign")]
    MisplacedBackground,
    #[error("command line too long ({len} > {max} characters)")]
    LineTooLong { len: usize, max: usize },
}

/// OS-level failures of the orchestrator itself, as opposed to failures of a stage.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("cannot create pipe: {0}")]
    Pipe(#[source] io::Error),
    #[error("cannot collect status of '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// Failures of the in-process builtins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuiltinError {
    #[error("no such directory")]
    NoSuchDirectory,
    #[error("active jobs still running")]
    ActiveJobsRunning,
}
