use std::env as stdenv;
use std::path::PathBuf;

/// Shell state the builtins read and mutate.
///
/// The environment contains:
/// - `current_dir`: the working directory, kept in sync with the process's own.
/// - `should_exit`: set by `exit`; the REPL checks it after every line.
/// - `running_jobs`: background pipelines not reaped yet, refreshed by the
///   interpreter before a builtin runs.
#[derive(Debug, Clone)]
pub struct Environment {
    pub current_dir: PathBuf,
    pub should_exit: bool,
    pub running_jobs: usize,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            current_dir,
            should_exit: false,
            running_jobs: 0,
        }
    }

    /// Target of a bare `cd`.
    pub fn home(&self) -> Option<PathBuf> {
        stdenv::var_os("HOME").map(PathBuf::from)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
